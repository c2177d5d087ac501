// Copyright 2024 Nathan Hoos
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use crate::errors::{Error, Result};
use crate::jump::{pack_sfmt_state, unpack_sfmt_state, SFMT19937Matrix, STATE_WORDS};
use crate::sfmt19937::{sfmt_window_step, SFMT19937, SFMT_N128, SFMT_N32, SFMT_POS1};
use crate::simd;
use crate::types::{MAX_REG_U32, QM_BLOCK16, QM_SCALAR, QM_STATE_SIZE};
use log::debug;

/// Vectorized SFMT19937: `REG_BITS / 128` independent streams, one 128-bit
/// SFMT word per lane.
///
/// # Memory Architecture
/// The 156-word states are interleaved per 128-bit word: register `i`
/// holds word `i` of every sub-state, each lane being four adjacent u32s in
/// the canonical little-endian order. SFMT emits its refilled state raw (no
/// tempering), so the interleaved state doubles as the output buffer and
/// the emitted order is:
///
/// ```text
/// out[j]: stream = (j % (4 * n_streams)) / 4,
///         word   = (j % 4) + (j / (4 * n_streams)) * 4
/// ```
///
/// i.e. streams interleave at 128-bit granularity, four 32-bit outputs at a
/// time. With `REG_BITS = 128` there is one lane and the output is the
/// plain scalar SFMT sequence.
///
/// Seeding and jumps work as in the MT19937 engine, except that the unit
/// step advances a stream by one 128-bit word, so every jump is counted in
/// multiples of four 32-bit outputs.
pub struct VSFMT19937<const REG_BITS: usize, const QUERY_MODE: u8> {
    state: Vec<u32>,
    cursor: usize,
}

impl<const REG_BITS: usize, const QUERY_MODE: u8> VSFMT19937<REG_BITS, QUERY_MODE> {
    const VALID: () = assert!(
        matches!(REG_BITS, 128 | 256 | 512) && QUERY_MODE <= QM_STATE_SIZE,
        "register width must be 128/256/512 bits and the query mode one of the QM_* selectors",
    );

    /// Parallel streams in one register.
    pub const N_STREAMS: usize = REG_BITS / 128;
    /// 32-bit words per register.
    pub const REG_U32: usize = REG_BITS / 32;
    /// 32-bit words produced by one refill; the block size of
    /// `next_state_block`.
    pub const STATE_U32: usize = SFMT_N32 * Self::N_STREAMS;

    pub fn new(
        seed_key: &[u32],
        common_jump_repeat: usize,
        common_jump: Option<&SFMT19937Matrix>,
        sequence_jump: Option<&SFMT19937Matrix>,
    ) -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID;
        if seed_key.is_empty() {
            return Err(Error::InvalidArguments("seed key must not be empty".into()));
        }
        if (common_jump_repeat > 0) != common_jump.is_some() {
            return Err(Error::InvalidArguments(
                "a common jump needs both a matrix and a repeat count > 0".into(),
            ));
        }

        let mut sub = SFMT19937::new_with_key(seed_key).into_state();
        let mut bits = vec![0u64; STATE_WORDS];
        let mut scratch = vec![0u64; STATE_WORDS];

        if let Some(m) = common_jump {
            pack_sfmt_state(&sub, &mut bits);
            for _ in 0..common_jump_repeat {
                m.apply_to_vector(&bits, &mut scratch);
                std::mem::swap(&mut bits, &mut scratch);
            }
            unpack_sfmt_state(&bits, &mut sub);
        }

        let n = Self::N_STREAMS;
        let regu = Self::REG_U32;
        let mut state = vec![0u32; Self::STATE_U32];
        let place = |state: &mut [u32], lane: usize, sub: &[u32; SFMT_N32]| {
            for i in 0..SFMT_N128 {
                for j in 0..4 {
                    state[i * regu + lane * 4 + j] = sub[4 * i + j];
                }
            }
        };
        place(&mut state, 0, &sub);
        for lane in 1..n {
            match sequence_jump {
                Some(j) => {
                    pack_sfmt_state(&sub, &mut bits);
                    j.apply_to_vector(&bits, &mut scratch);
                    unpack_sfmt_state(&scratch, &mut sub);
                }
                None => sfmt_window_step(&mut sub),
            }
            place(&mut state, lane, &sub);
        }

        debug!(
            "VSFMT19937<{}> ready: {} streams, common jump x{}, sequence jump: {}",
            REG_BITS,
            n,
            common_jump_repeat,
            sequence_jump.is_some()
        );
        Ok(Self {
            state,
            cursor: Self::STATE_U32,
        })
    }

    /// In-place refill over whole registers, carrying the two trailing
    /// feedback registers exactly like the canonical block generation.
    fn refill(&mut self) {
        let regu = Self::REG_U32;
        let s = &mut self.state[..];
        let mut r1 = [0u32; MAX_REG_U32];
        let mut r2 = [0u32; MAX_REG_U32];
        let mut tmp = [0u32; MAX_REG_U32];
        r1[..regu].copy_from_slice(&s[(SFMT_N128 - 2) * regu..(SFMT_N128 - 1) * regu]);
        r2[..regu].copy_from_slice(&s[(SFMT_N128 - 1) * regu..SFMT_N128 * regu]);
        for i in 0..SFMT_N128 {
            let pos = if i < SFMT_N128 - SFMT_POS1 {
                i + SFMT_POS1
            } else {
                i + SFMT_POS1 - SFMT_N128
            };
            simd::sfmt_recurrence_reg(
                &s[i * regu..(i + 1) * regu],
                &s[pos * regu..(pos + 1) * regu],
                &r1[..regu],
                &r2[..regu],
                &mut tmp[..regu],
            );
            s[i * regu..(i + 1) * regu].copy_from_slice(&tmp[..regu]);
            r1[..regu].copy_from_slice(&r2[..regu]);
            r2[..regu].copy_from_slice(&tmp[..regu]);
        }
        self.cursor = 0;
    }

    /// One 32-bit word of the interleaved output.
    pub fn next_u32(&mut self) -> u32 {
        assert!(
            QUERY_MODE == QM_SCALAR,
            "engine is not configured for scalar queries"
        );
        if self.cursor == Self::STATE_U32 {
            self.refill();
        }
        let v = self.state[self.cursor];
        self.cursor += 1;
        v
    }

    /// Sixteen consecutive words of the interleaved output.
    pub fn next_block16(&mut self, out: &mut [u32; 16]) {
        assert!(
            QUERY_MODE == QM_BLOCK16,
            "engine is not configured for block-16 queries"
        );
        if self.cursor == Self::STATE_U32 {
            self.refill();
        }
        out.copy_from_slice(&self.state[self.cursor..self.cursor + 16]);
        self.cursor += 16;
    }

    /// One full refill (`STATE_U32` words) of interleaved output.
    pub fn next_state_block(&mut self, out: &mut [u32]) {
        assert!(
            QUERY_MODE == QM_STATE_SIZE,
            "engine is not configured for state-block queries"
        );
        assert_eq!(out.len(), Self::STATE_U32);
        self.refill();
        out.copy_from_slice(&self.state);
        self.cursor = Self::STATE_U32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    const SEED: [u32; 4] = [0x123, 0x234, 0x345, 0x456];
    const N_DRAW: usize = 50 * 624 * 16;

    static REFERENCE: Lazy<Vec<u32>> = Lazy::new(|| {
        let mut sfmt = SFMT19937::new_with_key(&SEED);
        (0..N_DRAW + 10_000).map(|_| sfmt.next_u32()).collect()
    });
    static F1: Lazy<SFMT19937Matrix> = Lazy::new(SFMT19937Matrix::sfmt_unit_step);
    static F64: Lazy<SFMT19937Matrix> = Lazy::new(|| SFMT19937Matrix::sfmt_jump(64));

    fn check_equivalence<const W: usize, const Q: u8>(
        repeat: usize,
        common: Option<&SFMT19937Matrix>,
        seq: Option<&SFMT19937Matrix>,
        common_size: usize,
        seq_size: usize,
    ) {
        let mut gen = VSFMT19937::<W, Q>::new(&SEED, repeat, common, seq).unwrap();
        let n = W / 128;
        let mut out = vec![0u32; N_DRAW];
        match Q {
            QM_SCALAR => {
                for v in out.iter_mut() {
                    *v = gen.next_u32();
                }
            }
            QM_BLOCK16 => {
                let mut blk = [0u32; 16];
                for chunk in out.chunks_exact_mut(16) {
                    gen.next_block16(&mut blk);
                    chunk.copy_from_slice(&blk);
                }
            }
            _ => {
                for chunk in out.chunks_exact_mut(SFMT_N32 * n) {
                    gen.next_state_block(chunk);
                }
            }
        }
        for (i, &v) in out.iter().enumerate() {
            let gen_index = (i % (4 * n)) / 4;
            let seq_index = (i % 4) + (i / (4 * n)) * 4;
            let want = REFERENCE[seq_index + common_size * repeat + seq_size * gen_index];
            assert_eq!(
                v, want,
                "output {} (stream {}, word {}) with W={} Q={}",
                i, gen_index, seq_index, W, Q
            );
        }
    }

    #[test]
    fn test_scalar_w128() {
        check_equivalence::<128, QM_SCALAR>(0, None, None, 0, 0);
        // one unit step is four 32-bit outputs
        check_equivalence::<128, QM_SCALAR>(1, Some(&F1), None, 4, 0);
        check_equivalence::<128, QM_SCALAR>(2, Some(&F1), None, 4, 0);
        check_equivalence::<128, QM_SCALAR>(1, Some(&F64), None, 256, 0);
    }

    #[test]
    fn test_block16_w128() {
        check_equivalence::<128, QM_BLOCK16>(0, None, None, 0, 0);
    }

    #[test]
    fn test_state_block_w128() {
        check_equivalence::<128, QM_STATE_SIZE>(0, None, None, 0, 0);
    }

    #[test]
    fn test_scalar_w256() {
        check_equivalence::<256, QM_SCALAR>(0, None, None, 0, 0);
        check_equivalence::<256, QM_SCALAR>(0, None, Some(&F1), 0, 4);
        check_equivalence::<256, QM_SCALAR>(2, Some(&F1), Some(&F64), 4, 256);
    }

    #[test]
    fn test_block16_w256() {
        check_equivalence::<256, QM_BLOCK16>(0, None, None, 0, 0);
        check_equivalence::<256, QM_BLOCK16>(0, None, Some(&F1), 0, 4);
    }

    #[test]
    fn test_state_block_w256() {
        check_equivalence::<256, QM_STATE_SIZE>(0, None, None, 0, 0);
        check_equivalence::<256, QM_STATE_SIZE>(0, None, Some(&F1), 0, 4);
    }

    #[test]
    fn test_scalar_w512() {
        check_equivalence::<512, QM_SCALAR>(0, None, None, 0, 0);
        check_equivalence::<512, QM_SCALAR>(0, None, Some(&F1), 0, 4);
    }

    #[test]
    fn test_block16_w512() {
        check_equivalence::<512, QM_BLOCK16>(0, None, None, 0, 0);
    }

    #[test]
    fn test_state_block_w512() {
        check_equivalence::<512, QM_STATE_SIZE>(0, None, None, 0, 0);
    }

    #[test]
    fn test_determinism() {
        let mut a = VSFMT19937::<512, QM_SCALAR>::new(&SEED, 1, Some(&F1), Some(&F1)).unwrap();
        let mut b = VSFMT19937::<512, QM_SCALAR>::new(&SEED, 1, Some(&F1), Some(&F1)).unwrap();
        for _ in 0..5_000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_invalid_arguments() {
        let e = VSFMT19937::<128, QM_SCALAR>::new(&SEED, 3, None, None).err().unwrap();
        assert!(matches!(e, Error::InvalidArguments(_)));
        let e = VSFMT19937::<128, QM_SCALAR>::new(&[], 0, None, None).err().unwrap();
        assert!(matches!(e, Error::InvalidArguments(_)));
    }

    #[test]
    #[should_panic(expected = "not configured")]
    fn test_mismatched_query_mode_panics() {
        let mut gen = VSFMT19937::<128, QM_STATE_SIZE>::new(&SEED, 0, None, None).unwrap();
        let _ = gen.next_u32();
    }
}
