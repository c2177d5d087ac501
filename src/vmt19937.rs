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
use crate::jump::{pack_mt_state, unpack_mt_state, MT19937Matrix, STATE_WORDS};
use crate::mt19937::{mt_window_step, MT19937, MT_M, MT_N};
use crate::simd;
use crate::types::{QM_BLOCK16, QM_SCALAR, QM_STATE_SIZE};
use log::debug;

/// Vectorized MT19937: `REG_BITS / 32` independent streams advanced in
/// lockstep across the lanes of one logical register.
///
/// # Memory Architecture
/// The 624-word states of all streams are interleaved: register `i` holds
/// word `i` of every sub-state, lane `l` belonging to stream `l`. A refill
/// runs the canonical three-range recurrence over whole registers and
/// tempers the produced words into an output buffer, so the emitted order
/// is exactly lane-major:
///
/// ```text
/// out[j]: stream = j % n_streams, word = j / n_streams
/// ```
///
/// With `REG_BITS = 32` there is a single lane and the output degenerates
/// to the plain scalar sequence.
///
/// # Stream placement
/// Stream 0 is seeded with the canonical key-array algorithm, then shifted
/// by the common jump applied `common_jump_repeat` times. Stream `l` is
/// stream `l - 1` advanced by the sequence jump (or by one recurrence step
/// when no matrix is given). Jump matrices are only borrowed during
/// construction.
pub struct VMT19937<const REG_BITS: usize, const QUERY_MODE: u8> {
    state: Vec<u32>,
    outbuf: Vec<u32>,
    cursor: usize,
}

impl<const REG_BITS: usize, const QUERY_MODE: u8> VMT19937<REG_BITS, QUERY_MODE> {
    const VALID: () = assert!(
        matches!(REG_BITS, 32 | 64 | 128 | 256 | 512) && QUERY_MODE <= QM_STATE_SIZE,
        "register width must be 32/64/128/256/512 bits and the query mode one of the QM_* selectors",
    );

    /// Parallel streams in one register.
    pub const N_STREAMS: usize = REG_BITS / 32;
    /// 32-bit words produced by one refill; the block size of
    /// `next_state_block`.
    pub const STATE_U32: usize = MT_N * Self::N_STREAMS;

    pub fn new(
        seed_key: &[u32],
        common_jump_repeat: usize,
        common_jump: Option<&MT19937Matrix>,
        sequence_jump: Option<&MT19937Matrix>,
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

        let mut sub = MT19937::new_with_key(seed_key).into_state();
        let mut bits = vec![0u64; STATE_WORDS];
        let mut scratch = vec![0u64; STATE_WORDS];

        if let Some(m) = common_jump {
            pack_mt_state(&sub, &mut bits);
            for _ in 0..common_jump_repeat {
                m.apply_to_vector(&bits, &mut scratch);
                std::mem::swap(&mut bits, &mut scratch);
            }
            unpack_mt_state(&bits, &mut sub);
        }

        let n = Self::N_STREAMS;
        let mut state = vec![0u32; Self::STATE_U32];
        for (i, &w) in sub.iter().enumerate() {
            state[i * n] = w;
        }
        for lane in 1..n {
            match sequence_jump {
                Some(j) => {
                    pack_mt_state(&sub, &mut bits);
                    j.apply_to_vector(&bits, &mut scratch);
                    unpack_mt_state(&scratch, &mut sub);
                }
                None => mt_window_step(&mut sub),
            }
            for (i, &w) in sub.iter().enumerate() {
                state[i * n + lane] = w;
            }
        }

        debug!(
            "VMT19937<{}> ready: {} streams, common jump x{}, sequence jump: {}",
            REG_BITS,
            n,
            common_jump_repeat,
            sequence_jump.is_some()
        );
        Ok(Self {
            state,
            outbuf: vec![0u32; Self::STATE_U32],
            cursor: Self::STATE_U32,
        })
    }

    /// Canonical three-range refill over whole registers, then tempering
    /// into the output buffer.
    fn refill(&mut self) {
        let n = Self::N_STREAMS;
        let s = &mut self.state[..];
        for i in 0..MT_N - MT_M {
            simd::mt_recurrence_at(s, n, i, i + 1, i + MT_M);
        }
        for i in MT_N - MT_M..MT_N - 1 {
            simd::mt_recurrence_at(s, n, i, i + 1, i + MT_M - MT_N);
        }
        simd::mt_recurrence_at(s, n, MT_N - 1, 0, MT_M - 1);
        simd::mt_temper_block(&self.state, &mut self.outbuf);
        self.cursor = 0;
    }

    /// One 32-bit word, round-robin across the streams.
    pub fn next_u32(&mut self) -> u32 {
        assert!(
            QUERY_MODE == QM_SCALAR,
            "engine is not configured for scalar queries"
        );
        if self.cursor == Self::STATE_U32 {
            self.refill();
        }
        let v = self.outbuf[self.cursor];
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
        out.copy_from_slice(&self.outbuf[self.cursor..self.cursor + 16]);
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
        out.copy_from_slice(&self.outbuf);
        self.cursor = Self::STATE_U32;
    }
}
