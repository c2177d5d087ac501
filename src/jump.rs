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

//! Jump operators: the state-transition matrices of MT19937 and SFMT19937
//! over GF(2), plus the packed-bit view of a generator state they act on.
//!
//! The MT19937 state is 19937 live bits: the top bit of word 0 and all 32
//! bits of words 1..624 (the low 31 bits of word 0 never feed the
//! recurrence). The SFMT19937 state is all 19968 bits of its 156 128-bit
//! words. A jump matrix left-multiplies that packed column vector;
//! `F^k` advances the output stream by `k` words (MT) or `4k` 32-bit words
//! (SFMT, whose unit step produces one 128-bit word).

use crate::bitmatrix::{BinaryMatrix, BinarySquareMatrix};
use crate::caching;
use crate::codec::check_header;
use crate::errors::Result;
use crate::mt19937::{mt_twist, MT_M, MT_N, MT_UPPER_MASK};
use crate::sfmt19937::{sfmt_recursion, word128, SFMT_N128, SFMT_N32, SFMT_POS1};
use log::debug;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Live bits in an MT19937 state.
pub const MT_STATE_BITS: usize = 19937;
/// Bits in an SFMT19937 state (all of them are live).
pub const SFMT_STATE_BITS: usize = SFMT_N32 * 32;

/// A GF(2) operator on the MT19937 state space.
pub type MT19937Matrix = BinarySquareMatrix<MT_STATE_BITS>;
/// A GF(2) operator on the SFMT19937 state space.
pub type SFMT19937Matrix = BinarySquareMatrix<SFMT_STATE_BITS>;

/// Packed words holding one MT or SFMT state vector (both round up to the
/// same 312 u64s).
pub(crate) const STATE_WORDS: usize = (MT_STATE_BITS + 63) / 64;

/// Conventional file name for the serialized operator `F^(2^k)`.
/// By period identity, `F19937.bits` holds the same operator as `F^1`.
pub fn jump_power_file_name(k: u32) -> String {
    format!("F{:05}.bits", k)
}

/// Packs a 624-word MT19937 state into its 19937-bit column vector.
pub(crate) fn pack_mt_state(words: &[u32; MT_N], bits: &mut [u64]) {
    debug_assert_eq!(bits.len(), STATE_WORDS);
    bits.fill(0);
    bits[0] = (words[0] >> 31) as u64;
    for i in 1..MT_N {
        let p = 32 * i - 31;
        let w = words[i] as u64;
        bits[p / 64] |= w << (p % 64);
        if p % 64 > 32 {
            bits[p / 64 + 1] |= w >> (64 - p % 64);
        }
    }
}

/// Inverse of `pack_mt_state`; the dead low bits of word 0 come back zero.
pub(crate) fn unpack_mt_state(bits: &[u64], words: &mut [u32; MT_N]) {
    debug_assert_eq!(bits.len(), STATE_WORDS);
    words[0] = ((bits[0] & 1) as u32) << 31;
    for i in 1..MT_N {
        let p = 32 * i - 31;
        let off = p % 64;
        let mut w = bits[p / 64] >> off;
        if off > 32 {
            w |= bits[p / 64 + 1] << (64 - off);
        }
        words[i] = w as u32;
    }
}

/// Packs a flat SFMT19937 state into its 19968-bit column vector.
pub(crate) fn pack_sfmt_state(words: &[u32; SFMT_N32], bits: &mut [u64]) {
    debug_assert_eq!(bits.len(), STATE_WORDS);
    bits.fill(0);
    for (i, &w) in words.iter().enumerate() {
        bits[i / 2] |= (w as u64) << (32 * (i % 2));
    }
}

pub(crate) fn unpack_sfmt_state(bits: &[u64], words: &mut [u32; SFMT_N32]) {
    debug_assert_eq!(bits.len(), STATE_WORDS);
    for (i, w) in words.iter_mut().enumerate() {
        *w = (bits[i / 2] >> (32 * (i % 2))) as u32;
    }
}

impl BinaryMatrix<MT_STATE_BITS, MT_STATE_BITS> {
    /// The unit-step operator F: advances a stream by one emitted word.
    pub fn mt_unit_step() -> Self {
        Self::mt_jump(1)
    }

    /// `F^k` for any `k >= 1`, built by pushing every basis vector `k`
    /// recurrence steps forward through a sliding window. Cheap enough
    /// (O(bits * (k + 624)) word operations) that moderate exponents never
    /// need a squaring chain or a matrix file.
    pub fn mt_jump(k: usize) -> Self {
        assert!(k >= 1, "a jump must advance at least one step");
        let started = Instant::now();
        let mut m = Self::new();
        let mut w = vec![0u32; MT_N + k];
        for col in 0..MT_STATE_BITS {
            w.fill(0);
            if col == 0 {
                w[0] = MT_UPPER_MASK;
            } else {
                let t = col - 1;
                w[1 + t / 32] = 1 << (t % 32);
            }
            for t in 0..k {
                w[MT_N + t] = w[MT_M + t] ^ mt_twist(w[t], w[t + 1]);
            }
            // window w[k..k + 624] is F^k * e_col; its set bits form column col
            if w[k] & MT_UPPER_MASK != 0 {
                m.set_bit(0, col);
            }
            for t in 0..MT_N - 1 {
                let mut word = w[k + 1 + t];
                while word != 0 {
                    let b = word.trailing_zeros() as usize;
                    m.set_bit(1 + 32 * t + b, col);
                    word &= word - 1;
                }
            }
        }
        debug!("built MT19937 F^{} in {:?}", k, started.elapsed());
        m
    }

    /// Loads a serialized operator, going through the process-wide cache so
    /// repeated constructions from the same file share one 50 MB matrix.
    pub fn load_cached(path: &Path) -> Result<Arc<Self>> {
        let key = caching::matrix_file_cache_key(path);
        if let Some(m) = caching::MT_JUMP_CACHE.get(key) {
            return Ok(m);
        }
        let m = Arc::new(Self::load(path)?);
        caching::MT_JUMP_CACHE.insert(key, Arc::clone(&m));
        Ok(m)
    }
}

impl BinaryMatrix<SFMT_STATE_BITS, SFMT_STATE_BITS> {
    /// The unit-step operator: advances a stream by one 128-bit word, i.e.
    /// four 32-bit outputs.
    pub fn sfmt_unit_step() -> Self {
        Self::sfmt_jump(1)
    }

    /// `F^k` for any `k >= 1`; advances by `4k` 32-bit outputs.
    pub fn sfmt_jump(k: usize) -> Self {
        assert!(k >= 1, "a jump must advance at least one step");
        let started = Instant::now();
        let mut m = Self::new();
        let mut w = vec![0u32; SFMT_N32 + 4 * k];
        for col in 0..SFMT_STATE_BITS {
            w.fill(0);
            w[col / 32] = 1 << (col % 32);
            for t in 0..k {
                let next = sfmt_recursion(
                    &word128(&w, t),
                    &word128(&w, t + SFMT_POS1),
                    &word128(&w, t + SFMT_N128 - 2),
                    &word128(&w, t + SFMT_N128 - 1),
                );
                w[SFMT_N32 + 4 * t..SFMT_N32 + 4 * t + 4].copy_from_slice(&next);
            }
            for i in 0..SFMT_N32 {
                let mut word = w[4 * k + i];
                while word != 0 {
                    let b = word.trailing_zeros() as usize;
                    m.set_bit(32 * i + b, col);
                    word &= word - 1;
                }
            }
        }
        debug!("built SFMT19937 F^{} in {:?}", k, started.elapsed());
        m
    }

    /// Loads a serialized operator through the process-wide cache.
    pub fn load_cached(path: &Path) -> Result<Arc<Self>> {
        let key = caching::matrix_file_cache_key(path);
        if let Some(m) = caching::SFMT_JUMP_CACHE.get(key) {
            return Ok(m);
        }
        let m = Arc::new(Self::load(path)?);
        caching::SFMT_JUMP_CACHE.insert(key, Arc::clone(&m));
        Ok(m)
    }
}

impl<const N: usize> BinaryMatrix<N, N> {
    /// Reads a serialized square operator from disk, accepting either
    /// encoding: the payload length after the header tells hex and Base64
    /// apart unambiguously.
    pub fn load(path: &Path) -> Result<Self> {
        let started = Instant::now();
        let bytes = std::fs::read(path)?;
        let mut trimmed = bytes.len();
        while trimmed > 0 && bytes[trimmed - 1].is_ascii_whitespace() {
            trimmed -= 1;
        }
        let mut cursor = Cursor::new(&bytes[..]);
        check_header(&mut cursor, N, N)?;
        let payload_len = trimmed.saturating_sub(cursor.position() as usize);

        let mut cursor = Cursor::new(&bytes[..]);
        let m = if payload_len == 2 * N * Self::BYTES_PER_ROW {
            Self::from_hex(&mut cursor)?
        } else {
            Self::from_base64(&mut cursor)?
        };
        debug!(
            "loaded {}x{} operator from {} in {:?}",
            N,
            N,
            path.display(),
            started.elapsed()
        );
        Ok(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt19937::{mt_window_step, MT19937};
    use crate::sfmt19937::{sfmt_window_step, SFMT19937};

    const SEED: [u32; 4] = [0x123, 0x234, 0x345, 0x456];

    #[test]
    fn test_jump_power_file_name() {
        assert_eq!(jump_power_file_name(9), "F00009.bits");
        assert_eq!(jump_power_file_name(10), "F00010.bits");
        assert_eq!(jump_power_file_name(19937), "F19937.bits");
    }

    #[test]
    fn test_mt_pack_unpack_roundtrip() {
        let state = MT19937::new_with_key(&SEED).into_state();
        let mut bits = vec![0u64; STATE_WORDS];
        pack_mt_state(&state, &mut bits);
        let mut back = [0u32; MT_N];
        unpack_mt_state(&bits, &mut back);
        // low 31 bits of word 0 are dead and come back zero
        assert_eq!(back[0], state[0] & MT_UPPER_MASK);
        assert_eq!(&back[1..], &state[1..]);
    }

    #[test]
    fn test_sfmt_pack_unpack_roundtrip() {
        let state = SFMT19937::new_with_key(&SEED).into_state();
        let mut bits = vec![0u64; STATE_WORDS];
        pack_sfmt_state(&state, &mut bits);
        let mut back = [0u32; SFMT_N32];
        unpack_sfmt_state(&bits, &mut back);
        assert_eq!(&back[..], &state[..]);
    }

    #[test]
    fn test_mt_unit_step_matrix_matches_recurrence() {
        let f = MT19937Matrix::mt_unit_step();
        let mut state = MT19937::new_with_key(&SEED).into_state();

        let mut bits = vec![0u64; STATE_WORDS];
        let mut out = vec![0u64; STATE_WORDS];
        pack_mt_state(&state, &mut bits);
        f.apply_to_vector(&bits, &mut out);

        mt_window_step(&mut state);
        let mut expected = vec![0u64; STATE_WORDS];
        pack_mt_state(&state, &mut expected);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_mt_multi_step_matrix_matches_iterated_steps() {
        let f5 = MT19937Matrix::mt_jump(5);
        let mut state = MT19937::new_with_key(&SEED).into_state();

        let mut bits = vec![0u64; STATE_WORDS];
        let mut out = vec![0u64; STATE_WORDS];
        pack_mt_state(&state, &mut bits);
        f5.apply_to_vector(&bits, &mut out);

        for _ in 0..5 {
            mt_window_step(&mut state);
        }
        let mut expected = vec![0u64; STATE_WORDS];
        pack_mt_state(&state, &mut expected);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_sfmt_unit_step_matrix_matches_recurrence() {
        let f = SFMT19937Matrix::sfmt_unit_step();
        let mut state = SFMT19937::new_with_key(&SEED).into_state();

        let mut bits = vec![0u64; STATE_WORDS];
        let mut out = vec![0u64; STATE_WORDS];
        pack_sfmt_state(&state, &mut bits);
        f.apply_to_vector(&bits, &mut out);

        sfmt_window_step(&mut state);
        let mut expected = vec![0u64; STATE_WORDS];
        pack_sfmt_state(&state, &mut expected);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_load_detects_encoding() -> anyhow::Result<()> {
        let dir = std::env::temp_dir();
        let mut rng = MT19937::new_with_key(&[99]);
        let mut m = BinaryMatrix::<85, 85>::new();
        m.fill_random(&mut rng);

        let hex_path = dir.join("vmt19937-test-load.hex");
        let mut buf = Vec::new();
        m.to_hex(&mut buf)?;
        std::fs::write(&hex_path, &buf)?;
        assert!(BinaryMatrix::<85, 85>::load(&hex_path)? == m);

        let b64_path = dir.join("vmt19937-test-load.b64");
        let mut buf = Vec::new();
        m.to_base64(&mut buf)?;
        std::fs::write(&b64_path, &buf)?;
        assert!(BinaryMatrix::<85, 85>::load(&b64_path)? == m);

        std::fs::remove_file(hex_path).ok();
        std::fs::remove_file(b64_path).ok();
        Ok(())
    }
}
