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
use crate::mt19937::MT19937;

/// Dense matrix over GF(2), row-major, rows packed into 64-bit words.
///
/// # Memory Layout
/// Row `r` occupies `WORDS_PER_ROW` consecutive `u64`s starting at
/// `r * WORDS_PER_ROW`. Bit `c` of a row lives in word `c / 64` at bit
/// position `c % 64` (little-endian within the word). Bits past column `C`
/// in the trailing word of each row are always zero; every mutating entry
/// point maintains that invariant so equality and parity reductions can work
/// on whole words.
///
/// The packed words are heap-allocated: the interesting instantiations are
/// the 19937/19968-bit jump operators, which weigh in around 50 MB each.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryMatrix<const R: usize, const C: usize> {
    words: Vec<u64>,
}

/// Square bit matrix; the shape used for state-transition operators.
pub type BinarySquareMatrix<const N: usize> = BinaryMatrix<N, N>;

impl<const R: usize, const C: usize> BinaryMatrix<R, C> {
    pub const ROWS: usize = R;
    pub const COLS: usize = C;
    /// `u64`s per packed row.
    pub const WORDS_PER_ROW: usize = (C + 63) / 64;
    /// Bytes per row in the serialized form (no padding to word size).
    pub const BYTES_PER_ROW: usize = (C + 7) / 8;
    /// `u64`s needed for a length-`R` result vector of `apply_to_vector`.
    pub const OUT_WORDS: usize = (R + 63) / 64;
    /// Mask of the valid bits in the trailing word of each row.
    pub const TRAILING_MASK: u64 = if C % 64 == 0 {
        u64::MAX
    } else {
        (1u64 << (C % 64)) - 1
    };

    /// An all-zero matrix.
    pub fn new() -> Self {
        Self {
            words: vec![0u64; R * Self::WORDS_PER_ROW],
        }
    }

    pub fn reset_zero(&mut self) {
        self.words.fill(0);
    }

    #[inline(always)]
    pub fn get_bit(&self, r: usize, c: usize) -> bool {
        debug_assert!(r < R && c < C);
        (self.words[r * Self::WORDS_PER_ROW + c / 64] >> (c % 64)) & 1 != 0
    }

    #[inline(always)]
    pub fn set_bit(&mut self, r: usize, c: usize) {
        debug_assert!(r < R && c < C);
        self.words[r * Self::WORDS_PER_ROW + c / 64] |= 1u64 << (c % 64);
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline(always)]
    pub(crate) fn row(&self, r: usize) -> &[u64] {
        &self.words[r * Self::WORDS_PER_ROW..(r + 1) * Self::WORDS_PER_ROW]
    }

    #[inline(always)]
    pub(crate) fn row_mut(&mut self, r: usize) -> &mut [u64] {
        &mut self.words[r * Self::WORDS_PER_ROW..(r + 1) * Self::WORDS_PER_ROW]
    }

    pub(crate) fn words_mut(&mut self) -> &mut [u64] {
        &mut self.words
    }

    /// Fills the matrix with uniform random bits drawn from `rng`.
    ///
    /// Randomness comes from the in-crate scalar generator rather than OS
    /// entropy so callers (the test suite, mostly) stay deterministic.
    pub fn fill_random(&mut self, rng: &mut MT19937) {
        for w in self.words.iter_mut() {
            *w = (rng.next_u32() as u64) | ((rng.next_u32() as u64) << 32);
        }
        for r in 0..R {
            let row = self.row_mut(r);
            let last = row.len() - 1;
            row[last] &= Self::TRAILING_MASK;
        }
    }

    /// Matrix-vector product over GF(2).
    ///
    /// `v` is a packed column vector of `C` bits (`WORDS_PER_ROW` words),
    /// `out` receives `R` bits (`OUT_WORDS` words). Bit `r` of the result is
    /// the XOR-parity of `v AND row_r`.
    pub fn apply_to_vector(&self, v: &[u64], out: &mut [u64]) {
        assert_eq!(v.len(), Self::WORDS_PER_ROW);
        assert_eq!(out.len(), Self::OUT_WORDS);
        out.fill(0);
        for r in 0..R {
            let mut acc = 0u64;
            for (a, b) in self.row(r).iter().zip(v.iter()) {
                acc ^= a & b;
            }
            out[r / 64] |= ((acc.count_ones() & 1) as u64) << (r % 64);
        }
    }

    /// Packs the matrix into its serialized byte order: row-major,
    /// little-endian within each word, `BYTES_PER_ROW` bytes per row.
    pub(crate) fn to_packed_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(R * Self::BYTES_PER_ROW);
        for r in 0..R {
            let mut remaining = Self::BYTES_PER_ROW;
            for w in self.row(r) {
                let take = remaining.min(8);
                bytes.extend_from_slice(&w.to_le_bytes()[..take]);
                remaining -= take;
            }
        }
        bytes
    }

    /// Inverse of `to_packed_bytes`. `bytes` must hold exactly
    /// `R * BYTES_PER_ROW` bytes; the trailing-word invariant is reimposed
    /// in case the stream carried stray padding bits.
    pub(crate) fn from_packed_bytes(bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), R * Self::BYTES_PER_ROW);
        let mut m = Self::new();
        for (r, row_bytes) in bytes.chunks_exact(Self::BYTES_PER_ROW).enumerate() {
            let row = m.row_mut(r);
            for (wi, chunk) in row_bytes.chunks(8).enumerate() {
                let mut le = [0u8; 8];
                le[..chunk.len()].copy_from_slice(chunk);
                row[wi] = u64::from_le_bytes(le);
            }
            let last = row.len() - 1;
            row[last] &= Self::TRAILING_MASK;
        }
        m
    }
}

impl<const R: usize, const C: usize> Default for BinaryMatrix<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const R: usize, const C: usize> std::fmt::Debug for BinaryMatrix<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BinaryMatrix<{}x{}> nnz={}", R, C, self.nnz())
    }
}
