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
use crate::bitmatrix::BinaryMatrix;
use crate::environment;
use log::debug;
use once_cell::sync::Lazy;
use rayon::prelude::*;

/// The squaring worker pool, sized once from the environment. Row strips
/// are independent and write disjoint output rows, so workers share nothing
/// but the immutable source matrix.
static SQUARE_POOL: Lazy<rayon::ThreadPool> = Lazy::new(|| {
    rayon::ThreadPoolBuilder::new()
        .num_threads(*environment::SQUARE_THREADS)
        .thread_name(|i| format!("bsm-square-{}", i))
        .build()
        .expect("failed to build squaring worker pool")
});

impl<const N: usize> BinaryMatrix<N, N> {
    /// Sets `self = a * a` over GF(2).
    ///
    /// Row `r` of the product is the XOR of all rows `k` of `a` where
    /// `a[r][k]` is set, accumulated word-wise into one scratch row per
    /// worker: O(N^3 / 64) machine-word operations instead of the naive
    /// O(N^3) bit loop, with zero-word skipping on top. Runs to completion;
    /// scratch is allocated at entry and dropped at exit.
    pub fn square(&mut self, a: &Self) {
        let wpr = Self::WORDS_PER_ROW;
        let strip = N.div_ceil(*environment::SQUARE_THREADS);
        let started = std::time::Instant::now();
        let words = self.words_mut();
        SQUARE_POOL.install(|| {
            words
                .par_chunks_mut(wpr * strip)
                .enumerate()
                .for_each(|(si, strip_words)| {
                    let mut acc = vec![0u64; wpr];
                    for (j, out_row) in strip_words.chunks_mut(wpr).enumerate() {
                        let r = si * strip + j;
                        acc.fill(0);
                        for (wi, &w) in a.row(r).iter().enumerate() {
                            let mut bits = w;
                            while bits != 0 {
                                let k = wi * 64 + bits.trailing_zeros() as usize;
                                for (x, y) in acc.iter_mut().zip(a.row(k)) {
                                    *x ^= y;
                                }
                                bits &= bits - 1;
                            }
                        }
                        out_row.copy_from_slice(&acc);
                    }
                });
        });
        debug!("squared {0}x{0} bit matrix in {1:?}", N, started.elapsed());
    }

    /// `a * a` into a fresh matrix; the building block of squaring chains
    /// that turn a unit-step operator into `F^(2^k)`.
    pub fn squared(&self) -> Self {
        let mut out = Self::new();
        out.square(self);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt19937::MT19937;

    /// The classical triple loop; the fast path must match it bit for bit.
    fn naive_square<const N: usize>(a: &BinaryMatrix<N, N>) -> BinaryMatrix<N, N> {
        let mut out = BinaryMatrix::new();
        for r in 0..N {
            for c in 0..N {
                let mut s = false;
                for k in 0..N {
                    s ^= a.get_bit(r, k) && a.get_bit(k, c);
                }
                if s {
                    out.set_bit(r, c);
                }
            }
        }
        out
    }

    fn check_square<const N: usize>(rng: &mut MT19937) {
        for _ in 0..3 {
            let mut a = BinaryMatrix::<N, N>::new();
            a.fill_random(rng);
            let fast = a.squared();
            let slow = naive_square(&a);
            assert!(fast == slow, "square mismatch at size {}", N);
        }
    }

    #[test]
    fn test_square_matches_naive() {
        let mut rng = MT19937::new_with_key(&[0x123, 0x234, 0x345, 0x456]);
        check_square::<1>(&mut rng);
        check_square::<5>(&mut rng);
        check_square::<8>(&mut rng);
        check_square::<13>(&mut rng);
        check_square::<16>(&mut rng);
        check_square::<20>(&mut rng);
        check_square::<28>(&mut rng);
        check_square::<32>(&mut rng);
        check_square::<36>(&mut rng);
        check_square::<60>(&mut rng);
        check_square::<64>(&mut rng);
        check_square::<68>(&mut rng);
        check_square::<85>(&mut rng);
        check_square::<126>(&mut rng);
        check_square::<128>(&mut rng);
        check_square::<150>(&mut rng);
    }

    #[test]
    fn test_square_of_identity_is_identity() {
        let mut id = BinaryMatrix::<90, 90>::new();
        for i in 0..90 {
            id.set_bit(i, i);
        }
        assert!(id.squared() == id);
    }

    #[test]
    fn test_square_of_shift_composes() {
        // A one-step cyclic shift squared is a two-step cyclic shift.
        let mut shift1 = BinaryMatrix::<70, 70>::new();
        for i in 0..70 {
            shift1.set_bit((i + 1) % 70, i);
        }
        let mut shift2 = BinaryMatrix::<70, 70>::new();
        for i in 0..70 {
            shift2.set_bit((i + 2) % 70, i);
        }
        assert!(shift1.squared() == shift2);
    }
}
