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

/// State words in MT19937.
pub const MT_N: usize = 624;
/// Middle offset of the recurrence.
pub const MT_M: usize = 397;
pub(crate) const MT_MATRIX_A: u32 = 0x9908_B0DF;
pub(crate) const MT_UPPER_MASK: u32 = 0x8000_0000;
pub(crate) const MT_LOWER_MASK: u32 = 0x7FFF_FFFF;

/// The twist producing state word `x_{k+624}` from `x_k`, `x_{k+1}`
/// (combined) and `x_{k+397}` is `far ^ mt_twist(cur, next)`.
#[inline(always)]
pub(crate) fn mt_twist(cur: u32, next: u32) -> u32 {
    let x = (cur & MT_UPPER_MASK) | (next & MT_LOWER_MASK);
    (x >> 1) ^ if x & 1 != 0 { MT_MATRIX_A } else { 0 }
}

/// Output tempering.
#[inline(always)]
pub(crate) fn mt_temper(mut y: u32) -> u32 {
    y ^= y >> 11;
    y ^= (y << 7) & 0x9D2C_5680;
    y ^= (y << 15) & 0xEFC6_0000;
    y ^= y >> 18;
    y
}

/// Advances a 624-word sliding window by one step: drops `x_k`, appends
/// `x_{k+624}`. This is the cheap form of a unit jump, used when no
/// sequence-jump matrix is supplied.
pub(crate) fn mt_window_step(words: &mut [u32; MT_N]) {
    let next = words[MT_M] ^ mt_twist(words[0], words[1]);
    words.copy_within(1.., 0);
    words[MT_N - 1] = next;
}

/// Scalar MT19937, bit-exact against the 2002 reference sources
/// (`init_by_array` seeding, block refill, tempering).
///
/// This is both the test oracle for the vectorized engines and the seeding
/// primitive they use for sub-state 0.
pub struct MT19937 {
    state: Box<[u32; MT_N]>,
    index: usize,
}

impl MT19937 {
    /// `init_genrand` of the reference sources.
    pub fn new_with_seed(seed: u32) -> Self {
        let mut state = Box::new([0u32; MT_N]);
        state[0] = seed;
        for i in 1..MT_N {
            state[i] = 1_812_433_253u32
                .wrapping_mul(state[i - 1] ^ (state[i - 1] >> 30))
                .wrapping_add(i as u32);
        }
        Self {
            state,
            index: MT_N,
        }
    }

    /// `init_by_array` of the reference sources; accepts any key length >= 1.
    pub fn new_with_key(key: &[u32]) -> Self {
        assert!(!key.is_empty(), "seed key must not be empty");
        let mut mt = Self::new_with_seed(19_650_218);
        let mut i = 1usize;
        let mut j = 0usize;
        for _ in 0..MT_N.max(key.len()) {
            mt.state[i] = (mt.state[i]
                ^ (mt.state[i - 1] ^ (mt.state[i - 1] >> 30)).wrapping_mul(1_664_525))
            .wrapping_add(key[j])
            .wrapping_add(j as u32);
            i += 1;
            j += 1;
            if i >= MT_N {
                mt.state[0] = mt.state[MT_N - 1];
                i = 1;
            }
            if j >= key.len() {
                j = 0;
            }
        }
        for _ in 0..MT_N - 1 {
            mt.state[i] = (mt.state[i]
                ^ (mt.state[i - 1] ^ (mt.state[i - 1] >> 30)).wrapping_mul(1_566_083_941))
            .wrapping_sub(i as u32);
            i += 1;
            if i >= MT_N {
                mt.state[0] = mt.state[MT_N - 1];
                i = 1;
            }
        }
        mt.state[0] = 0x8000_0000; // MSB is 1, assuring a non-zero initial array
        mt.index = MT_N;
        mt
    }

    fn refill(&mut self) {
        let s = &mut *self.state;
        for i in 0..MT_N - MT_M {
            s[i] = s[i + MT_M] ^ mt_twist(s[i], s[i + 1]);
        }
        for i in MT_N - MT_M..MT_N - 1 {
            s[i] = s[i + MT_M - MT_N] ^ mt_twist(s[i], s[i + 1]);
        }
        s[MT_N - 1] = s[MT_M - 1] ^ mt_twist(s[MT_N - 1], s[0]);
        self.index = 0;
    }

    pub fn next_u32(&mut self) -> u32 {
        if self.index >= MT_N {
            self.refill();
        }
        let y = self.state[self.index];
        self.index += 1;
        mt_temper(y)
    }

    /// The seeded, not-yet-refilled word state. Only meaningful straight
    /// after construction, before any output was drawn.
    pub(crate) fn into_state(self) -> [u32; MT_N] {
        debug_assert_eq!(self.index, MT_N);
        *self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // First outputs for init_by_array({0x123, 0x234, 0x345, 0x456}), from
    // the reference mt19937ar test vector.
    const REFERENCE_HEAD: [u32; 8] = [
        1067595299, 955945823, 477289528, 4107686914, 4228976476, 3344332714, 3355579695,
        227628506,
    ];

    #[test]
    fn test_reference_vector_head() {
        let mut mt = MT19937::new_with_key(&[0x123, 0x234, 0x345, 0x456]);
        for (i, &want) in REFERENCE_HEAD.iter().enumerate() {
            assert_eq!(mt.next_u32(), want, "output {}", i);
        }
    }

    #[test]
    fn test_single_word_key() {
        // Any key length >= 1 is accepted; just pin determinism.
        let mut a = MT19937::new_with_key(&[5489]);
        let mut b = MT19937::new_with_key(&[5489]);
        for _ in 0..2000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_window_step_tracks_refill() {
        // Advancing the seeded window by 624 single steps must agree with
        // one in-place block refill.
        let key = [0x123, 0x234, 0x345, 0x456];
        let mut window = MT19937::new_with_key(&key).into_state();
        for _ in 0..MT_N {
            mt_window_step(&mut window);
        }
        let mut gen = MT19937::new_with_key(&key);
        gen.refill();
        assert_eq!(&window[..], &gen.state[..]);
    }
}
