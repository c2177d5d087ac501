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

//! Vectorized Mersenne Twister generators with matrix jump-ahead.
//!
//! The crate runs several independent MT19937 or SFMT19937 streams in
//! lockstep across the lanes of a 32..512-bit logical register, and places
//! those streams anywhere along the 2^19937 - 1 period by applying GF(2)
//! jump matrices to the packed state. The matrices themselves are dense
//! packed bit matrices with a threaded squaring kernel and hex/Base64
//! codecs, so `F^(2^k)` operators can be chained, persisted and reloaded.
//!
//! Typical setup: seed stream 0 with a key array, shift every stream by a
//! common jump, then space consecutive streams with a sequence jump so the
//! deinterleaved engine output reproduces one reference sequence at fixed
//! offsets.

mod bitmatrix;
mod caching;
mod codec;
mod environment;
mod errors;
mod jump;
mod mt19937;
mod sfmt19937;
mod simd;
mod square;
mod types;
mod vmt19937;
mod vsfmt19937;

pub use bitmatrix::{BinaryMatrix, BinarySquareMatrix};
pub use environment::{DISABLE_MATRIX_CACHE, MATRIX_CACHE_SIZE, SQUARE_THREADS};
pub use errors::{Error, Result};
pub use jump::{
    jump_power_file_name, MT19937Matrix, SFMT19937Matrix, MT_STATE_BITS, SFMT_STATE_BITS,
};
pub use mt19937::{MT19937, MT_M, MT_N};
pub use sfmt19937::{SFMT19937, SFMT_N128, SFMT_N32, SFMT_POS1};
pub use types::{QM_BLOCK16, QM_SCALAR, QM_STATE_SIZE};
pub use vmt19937::VMT19937;
pub use vsfmt19937::VSFMT19937;
