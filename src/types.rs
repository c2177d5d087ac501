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

/// Query-mode selectors for the vectorized generators.
///
/// The mode is a const-generic parameter of the engine type, so each
/// instantiation is monomorphized for exactly one access pattern and the
/// per-call bookkeeping the other modes would need compiles away.
///
/// - `QM_SCALAR`: one `u32` per call (`next_u32`).
/// - `QM_BLOCK16`: sixteen `u32` per call (`next_block16`).
/// - `QM_STATE_SIZE`: one full refill per call (`next_state_block`).
///
/// Calling a query method that does not match the engine's mode panics.
pub const QM_SCALAR: u8 = 0;
pub const QM_BLOCK16: u8 = 1;
pub const QM_STATE_SIZE: u8 = 2;

/// Widest supported register, counted in 32-bit lanes (512 bits).
/// Stack temporaries in the refill kernels are sized with this so they work
/// for every narrower instantiation.
pub(crate) const MAX_REG_U32: usize = 16;
