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
use thiserror::Error;

/// Failures surfaced by matrix codecs and generator construction.
///
/// The generation hot path (`next_u32` and friends) and the in-memory matrix
/// algebra have no recoverable failure modes and never return these. Calling
/// a query method that does not match the engine's compile-time query mode
/// is a programming error and panics instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The matrix stream is not decodable: header dimensions disagree with
    /// the expected shape, the payload contains bytes outside the hex/Base64
    /// alphabet, or the stream ends before the payload does.
    #[error("malformed matrix stream: {0}")]
    MalformedInput(String),

    /// A generator constructor precondition was violated, e.g. an empty seed
    /// key, or a common-jump repeat count without a common-jump matrix.
    #[error("invalid generator arguments: {0}")]
    InvalidArguments(String),

    /// An I/O error from the underlying stream, passed through unchanged.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
