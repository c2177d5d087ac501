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
use once_cell::sync::Lazy;
use std::env;

/// Number of worker threads used when squaring a binary matrix.
///
/// # Environment Configuration
/// Set via `VMT19937_SQUARE_THREADS` environment variable.
///
/// # Default Behavior
/// - Default: 4 workers
/// - Each worker owns one accumulator row while it processes its strip,
///   so memory overhead scales with this value times one matrix row.
///
/// Set the env var like so:
/// ```bash
/// export VMT19937_SQUARE_THREADS=[INTEGER]
/// ```
///
/// Squaring a 19937-bit operator touches ~50 MB of source matrix per pass;
/// more workers help until the strips no longer fit in cache together.
pub static SQUARE_THREADS: Lazy<usize> = Lazy::new(|| {
    env::var("VMT19937_SQUARE_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(4)
});

/// Maximum number of loaded jump matrices kept in memory.
///
/// # Environment Configuration
/// Set via `VMT19937_MATRIX_CACHE_SIZE` environment variable.
///
/// # Default Behavior
/// - Default size: 4 matrices
/// - Implements LRU eviction policy
///
/// # Memory Impact
/// A full-period jump operator is roughly 50 MB, so the default keeps at
/// most ~200 MB resident. Size the cache to the number of distinct jump
/// exponents your process actually constructs generators with.
pub static MATRIX_CACHE_SIZE: Lazy<usize> = Lazy::new(|| {
    env::var("VMT19937_MATRIX_CACHE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(4)
});

/// Global flag to disable the loaded-matrix cache.
///
/// # Environment Configuration
/// Set via `VMT19937_DISABLE_MATRIX_CACHE` environment variable.
///
/// # Accepted Values
/// - Enable cache (default): not set, empty string, "0", "false", "no"
/// - Disable cache: "1", "true", "yes"
///   Case insensitive for all values
///
/// Useful when a process constructs many generators from distinct matrix
/// files and would otherwise pin gigabytes of operators in memory.
pub static DISABLE_MATRIX_CACHE: Lazy<bool> =
    Lazy::new(|| match env::var("VMT19937_DISABLE_MATRIX_CACHE") {
        Ok(val) => {
            let val_lower = val.to_lowercase();
            val_lower == "1" || val_lower == "true" || val_lower == "yes"
        }
        Err(_) => false,
    });
