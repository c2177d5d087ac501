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

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Cache key for a matrix file.
///
/// Canonicalizes first so the same file reached through different relative
/// paths shares one entry; a path that cannot be canonicalized (e.g. not
/// yet created) hashes as given and the subsequent load reports the real
/// error.
pub(crate) fn matrix_file_cache_key(path: &Path) -> u64 {
    let mut hasher = FxHasher::default();
    match path.canonicalize() {
        Ok(canonical) => canonical.hash(&mut hasher),
        Err(_) => path.hash(&mut hasher),
    }
    hasher.finish()
}

#[test]
fn test_distinct_paths_distinct_keys() {
    let a = matrix_file_cache_key(Path::new("/nonexistent/F00009.bits"));
    let b = matrix_file_cache_key(Path::new("/nonexistent/F00010.bits"));
    assert_ne!(a, b);
    assert_eq!(a, matrix_file_cache_key(Path::new("/nonexistent/F00009.bits")));
}
