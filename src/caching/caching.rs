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

use crate::environment::{DISABLE_MATRIX_CACHE, MATRIX_CACHE_SIZE};
use crate::jump::{MT19937Matrix, SFMT19937Matrix};
use lru::LruCache;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

/// LRU of deserialized jump operators, keyed by file-path hash.
///
/// A full-period operator is ~50 MB and a process that shards work across
/// many generators tends to construct them from the same few matrix files,
/// so entries are shared out as `Arc`s instead of re-read per generator.
pub(crate) struct MatrixCache<M> {
    entries: Mutex<LruCache<u64, Arc<M>>>,
}

impl<M> MatrixCache<M> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                std::num::NonZeroUsize::new(*MATRIX_CACHE_SIZE).unwrap(),
            )),
        }
    }

    pub fn get(&self, key: u64) -> Option<Arc<M>> {
        if *DISABLE_MATRIX_CACHE {
            return None;
        }
        self.entries.lock().unwrap().get(&key).map(Arc::clone)
    }

    pub fn insert(&self, key: u64, matrix: Arc<M>) {
        if *DISABLE_MATRIX_CACHE {
            return;
        }
        self.entries.lock().unwrap().put(key, matrix);
    }
}

pub(crate) static MT_JUMP_CACHE: Lazy<MatrixCache<MT19937Matrix>> = Lazy::new(MatrixCache::new);

pub(crate) static SFMT_JUMP_CACHE: Lazy<MatrixCache<SFMT19937Matrix>> = Lazy::new(MatrixCache::new);
