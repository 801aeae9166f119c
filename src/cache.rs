//! Memoized formant tables
//!
//! The cache is unbounded and never evicts. Entries are not invalidated when
//! the audio file changes on disk; call [`FormantCache::clear`] for that.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::params::FormantParams;
use crate::table::FormantTable;

/// Identity of one extraction: file plus analysis parameters
///
/// Parameters are compared by bit pattern, so keys are equal exactly when
/// every component is identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    filename: PathBuf,
    max_formant: u64,
    window_length: u64,
    pre_emphasis: u64,
}

impl CacheKey {
    pub fn new<P: AsRef<Path>>(filename: P, params: &FormantParams) -> Self {
        Self {
            filename: filename.as_ref().to_path_buf(),
            max_formant: params.max_formant.to_bits(),
            window_length: params.window_length.to_bits(),
            pre_emphasis: params.pre_emphasis.to_bits(),
        }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn params(&self) -> FormantParams {
        FormantParams {
            max_formant: f64::from_bits(self.max_formant),
            window_length: f64::from_bits(self.window_length),
            pre_emphasis: f64::from_bits(self.pre_emphasis),
        }
    }
}

/// Formant tables keyed by [`CacheKey`], owned by the caller
#[derive(Debug, Default)]
pub struct FormantCache {
    tables: HashMap<CacheKey, Arc<FormantTable>>,
}

impl FormantCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<FormantTable>> {
        self.tables.get(key).cloned()
    }

    /// Store a table, replacing any previous one for the same key
    pub fn insert(&mut self, key: CacheKey, table: Arc<FormantTable>) {
        self.tables.insert(key, table);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.tables.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Drop every cached table
    pub fn clear(&mut self) {
        self.tables.clear();
    }
}
