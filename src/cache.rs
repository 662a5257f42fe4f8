use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use sha2::{Digest, Sha256};

use crate::error::EditorResult;
use crate::loader;
use crate::table::Table;

/// Parsed uploads keyed by the SHA-256 of their bytes.
///
/// Entries live for the whole process; there is no eviction. Failed parses are
/// not stored, so a broken upload is parsed again if it is sent again.
#[derive(Default)]
pub struct LoadCache {
    entries: Mutex<HashMap<String, Arc<Table>>>,
}

/// Hex SHA-256 of an upload, used as its identity.
pub fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the table for `bytes`, parsing them only on the first request.
    ///
    /// # Arguments
    /// * `bytes` - Raw upload content
    ///
    /// # Returns
    /// * `EditorResult<(String, Arc<Table>)>` - The upload digest and its table
    pub fn get_or_load(&self, bytes: &[u8]) -> EditorResult<(String, Arc<Table>)> {
        let key = digest(bytes);

        if let Some(table) = self.lookup(&key) {
            log::debug!("load cache hit for {}", key);
            return Ok((key, table));
        }

        // Parse outside the lock; a concurrent miss on the same key just
        // parses twice and stores an equal table.
        let table = Arc::new(loader::from_xlsx_bytes(bytes)?);
        log::debug!("load cache miss for {}, parsed {} rows", key, table.row_count());

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let table = entries.entry(key.clone()).or_insert(table).clone();
        Ok((key, table))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<Arc<Table>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}
