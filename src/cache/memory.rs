//! In-process change cache

use crate::cache::{CacheError, CacheResult, ChangeCache};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Change cache backed by a mutex-guarded map
///
/// Entries live for the lifetime of the process; there is no TTL.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> CacheResult<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".to_string()))
    }
}

impl ChangeCache for MemoryCache {
    fn lookup(&self, link: &str) -> CacheResult<Option<String>> {
        Ok(self.entries()?.get(link).cloned())
    }

    fn should_process(&self, link: &str, signal: &str) -> CacheResult<bool> {
        let mut entries = self.entries()?;
        match entries.get(link) {
            Some(current) if current == signal => Ok(false),
            _ => {
                entries.insert(link.to_string(), signal.to_string());
                Ok(true)
            }
        }
    }

    fn insert(&self, link: &str, signal: &str) -> CacheResult<()> {
        self.entries()?.insert(link.to_string(), signal.to_string());
        Ok(())
    }

    fn len(&self) -> CacheResult<usize> {
        Ok(self.entries()?.len())
    }
}
