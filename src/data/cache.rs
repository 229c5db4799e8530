use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use super::loader::{LoadError, load_file};
use super::model::MealTable;

/// Memoizes loaded tables per path for the lifetime of the cache.
///
/// Entries are never mutated or evicted; dropping the cache is the only way
/// to force a re-read.  Cloned handles share the same entries.
#[derive(Debug, Clone, Default)]
pub struct TableCache {
    entries: Arc<RwLock<HashMap<PathBuf, Arc<MealTable>>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it from disk on first use.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<MealTable>, LoadError> {
        self.get_or_load_with(path, load_file)
    }

    /// Like [`get_or_load`](Self::get_or_load) with an injected loader.
    /// Failed loads are not cached.
    pub fn get_or_load_with<F>(&self, path: &Path, load: F) -> Result<Arc<MealTable>, LoadError>
    where
        F: FnOnce(&Path) -> Result<MealTable, LoadError>,
    {
        if let Some(table) = self.get(path) {
            log::debug!("Table cache hit for {}", path.display());
            return Ok(table);
        }

        let table = Arc::new(load(path)?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another handle may have raced us here; keep whichever landed first.
        let cached = entries
            .entry(path.to_path_buf())
            .or_insert_with(|| table)
            .clone();
        log::info!("Cached table for {}", path.display());
        Ok(cached)
    }

    pub fn get(&self, path: &Path) -> Option<Arc<MealTable>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn tiny_table() -> MealTable {
        MealTable::from_raw(vec!["calories".into()], vec![vec![Some("100".to_string())]])
    }

    #[test]
    fn loads_once_per_path() {
        let cache = TableCache::new();
        let calls = Cell::new(0);
        let load = |_: &Path| -> Result<MealTable, LoadError> {
            calls.set(calls.get() + 1);
            Ok(tiny_table())
        };

        let a = cache.get_or_load_with(Path::new("meals.csv"), load).unwrap();
        let b = cache.get_or_load_with(Path::new("meals.csv"), load).unwrap();
        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&a, &b));

        cache.get_or_load_with(Path::new("other.csv"), load).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = TableCache::new();
        let path = Path::new("missing.csv");
        let err = cache
            .get_or_load_with(path, |p| Err(LoadError::NotFound(p.to_path_buf())))
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
        assert!(cache.is_empty());

        cache.get_or_load_with(path, |_| Ok(tiny_table())).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clones_share_entries() {
        let cache = TableCache::new();
        let handle = cache.clone();
        cache
            .get_or_load_with(Path::new("meals.csv"), |_| Ok(tiny_table()))
            .unwrap();
        assert!(handle.get(Path::new("meals.csv")).is_some());
    }
}
