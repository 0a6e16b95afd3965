use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result};

use super::loader::load_file;
use super::model::AppointmentDataset;

// ---------------------------------------------------------------------------
// Source identity
// ---------------------------------------------------------------------------

/// Identifies one version of a source file: a rewritten file gets a new key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceKey {
    pub fn for_path(path: &Path) -> Result<Self> {
        let path = std::fs::canonicalize(path)
            .with_context(|| format!("resolving {}", path.display()))?;
        let meta = std::fs::metadata(&path)
            .with_context(|| format!("reading metadata of {}", path.display()))?;
        Ok(SourceKey {
            path,
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// DatasetCache
// ---------------------------------------------------------------------------

/// Memoizes enriched datasets per source so each one is loaded at most once.
///
/// Owned by the application state; hand a fresh cache to tests.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<SourceKey, Arc<AppointmentDataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load through [`load_file`], reusing the cached result for an unchanged source.
    pub fn load(&mut self, path: &Path) -> Result<Arc<AppointmentDataset>> {
        self.load_with(path, load_file)
    }

    /// Same as [`DatasetCache::load`] with a custom loader. Failed loads are not cached.
    pub fn load_with<F>(&mut self, path: &Path, loader: F) -> Result<Arc<AppointmentDataset>>
    where
        F: FnOnce(&Path) -> Result<AppointmentDataset>,
    {
        let key = SourceKey::for_path(path)?;
        if let Some(dataset) = self.entries.get(&key) {
            log::debug!("Cache hit for {}", key.path.display());
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(loader(&key.path)?);
        // Only the newest version of a file is kept.
        self.entries.retain(|cached, _| cached.path != key.path);
        self.entries.insert(key, Arc::clone(&dataset));
        log::debug!("{} dataset(s) cached", self.len());
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::Write;

    use super::*;

    const CSV: &str = "\
AppointmentDate,BookingDate,Age,Gender,Location,Department,HealthInsurance,SMSReminderSent,NoShow
2024-01-10,2024-01-01,34,Male,Lagos,Cardiology,Yes,No,1
";

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn same_source_returns_identical_dataset() {
        let file = csv_file(CSV);
        let mut cache = DatasetCache::new();

        let first = cache.load(file.path()).unwrap();
        let second = cache.load(file.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn loader_runs_once_per_source() {
        let file = csv_file(CSV);
        let mut cache = DatasetCache::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            cache
                .load_with(file.path(), |p| {
                    calls.set(calls.get() + 1);
                    load_file(p)
                })
                .unwrap();
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn changed_source_is_reloaded() {
        let mut file = csv_file(CSV);
        let mut cache = DatasetCache::new();
        let first = cache.load(file.path()).unwrap();

        file.write_all(b"2024-02-10,2024-02-01,70,Female,Kano,Surgery,No,Yes,0\n")
            .unwrap();
        file.flush().unwrap();
        let second = cache.load(file.path()).unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(second.age_bands.top_edge, 70);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_sources_are_cached_side_by_side() {
        let a = csv_file(CSV);
        let b = csv_file(CSV);
        let mut cache = DatasetCache::new();
        cache.load(a.path()).unwrap();
        cache.load(b.path()).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let file = csv_file("Age\n3\n");
        let mut cache = DatasetCache::new();
        assert!(cache.load(file.path()).is_err());
        assert!(cache.is_empty());
    }
}
