use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::config::ColumnMap;
use crate::data::loader::{load_file, LoadError};
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Session cache
// ---------------------------------------------------------------------------

/// Holds the dataset for the lifetime of the session.
///
/// The file is read on the first successful [`get_or_load`](Self::get_or_load);
/// later calls hand out the same shared, read-only dataset. A failed load is
/// not cached.
pub struct SessionCache {
    path: PathBuf,
    columns: ColumnMap,
    dataset: OnceLock<Arc<Dataset>>,
}

impl SessionCache {
    pub fn new(path: impl Into<PathBuf>, columns: ColumnMap) -> Self {
        Self {
            path: path.into(),
            columns,
            dataset: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_or_load(&self) -> Result<Arc<Dataset>, LoadError> {
        if let Some(dataset) = self.dataset.get() {
            return Ok(Arc::clone(dataset));
        }
        let loaded = Arc::new(load_file(&self.path, &self.columns)?);
        Ok(Arc::clone(self.dataset.get_or_init(|| loaded)))
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.dataset.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
year,month,day,hour,PM2.5,musim,tipe_hari,Kategori_PM2.5
2013,3,1,0,4,Musim Semi,Weekday,Baik
2013,3,1,1,9,Musim Semi,Weekday,Baik
";

    #[test]
    fn loads_once_and_shares_the_dataset() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let cache = SessionCache::new(file.path(), ColumnMap::default());
        assert!(!cache.is_loaded());
        let first = cache.get_or_load().unwrap();
        assert_eq!(first.len(), 2);

        // later reads come from memory even if the file changes
        file.as_file().set_len(0).unwrap();
        let second = cache.get_or_load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn failed_load_is_not_cached() {
        let cache = SessionCache::new("/nonexistent/all_data.csv", ColumnMap::default());
        assert!(cache.get_or_load().is_err());
        assert!(!cache.is_loaded());
    }
}
