use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Timelike};

use super::model::Dataset;
use crate::config::ColumnMap;

/// Write the dataset as CSV using the configured column names, so the file
/// can be loaded back with the same [`ColumnMap`]. Missing PM2.5 values are
/// written as empty cells.
pub fn write_csv(dataset: &Dataset, path: &Path, columns: &ColumnMap) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer
        .write_record(columns.required())
        .context("writing CSV header")?;

    for record in dataset.records() {
        let ts = record.timestamp;
        let pm25 = record.pm25.map(|v| v.to_string()).unwrap_or_default();
        writer
            .write_record([
                ts.year().to_string().as_str(),
                ts.month().to_string().as_str(),
                ts.day().to_string().as_str(),
                ts.hour().to_string().as_str(),
                pm25.as_str(),
                record.season.as_str(),
                record.day_type.as_str(),
                record.category.as_str(),
            ])
            .with_context(|| format!("writing record at {ts}"))?;
    }

    writer.flush().context("flushing CSV")?;
    log::info!("Exported {} records to {}", dataset.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filter, FilterCriteria};
    use crate::data::loader::load_file;
    use crate::data::model::fixtures::sample;

    #[test]
    fn exported_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filtered.csv");
        let columns = ColumnMap::default();

        let mut criteria = FilterCriteria::default();
        criteria.day_types.insert("Weekend".to_string());
        let filtered = filter(&sample(), &criteria);

        write_csv(&filtered, &path, &columns).unwrap();
        let reloaded = load_file(&path, &columns).unwrap();
        assert_eq!(reloaded, filtered);
    }
}
