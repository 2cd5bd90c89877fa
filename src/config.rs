use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an optional JSON configuration file.
pub const CONFIG_ENV: &str = "PM25_DASHBOARD_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Source column names for every attribute the loader needs.
///
/// Defaults match the Guanyuan station export (`all_data.csv`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
    pub pm25: String,
    pub season: String,
    pub day_type: String,
    pub category: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            year: "year".into(),
            month: "month".into(),
            day: "day".into(),
            hour: "hour".into(),
            pm25: "PM2.5".into(),
            season: "musim".into(),
            day_type: "tipe_hari".into(),
            category: "Kategori_PM2.5".into(),
        }
    }
}

impl ColumnMap {
    /// All required column names, in the order they are validated.
    pub fn required(&self) -> [&str; 8] {
        [
            self.year.as_str(),
            self.month.as_str(),
            self.day.as_str(),
            self.hour.as_str(),
            self.pm25.as_str(),
            self.season.as_str(),
            self.day_type.as_str(),
            self.category.as_str(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub columns: ColumnMap,
    /// Season order used by the clustered bar charts.
    pub season_order: Vec<String>,
    /// Severity labels from lowest to highest.
    pub category_order: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("all_data.csv"),
            columns: ColumnMap::default(),
            season_order: ["Musim Dingin", "Musim Semi", "Musim Panas", "Musim Gugur"]
                .map(String::from)
                .to_vec(),
            category_order: [
                "Baik",
                "Sedang",
                "Tidak Sehat",
                "Sangat Tidak Sehat",
                "Berbahaya",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file; absent fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the file named by [`CONFIG_ENV`], then the CLI data path.
    pub fn resolve(
        config_file: Option<PathBuf>,
        data_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        if let Some(path) = data_path {
            config.data_path = path;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "data_path": "data/guanyuan.csv", "columns": {{ "season": "season" }} }}"#
        )
        .unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.data_path, PathBuf::from("data/guanyuan.csv"));
        assert_eq!(config.columns.season, "season");
        assert_eq!(config.columns.pm25, "PM2.5");
        assert_eq!(config.category_order.len(), 5);
    }

    #[test]
    fn cli_path_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "data_path": "from_file.csv" }}"#).unwrap();

        let config = DashboardConfig::resolve(
            Some(file.path().to_path_buf()),
            Some(PathBuf::from("from_cli.csv")),
        )
        .unwrap();
        assert_eq!(config.data_path, PathBuf::from("from_cli.csv"));
    }

    #[test]
    fn invalid_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            DashboardConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
