use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Dataset, Record};
use crate::config::ColumnMap;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("opening {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("reading CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reading parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("decoding parquet columns: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("expected a top-level JSON array of records")]
    NotAnArray,
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("row {row}: column '{column}' has invalid value '{value}'")]
    Malformed {
        row: usize,
        column: String,
        value: String,
    },
    #[error("row {row}: {year}-{month}-{day} hour {hour} is not a valid timestamp")]
    InvalidTimestamp {
        row: usize,
        year: i64,
        month: i64,
        day: i64,
        hour: i64,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the hourly dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one record per line (the station export)
/// * `.json`    – `[{ "year": 2013, "month": 3, ..., "PM2.5": 4.0 }, ...]`
/// * `.parquet` – flat columns with the same names
///
/// Records are returned sorted by timestamp.
pub fn load_file(path: &Path, columns: &ColumnMap) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "csv" => load_csv(path, columns)?,
        "json" => load_json(path, columns)?,
        "parquet" | "pq" => load_parquet(path, columns)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };

    let dataset = Dataset::from_records(records);
    if let Some((first, last)) = dataset.time_span() {
        log::info!(
            "Loaded {} records from {} ({first} .. {last})",
            dataset.len(),
            path.display()
        );
    } else {
        log::info!("Loaded an empty dataset from {}", path.display());
    }
    Ok(dataset)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Field parsing shared by the text formats
// ---------------------------------------------------------------------------

fn malformed(row: usize, column: &str, value: &str) -> LoadError {
    LoadError::Malformed {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}

/// Integers may be written as `2013` or `2013.0`.
fn parse_int(row: usize, column: &str, text: &str) -> Result<i64, LoadError> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Ok(i);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        _ => Err(malformed(row, column, text)),
    }
}

fn is_missing(text: &str) -> bool {
    matches!(text, "" | "NA" | "N/A" | "NaN" | "nan" | "null")
}

fn parse_pm25(row: usize, column: &str, text: &str) -> Result<Option<f64>, LoadError> {
    let text = text.trim();
    if is_missing(text) {
        return Ok(None);
    }
    let value = text
        .parse::<f64>()
        .map_err(|_| malformed(row, column, text))?;
    Ok((!value.is_nan()).then_some(value))
}

/// Raw field values of one row, before the timestamp is composed.
struct RawRow {
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    pm25: Option<f64>,
    season: String,
    day_type: String,
    category: String,
}

impl RawRow {
    fn into_record(self, row: usize) -> Result<Record, LoadError> {
        let invalid = || LoadError::InvalidTimestamp {
            row,
            year: self.year,
            month: self.month,
            day: self.day,
            hour: self.hour,
        };
        let year = i32::try_from(self.year).map_err(|_| invalid())?;
        let month = u32::try_from(self.month).map_err(|_| invalid())?;
        let day = u32::try_from(self.day).map_err(|_| invalid())?;
        let hour = u32::try_from(self.hour).map_err(|_| invalid())?;
        let timestamp = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .ok_or_else(invalid)?;

        Ok(Record {
            timestamp,
            year,
            pm25: self.pm25,
            season: self.season,
            day_type: self.day_type,
            category: self.category,
        })
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Column positions resolved against a header row.
struct CsvLayout {
    year: usize,
    month: usize,
    day: usize,
    hour: usize,
    pm25: usize,
    season: usize,
    day_type: usize,
    category: usize,
}

impl CsvLayout {
    fn resolve(headers: &csv::StringRecord, columns: &ColumnMap) -> Result<Self, LoadError> {
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim(), i))
            .collect();
        let find = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };

        Ok(CsvLayout {
            year: find(&columns.year)?,
            month: find(&columns.month)?,
            day: find(&columns.day)?,
            hour: find(&columns.hour)?,
            pm25: find(&columns.pm25)?,
            season: find(&columns.season)?,
            day_type: find(&columns.day_type)?,
            category: find(&columns.category)?,
        })
    }
}

/// Header row with column names; any columns beyond the required ones
/// (station, other pollutants, weather) are ignored.
fn load_csv(path: &Path, columns: &ColumnMap) -> Result<Vec<Record>, LoadError> {
    let mut reader = csv::Reader::from_reader(BufReader::new(open(path)?));
    let layout = CsvLayout::resolve(reader.headers()?, columns)?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let rec = result?;
        let field = |i: usize| rec.get(i).unwrap_or("");

        let raw = RawRow {
            year: parse_int(row, &columns.year, field(layout.year))?,
            month: parse_int(row, &columns.month, field(layout.month))?,
            day: parse_int(row, &columns.day, field(layout.day))?,
            hour: parse_int(row, &columns.hour, field(layout.hour))?,
            pm25: parse_pm25(row, &columns.pm25, field(layout.pm25))?,
            season: field(layout.season).trim().to_string(),
            day_type: field(layout.day_type).trim().to_string(),
            category: field(layout.category).trim().to_string(),
        };
        records.push(raw.into_record(row)?);
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
fn load_json(path: &Path, columns: &ColumnMap) -> Result<Vec<Record>, LoadError> {
    let root: JsonValue = serde_json::from_reader(BufReader::new(open(path)?))?;
    let rows = root.as_array().ok_or(LoadError::NotAnArray)?;

    rows.iter()
        .enumerate()
        .map(|(row, value)| {
            let obj = value.as_object().ok_or_else(|| malformed(row, "<row>", &value.to_string()))?;
            let get = |name: &str| {
                obj.get(name)
                    .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
            };

            let raw = RawRow {
                year: json_int(row, &columns.year, get(&columns.year)?)?,
                month: json_int(row, &columns.month, get(&columns.month)?)?,
                day: json_int(row, &columns.day, get(&columns.day)?)?,
                hour: json_int(row, &columns.hour, get(&columns.hour)?)?,
                pm25: json_pm25(row, &columns.pm25, get(&columns.pm25)?)?,
                season: json_text(get(&columns.season)?),
                day_type: json_text(get(&columns.day_type)?),
                category: json_text(get(&columns.category)?),
            };
            raw.into_record(row)
        })
        .collect()
}

fn json_int(row: usize, column: &str, value: &JsonValue) -> Result<i64, LoadError> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| malformed(row, column, &n.to_string())),
        JsonValue::String(s) => parse_int(row, column, s),
        other => Err(malformed(row, column, &other.to_string())),
    }
}

fn json_pm25(row: usize, column: &str, value: &JsonValue) -> Result<Option<f64>, LoadError> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::Number(n) => Ok(n.as_f64().filter(|v| !v.is_nan())),
        JsonValue::String(s) => parse_pm25(row, column, s),
        other => Err(malformed(row, column, &other.to_string())),
    }
}

fn json_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Date-part columns may be any integer or float type, the pollutant column
/// any numeric type (nulls are missing values), and the label columns strings.
/// Works with files written by both Pandas and Polars.
fn load_parquet(path: &Path, columns: &ColumnMap) -> Result<Vec<Record>, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;
    let reader = builder.build()?;

    let mut records = Vec::new();
    let mut offset = 0usize;

    for batch in reader {
        let batch = batch?;
        let column = |name: &str, to: &DataType| -> Result<ArrayRef, LoadError> {
            let array = batch
                .column_by_name(name)
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
            Ok(cast(array, to)?)
        };

        let year = column(&columns.year, &DataType::Int64)?;
        let month = column(&columns.month, &DataType::Int64)?;
        let day = column(&columns.day, &DataType::Int64)?;
        let hour = column(&columns.hour, &DataType::Int64)?;
        let pm25 = column(&columns.pm25, &DataType::Float64)?;
        let season = column(&columns.season, &DataType::Utf8)?;
        let day_type = column(&columns.day_type, &DataType::Utf8)?;
        let category = column(&columns.category, &DataType::Utf8)?;

        let ints = |array: &ArrayRef, name: &str, i: usize| -> Result<i64, LoadError> {
            let values = array.as_primitive::<Int64Type>();
            if values.is_null(i) {
                Err(malformed(offset + i, name, "null"))
            } else {
                Ok(values.value(i))
            }
        };
        let text = |array: &ArrayRef, i: usize| -> String {
            let values = array.as_string::<i32>();
            if values.is_null(i) {
                String::new()
            } else {
                values.value(i).trim().to_string()
            }
        };
        let pm25_values = pm25.as_primitive::<Float64Type>();

        for i in 0..batch.num_rows() {
            let raw = RawRow {
                year: ints(&year, &columns.year, i)?,
                month: ints(&month, &columns.month, i)?,
                day: ints(&day, &columns.day, i)?,
                hour: ints(&hour, &columns.hour, i)?,
                pm25: (!pm25_values.is_null(i))
                    .then(|| pm25_values.value(i))
                    .filter(|v| !v.is_nan()),
                season: text(&season, i),
                day_type: text(&day_type, i),
                category: text(&category, i),
            };
            records.push(raw.into_record(offset + i)?);
        }
        offset += batch.num_rows();
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    fn write_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const HEADER: &str = "No,year,month,day,hour,PM2.5,station,musim,tipe_hari,Kategori_PM2.5\n";

    #[test]
    fn csv_is_sorted_and_missing_values_are_none() {
        let body = "\
2,2013,3,1,1,NA,Guanyuan,Musim Semi,Weekday,Baik
1,2013,3,1,0,4.0,Guanyuan,Musim Semi,Weekday,Baik
3,2013.0,3,1,2,,Guanyuan,Musim Semi,Weekday,Sedang
";
        let file = write_file(".csv", &format!("{HEADER}{body}"));
        let ds = load_file(file.path(), &ColumnMap::default()).unwrap();

        assert_eq!(ds.len(), 3);
        let hours: Vec<_> = ds
            .records()
            .iter()
            .map(|r| r.timestamp.format("%H").to_string())
            .collect();
        assert_eq!(hours, vec!["00", "01", "02"]);
        assert_eq!(ds.records()[0].pm25, Some(4.0));
        assert_eq!(ds.records()[1].pm25, None);
        assert_eq!(ds.records()[2].pm25, None);
        assert_eq!(ds.records()[2].year, 2013);
    }

    #[test]
    fn csv_missing_column_is_rejected() {
        let file = write_file(".csv", "year,month,day,hour,PM2.5,musim,tipe_hari\n2013,3,1,0,1,a,b\n");
        match load_file(file.path(), &ColumnMap::default()) {
            Err(LoadError::MissingColumn(name)) => assert_eq!(name, "Kategori_PM2.5"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn csv_bad_number_names_row_and_column() {
        let body = "1,2013,3,1,0,abc,Guanyuan,Musim Semi,Weekday,Baik\n";
        let file = write_file(".csv", &format!("{HEADER}{body}"));
        match load_file(file.path(), &ColumnMap::default()) {
            Err(LoadError::Malformed { row, column, value }) => {
                assert_eq!(row, 0);
                assert_eq!(column, "PM2.5");
                assert_eq!(value, "abc");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn impossible_date_is_rejected() {
        let body = "1,2013,2,30,0,1.0,Guanyuan,Musim Dingin,Weekday,Baik\n";
        let file = write_file(".csv", &format!("{HEADER}{body}"));
        assert!(matches!(
            load_file(file.path(), &ColumnMap::default()),
            Err(LoadError::InvalidTimestamp { row: 0, .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_file(Path::new("/nonexistent/all_data.csv"), &ColumnMap::default());
        assert!(matches!(err, Err(LoadError::Io { .. })));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = write_file(".xlsx", "");
        assert!(matches!(
            load_file(file.path(), &ColumnMap::default()),
            Err(LoadError::UnsupportedExtension(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn json_records_are_loaded() {
        let json = r#"[
            {"year": 2014, "month": 1, "day": 2, "hour": 3, "PM2.5": null,
             "musim": "Musim Dingin", "tipe_hari": "Weekday", "Kategori_PM2.5": "Sedang"},
            {"year": 2014, "month": 1, "day": 2, "hour": 1, "PM2.5": 12.5,
             "musim": "Musim Dingin", "tipe_hari": "Weekday", "Kategori_PM2.5": "Baik"}
        ]"#;
        let file = write_file(".json", json);
        let ds = load_file(file.path(), &ColumnMap::default()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].pm25, Some(12.5));
        assert_eq!(ds.records()[1].pm25, None);
    }

    #[test]
    fn parquet_columns_are_cast() {
        use arrow::array::{Float64Array, Int32Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("year", DataType::Int32, false),
            Field::new("month", DataType::Int32, false),
            Field::new("day", DataType::Int32, false),
            Field::new("hour", DataType::Int32, false),
            Field::new("PM2.5", DataType::Float64, true),
            Field::new("musim", DataType::Utf8, false),
            Field::new("tipe_hari", DataType::Utf8, false),
            Field::new("Kategori_PM2.5", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![2016, 2015])),
                Arc::new(Int32Array::from(vec![6, 6])),
                Arc::new(Int32Array::from(vec![1, 1])),
                Arc::new(Int32Array::from(vec![0, 0])),
                Arc::new(Float64Array::from(vec![Some(75.0), None])),
                Arc::new(StringArray::from(vec!["Musim Panas", "Musim Panas"])),
                Arc::new(StringArray::from(vec!["Weekday", "Weekday"])),
                Arc::new(StringArray::from(vec!["Tidak Sehat", "Sedang"])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path(), &ColumnMap::default()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].year, 2015);
        assert_eq!(ds.records()[0].pm25, None);
        assert_eq!(ds.records()[1].pm25, Some(75.0));
        assert_eq!(ds.records()[1].category, "Tidak Sehat");
    }
}
