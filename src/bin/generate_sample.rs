use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arrow::array::{Float64Builder, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::print_batches;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use parquet::arrow::ArrowWriter;

const HEADERS: [&str; 8] = [
    "year",
    "month",
    "day",
    "hour",
    "PM2.5",
    "musim",
    "tipe_hari",
    "Kategori_PM2.5",
];

/// Share of hourly readings left blank, like a sensor outage.
const MISSING_RATE: f64 = 0.02;

/// One synthetic hourly observation.
struct Row {
    at: NaiveDateTime,
    pm25: Option<f64>,
    season: &'static str,
    day_type: &'static str,
    category: &'static str,
}

fn season(month: u32) -> &'static str {
    match month {
        12 | 1 | 2 => "Musim Dingin",
        3..=5 => "Musim Semi",
        6..=8 => "Musim Panas",
        _ => "Musim Gugur",
    }
}

fn day_type(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => "Weekend",
        _ => "Weekday",
    }
}

/// Severity band for a concentration in µg/m³. Missing readings get no band.
fn category(pm25: Option<f64>) -> &'static str {
    match pm25 {
        None => "",
        Some(v) if v <= 15.5 => "Baik",
        Some(v) if v <= 55.4 => "Sedang",
        Some(v) if v <= 150.4 => "Tidak Sehat",
        Some(v) if v <= 250.4 => "Sangat Tidak Sehat",
        Some(_) => "Berbahaya",
    }
}

/// Winter heating and a morning/evening rush give the series some shape.
fn baseline(at: NaiveDateTime) -> f64 {
    let seasonal = match season(at.month()) {
        "Musim Dingin" => 120.0,
        "Musim Gugur" => 85.0,
        "Musim Semi" => 70.0,
        _ => 55.0,
    };
    let rush = match at.hour() {
        7..=9 | 18..=21 => 1.25,
        1..=5 => 0.8,
        _ => 1.0,
    };
    let weekend = if day_type(at.date()) == "Weekend" { 0.9 } else { 1.0 };
    seasonal * rush * weekend
}

fn generate(start: NaiveDate, end: NaiveDate, rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut at = start.and_time(NaiveTime::default());
    let stop = end.and_time(NaiveTime::default()) + Duration::hours(23);
    // Slow drift so consecutive hours stay correlated.
    let mut drift = 0.0;

    while at <= stop {
        drift = 0.95 * drift + rng.gauss(0.0, 8.0);
        let pm25 = if rng.next_f64() < MISSING_RATE {
            None
        } else {
            let noisy = baseline(at) * (1.0 + rng.gauss(0.0, 0.35)) + drift;
            Some((noisy.max(2.0) * 10.0).round() / 10.0)
        };
        rows.push(Row {
            at,
            pm25,
            season: season(at.month()),
            day_type: day_type(at.date()),
            category: category(pm25),
        });
        at += Duration::hours(1);
    }
    rows
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_csv(rows: &[Row], path: &Path) -> anyhow::Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record([
            row.at.year().to_string(),
            row.at.month().to_string(),
            row.at.day().to_string(),
            row.at.hour().to_string(),
            row.pm25.map(|v| v.to_string()).unwrap_or_default(),
            row.season.to_string(),
            row.day_type.to_string(),
            row.category.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn to_batch(rows: &[Row]) -> anyhow::Result<RecordBatch> {
    let int_column = |f: fn(&NaiveDateTime) -> i64| {
        Int64Array::from(rows.iter().map(|r| f(&r.at)).collect::<Vec<_>>())
    };

    let mut pm25 = Float64Builder::with_capacity(rows.len());
    for row in rows {
        pm25.append_option(row.pm25);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Int64, false),
        Field::new(HEADERS[1], DataType::Int64, false),
        Field::new(HEADERS[2], DataType::Int64, false),
        Field::new(HEADERS[3], DataType::Int64, false),
        Field::new(HEADERS[4], DataType::Float64, true),
        Field::new(HEADERS[5], DataType::Utf8, false),
        Field::new(HEADERS[6], DataType::Utf8, false),
        Field::new(HEADERS[7], DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(int_column(|t| i64::from(t.year()))),
            Arc::new(int_column(|t| i64::from(t.month()))),
            Arc::new(int_column(|t| i64::from(t.day()))),
            Arc::new(int_column(|t| i64::from(t.hour()))),
            Arc::new(pm25.finish()),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.season))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.day_type))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.category))),
        ],
    )?;
    Ok(batch)
}

fn write_parquet(batch: &RecordBatch, path: &Path) -> anyhow::Result<()> {
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);

    let start = NaiveDate::from_ymd_opt(2013, 3, 1).context("invalid start date")?;
    let end = NaiveDate::from_ymd_opt(2017, 2, 28).context("invalid end date")?;
    let rows = generate(start, end, &mut rng);

    let csv_path = Path::new("all_data.csv");
    write_csv(&rows, csv_path)?;

    let batch = to_batch(&rows)?;
    let parquet_path = Path::new("all_data.parquet");
    write_parquet(&batch, parquet_path)?;

    print_batches(&[batch.slice(0, batch.num_rows().min(5))])?;
    println!(
        "Wrote {} hourly records ({start} to {end}) to {} and {}",
        rows.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
