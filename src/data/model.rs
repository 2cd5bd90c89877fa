use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// Record – one hourly measurement
// ---------------------------------------------------------------------------

/// A single hourly observation (one row of the source table).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Composed from the `year`, `month`, `day` and `hour` columns.
    pub timestamp: NaiveDateTime,
    pub year: i32,
    /// PM2.5 concentration in µg/m³; `None` when the source cell is missing.
    pub pm25: Option<f64>,
    pub season: String,
    pub day_type: String,
    /// Severity label, precomputed upstream from PM2.5 thresholds.
    pub category: String,
}

// ---------------------------------------------------------------------------
// Dimension – a categorical grouping key
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Year,
    Season,
    DayType,
    Category,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Year,
        Dimension::Season,
        Dimension::DayType,
        Dimension::Category,
    ];

    /// The record's label along this dimension.
    pub fn label<'r>(&self, record: &'r Record) -> Cow<'r, str> {
        match self {
            Dimension::Year => Cow::Owned(record.year.to_string()),
            Dimension::Season => Cow::Borrowed(&record.season),
            Dimension::DayType => Cow::Borrowed(&record.day_type),
            Dimension::Category => Cow::Borrowed(&record.category),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Year => "Year",
            Dimension::Season => "Season",
            Dimension::DayType => "Day type",
            Dimension::Category => "Category",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the loaded table, sorted by timestamp
// ---------------------------------------------------------------------------

/// All records in ascending timestamp order plus per-dimension label sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    /// For each dimension the sorted set of labels present.
    pub unique_values: BTreeMap<Dimension, BTreeSet<String>>,
}

impl Dataset {
    /// Sort the records by timestamp and build the label index.
    ///
    /// The sort is stable, so records sharing a timestamp keep file order.
    pub fn from_records(mut records: Vec<Record>) -> Self {
        records.sort_by_key(|r| r.timestamp);
        Self::from_sorted(records)
    }

    /// Build from records already in timestamp order (e.g. a filtered subset).
    pub(crate) fn from_sorted(records: Vec<Record>) -> Self {
        debug_assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let mut unique_values: BTreeMap<Dimension, BTreeSet<String>> = BTreeMap::new();
        for record in &records {
            for dim in Dimension::ALL {
                let label = dim.label(record);
                let set = unique_values.entry(dim).or_default();
                if !set.contains(label.as_ref()) {
                    set.insert(label.into_owned());
                }
            }
        }

        Dataset {
            records,
            unique_values,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest timestamps, or `None` for an empty dataset.
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        Some((first.timestamp, last.timestamp))
    }

    /// Sorted labels present along `dim`.
    pub fn labels(&self, dim: Dimension) -> Vec<String> {
        self.unique_values
            .get(&dim)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}
