//! Grouped summary statistics over a (filtered) dataset.
//!
//! Every function here is pure: results are recomputed from the dataset on
//! each call and an empty dataset always yields an empty result.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;

use super::model::{Dataset, Dimension};

/// Most keys `mean_by` accepts.
pub const MAX_GROUP_KEYS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("grouping needs 1 to {MAX_GROUP_KEYS} keys, got {0}")]
    KeyCount(usize),
    #[error("{0} is not one of the grouping keys")]
    UnknownKey(Dimension),
}

// ---------------------------------------------------------------------------
// Mean by group
// ---------------------------------------------------------------------------

/// Mean PM2.5 for one key combination.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    /// One label per grouping key, in key order.
    pub key: Vec<String>,
    /// `None` when every value in the group is missing.
    pub mean: Option<f64>,
    /// Number of non-missing values averaged.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedMeans {
    pub keys: Vec<Dimension>,
    pub rows: Vec<GroupMean>,
}

/// Mean PM2.5 per combination of `keys`.
///
/// Missing values are left out of both the sum and the count, so they never
/// pull a mean towards zero.
pub fn mean_by(dataset: &Dataset, keys: &[Dimension]) -> Result<GroupedMeans, AggregateError> {
    if keys.is_empty() || keys.len() > MAX_GROUP_KEYS {
        return Err(AggregateError::KeyCount(keys.len()));
    }

    let mut groups: BTreeMap<Vec<String>, (f64, usize)> = BTreeMap::new();
    for record in dataset.records() {
        let key: Vec<String> = keys.iter().map(|k| k.label(record).into_owned()).collect();
        let (sum, n) = groups.entry(key).or_insert((0.0, 0));
        if let Some(v) = record.pm25 {
            *sum += v;
            *n += 1;
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, (sum, count))| GroupMean {
            key,
            mean: (count > 0).then(|| sum / count as f64),
            count,
        })
        .collect();

    Ok(GroupedMeans {
        keys: keys.to_vec(),
        rows,
    })
}

impl GroupedMeans {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up the row for an exact key combination.
    #[cfg(test)]
    pub fn get(&self, key: &[&str]) -> Option<&GroupMean> {
        self.rows
            .iter()
            .find(|row| row.key.iter().map(String::as_str).eq(key.iter().copied()))
    }

    fn position(&self, dim: Dimension) -> Result<usize, AggregateError> {
        self.keys
            .iter()
            .position(|k| *k == dim)
            .ok_or(AggregateError::UnknownKey(dim))
    }

    /// Reshape into a matrix: one row per combination of `row_keys`
    /// (labels joined with `" - "`) and one column per `col_key` label.
    ///
    /// Groups without a mean are left out, so their cells read as "no data".
    pub fn pivot(&self, row_keys: &[Dimension], col_key: Dimension) -> Result<PivotTable, AggregateError> {
        let row_pos = row_keys
            .iter()
            .map(|d| self.position(*d))
            .collect::<Result<Vec<_>, _>>()?;
        let col_pos = self.position(col_key)?;

        Ok(pivot(self.rows.iter().filter_map(|row| {
            let mean = row.mean?;
            let label = row_pos
                .iter()
                .map(|&i| row.key[i].as_str())
                .collect::<Vec<_>>()
                .join(" - ");
            Some((label, row.key[col_pos].clone(), mean))
        })))
    }
}

// ---------------------------------------------------------------------------
// Category distribution by year
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub year: i32,
    pub category: String,
    /// Share of the year's categorised records, 0..=100.
    pub percent: f64,
}

/// Percentage of each category within each year.
///
/// Every label in `category_order` is reported for every year present, with
/// 0 for categories that never occur that year. Records with an empty
/// category are not counted. Labels outside `category_order` still count
/// towards the year's total but get no row of their own.
pub fn percent_distribution_by_year(dataset: &Dataset, category_order: &[String]) -> Vec<CategoryShare> {
    let mut years: BTreeMap<i32, (usize, HashMap<&str, usize>)> = BTreeMap::new();
    for record in dataset.records() {
        if record.category.is_empty() {
            continue;
        }
        let (total, counts) = years.entry(record.year).or_default();
        *total += 1;
        *counts.entry(record.category.as_str()).or_default() += 1;
    }

    let mut shares = Vec::with_capacity(years.len() * category_order.len());
    for (year, (total, counts)) in years {
        for category in category_order {
            let n = counts.get(category.as_str()).copied().unwrap_or(0);
            shares.push(CategoryShare {
                year,
                category: category.clone(),
                percent: n as f64 / total as f64 * 100.0,
            });
        }
    }
    shares
}

/// Categories as rows (in `category_order`), years as columns.
pub fn shares_pivot(shares: &[CategoryShare], category_order: &[String]) -> PivotTable {
    let mut table = pivot(
        shares
            .iter()
            .map(|s| (s.category.clone(), s.year.to_string(), s.percent)),
    );
    table.reorder_rows(category_order);
    table
}

// ---------------------------------------------------------------------------
// Pivot table
// ---------------------------------------------------------------------------

/// A row × column matrix of values. `None` marks a combination with no
/// data, which is distinct from a value of zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotTable {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `cells[row][col]`.
    pub cells: Vec<Vec<Option<f64>>>,
}

/// Build a pivot table from `(row, column, value)` triples.
///
/// Labels are sorted; repeated combinations are averaged.
pub fn pivot<I>(triples: I) -> PivotTable
where
    I: IntoIterator<Item = (String, String, f64)>,
{
    let mut acc: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
    let mut rows = BTreeSet::new();
    let mut cols = BTreeSet::new();

    for (row, col, value) in triples {
        rows.insert(row.clone());
        cols.insert(col.clone());
        let (sum, n) = acc.entry((row, col)).or_insert((0.0, 0));
        *sum += value;
        *n += 1;
    }

    let row_labels: Vec<String> = rows.into_iter().collect();
    let col_labels: Vec<String> = cols.into_iter().collect();
    let cells = row_labels
        .iter()
        .map(|r| {
            col_labels
                .iter()
                .map(|c| {
                    acc.get(&(r.clone(), c.clone()))
                        .map(|(sum, n)| sum / *n as f64)
                })
                .collect()
        })
        .collect();

    PivotTable {
        row_labels,
        col_labels,
        cells,
    }
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty() || self.col_labels.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.col_labels.iter().position(|l| l == col)?;
        self.cells[r][c]
    }

    /// Put rows in the given order; rows not named in `order` follow in
    /// their current order.
    pub fn reorder_rows(&mut self, order: &[String]) {
        let labels = ordered_labels(self.row_labels.iter().cloned(), order);
        let mut cells = Vec::with_capacity(self.cells.len());
        for label in &labels {
            if let Some(i) = self.row_labels.iter().position(|l| l == label) {
                cells.push(self.cells[i].clone());
            }
        }
        self.row_labels = labels;
        self.cells = cells;
    }

    /// Put columns in the given order, like [`reorder_rows`](Self::reorder_rows).
    pub fn reorder_cols(&mut self, order: &[String]) {
        let labels = ordered_labels(self.col_labels.iter().cloned(), order);
        let index: Vec<usize> = labels
            .iter()
            .filter_map(|label| self.col_labels.iter().position(|l| l == label))
            .collect();
        for row in &mut self.cells {
            *row = index.iter().map(|&i| row[i]).collect();
        }
        self.col_labels = labels;
    }

    /// Smallest and largest present value.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Mean of the column means, skipping empty cells and empty columns.
    /// Annotations above this value are drawn in a light colour.
    pub fn overall_mean(&self) -> Option<f64> {
        let col_means: Vec<f64> = (0..self.col_labels.len())
            .filter_map(|c| {
                let values: Vec<f64> = self.cells.iter().filter_map(|row| row[c]).collect();
                (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
            })
            .collect();
        (!col_means.is_empty()).then(|| col_means.iter().sum::<f64>() / col_means.len() as f64)
    }

    /// Cell annotations are only drawn on small tables.
    pub fn fits_annotations(&self) -> bool {
        self.row_labels.len() < 10 && self.col_labels.len() < 10
    }
}

/// `present` labels arranged by `order`; labels missing from `order` are
/// appended in their original order.
pub fn ordered_labels<I>(present: I, order: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let present: Vec<String> = present.into_iter().collect();
    let mut out: Vec<String> = order
        .iter()
        .filter(|label| present.contains(label))
        .cloned()
        .collect();
    for label in present {
        if !out.contains(&label) {
            out.push(label);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Distribution summaries (box plots)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub label: String,
    pub count: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value within `q1 - 1.5 * IQR`.
    pub lower_whisker: f64,
    /// Highest value within `q3 + 1.5 * IQR`.
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Quartiles and whiskers of PM2.5 per label of `dim`. Groups with only
/// missing values are omitted.
pub fn distribution_by(dataset: &Dataset, dim: Dimension) -> Vec<BoxSummary> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in dataset.records() {
        if let Some(v) = record.pm25 {
            groups.entry(dim.label(record).into_owned()).or_default().push(v);
        }
    }

    groups
        .into_iter()
        .map(|(label, mut values)| {
            values.sort_by(f64::total_cmp);
            let q1 = percentile(&values, 25.0);
            let median = percentile(&values, 50.0);
            let q3 = percentile(&values, 75.0);
            let iqr = q3 - q1;
            let (lo, hi) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

            let lower_whisker = values.iter().copied().find(|&v| v >= lo).unwrap_or(q1);
            let upper_whisker = values.iter().rev().copied().find(|&v| v <= hi).unwrap_or(q3);
            let outliers = values.iter().copied().filter(|&v| v < lo || v > hi).collect();

            BoxSummary {
                label,
                count: values.len(),
                q1,
                median,
                q3,
                lower_whisker,
                upper_whisker,
                outliers,
            }
        })
        .collect()
}

/// Percentile with linear interpolation between closest ranks.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(n - 1);
    let frac = rank - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}
