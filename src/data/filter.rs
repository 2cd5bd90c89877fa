use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use super::model::{Dataset, Dimension, Record};

// ---------------------------------------------------------------------------
// Time range input
// ---------------------------------------------------------------------------

/// A time-range selection as it comes from the date pickers.
///
/// Either bound may be absent while the user is still picking; see
/// [`TimeRange::resolve`] for how incomplete input is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterInputError {
    #[error("time range needs both a start and an end")]
    MissingBound,
    #[error("time range start {start} is after end {end}")]
    Inverted {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Only one bound picked.
    #[cfg(test)]
    pub fn single(at: NaiveDateTime) -> Self {
        Self {
            start: Some(at),
            end: None,
        }
    }

    /// Calendar dates taken as midnight timestamps. Only the 00:00 record of
    /// the end date falls inside the range.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(
            start.and_time(NaiveTime::default()),
            end.and_time(NaiveTime::default()),
        )
    }

    /// Check that both bounds are present and ordered.
    pub fn validate(&self) -> Result<(NaiveDateTime, NaiveDateTime), FilterInputError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => Ok((start, end)),
            (Some(start), Some(end)) => Err(FilterInputError::Inverted { start, end }),
            _ => Err(FilterInputError::MissingBound),
        }
    }

    /// Bounds to filter with, or `None` for "no restriction".
    ///
    /// Malformed input (a missing bound or `start > end`) falls back to the
    /// full available range, which is the same as no restriction. The error
    /// is logged rather than returned.
    pub fn resolve(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match self.validate() {
            Ok(bounds) => Some(bounds),
            Err(e) => {
                log::warn!("{e}; using the full time range");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// User-selected restrictions. An empty set or unset range means
/// "no restriction on this dimension"; dimensions combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub seasons: BTreeSet<String>,
    pub day_types: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub time_range: Option<TimeRange>,
}

impl FilterCriteria {
    /// Whether no dimension is restricted.
    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
            && self.day_types.is_empty()
            && self.categories.is_empty()
            && self.time_range.is_none()
    }

    /// The label set for a categorical dimension.
    pub fn selection(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        match dim {
            Dimension::Season => Some(&self.seasons),
            Dimension::DayType => Some(&self.day_types),
            Dimension::Category => Some(&self.categories),
            Dimension::Year => None,
        }
    }

    /// Mutable access to the label set for a categorical dimension.
    pub fn selection_mut(&mut self, dim: Dimension) -> Option<&mut BTreeSet<String>> {
        match dim {
            Dimension::Season => Some(&mut self.seasons),
            Dimension::DayType => Some(&mut self.day_types),
            Dimension::Category => Some(&mut self.categories),
            Dimension::Year => None,
        }
    }

    /// The criteria as independent predicates.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut out = Vec::new();
        for (dim, set) in [
            (Dimension::Season, &self.seasons),
            (Dimension::DayType, &self.day_types),
            (Dimension::Category, &self.categories),
        ] {
            if !set.is_empty() {
                out.push(Predicate::Member(dim, set.clone()));
            }
        }
        if let Some((start, end)) = self.time_range.as_ref().and_then(TimeRange::resolve) {
            out.push(Predicate::Between(start, end));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// A single row test. Predicates are pure, so any application order gives
/// the same result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The record's label along the dimension is in the set.
    Member(Dimension, BTreeSet<String>),
    /// `start <= timestamp <= end`.
    Between(NaiveDateTime, NaiveDateTime),
}

impl Predicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Member(dim, set) => set.contains(dim.label(record).as_ref()),
            Predicate::Between(start, end) => *start <= record.timestamp && record.timestamp <= *end,
        }
    }
}

/// Apply predicates one after another, each producing a new dataset.
pub fn apply_predicates(dataset: &Dataset, predicates: &[Predicate]) -> Dataset {
    let mut current = dataset.clone();
    for predicate in predicates {
        let kept = current
            .records()
            .iter()
            .filter(|r| predicate.matches(r))
            .cloned()
            .collect();
        current = Dataset::from_sorted(kept);
    }
    current
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// Return indices of records that pass every active filter.
pub fn filtered_indices(dataset: &Dataset, criteria: &FilterCriteria) -> Vec<usize> {
    let predicates = criteria.predicates();
    dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| predicates.iter().all(|p| p.matches(r)))
        .map(|(i, _)| i)
        .collect()
}

/// A new dataset holding the records that pass every active filter.
///
/// The input is not modified. Timestamp order is preserved.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> Dataset {
    if criteria.is_empty() {
        return dataset.clone();
    }
    let records = dataset.records();
    let kept = filtered_indices(dataset, criteria)
        .into_iter()
        .map(|i| records[i].clone())
        .collect();
    Dataset::from_sorted(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::*;

    fn set(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn criteria_grid() -> Vec<FilterCriteria> {
        let range = TimeRange::new(ts(2013, 3, 2, 5), ts(2014, 1, 11, 9));
        vec![
            FilterCriteria::default(),
            FilterCriteria {
                seasons: set(&["Musim Dingin"]),
                ..Default::default()
            },
            FilterCriteria {
                seasons: set(&["Musim Dingin", "Musim Gugur"]),
                day_types: set(&["Weekend"]),
                ..Default::default()
            },
            FilterCriteria {
                categories: set(&["Sedang", "Baik"]),
                time_range: Some(range),
                ..Default::default()
            },
            FilterCriteria {
                seasons: set(&["Musim Semi", "Musim Dingin"]),
                day_types: set(&["Weekday", "Weekend"]),
                categories: set(&["Baik", "Berbahaya"]),
                time_range: Some(range),
            },
        ]
    }

    #[test]
    fn empty_criteria_returns_full_dataset() {
        let ds = sample();
        assert_eq!(filter(&ds, &FilterCriteria::default()), ds);
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = sample();
        for criteria in criteria_grid() {
            let once = filter(&ds, &criteria);
            let twice = filter(&once, &criteria);
            assert_eq!(once, twice, "criteria: {criteria:?}");
        }
    }

    /// Every ordering of `items`.
    fn permutations(items: &[Predicate]) -> Vec<Vec<Predicate>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head.clone());
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn predicate_order_does_not_matter() {
        let ds = sample();
        for criteria in criteria_grid() {
            let predicates = criteria.predicates();
            let expected = filter(&ds, &criteria);
            for order in permutations(&predicates) {
                assert_eq!(apply_predicates(&ds, &order), expected, "order: {order:?}");
            }
        }
    }

    #[test]
    fn all_four_predicates_in_every_order() {
        let ds = sample();
        let criteria = criteria_grid().pop().unwrap();
        let predicates = criteria.predicates();
        assert_eq!(predicates.len(), 4);

        let orders = permutations(&predicates);
        assert_eq!(orders.len(), 24);
        let expected = filter(&ds, &criteria);
        assert!(orders
            .iter()
            .all(|order| apply_predicates(&ds, order) == expected));
    }

    #[test]
    fn time_range_is_inclusive_on_both_ends() {
        let ds = sample();
        let criteria = FilterCriteria {
            time_range: Some(TimeRange::new(ts(2013, 3, 2, 5), ts(2013, 12, 7, 23))),
            ..Default::default()
        };
        let kept: Vec<_> = filter(&ds, &criteria)
            .records()
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(
            kept,
            vec![ts(2013, 3, 2, 5), ts(2013, 7, 1, 12), ts(2013, 12, 7, 23)]
        );
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Hourly records for 2013-03-01 through 2013-03-03.
    fn three_days() -> Dataset {
        let records = (1..=3)
            .flat_map(|d| (0..24).map(move |h| (d, h)))
            .map(|(d, h)| {
                let at = ts(2013, 3, d, h);
                record(at, Some(f64::from(h)), "Musim Semi", "Weekday", "Baik")
            })
            .collect();
        Dataset::from_records(records)
    }

    #[test]
    fn same_start_and_end_date_keeps_only_midnight() {
        let ds = three_days();
        let criteria = FilterCriteria {
            time_range: Some(TimeRange::from_dates(day(2013, 3, 2), day(2013, 3, 2))),
            ..Default::default()
        };
        let kept: Vec<_> = filter(&ds, &criteria)
            .records()
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(kept, vec![ts(2013, 3, 2, 0)]);
    }

    #[test]
    fn date_range_ends_at_midnight_of_the_end_date() {
        let ds = three_days();
        assert_eq!(ds.len(), 72);
        let criteria = FilterCriteria {
            time_range: Some(TimeRange::from_dates(day(2013, 3, 1), day(2013, 3, 2))),
            ..Default::default()
        };
        let out = filter(&ds, &criteria);
        assert_eq!(out.len(), 25);
        assert_eq!(out.time_span(), Some((ts(2013, 3, 1, 0), ts(2013, 3, 2, 0))));
    }

    #[test]
    fn single_bound_falls_back_to_full_range() {
        let ds = sample();
        let criteria = FilterCriteria {
            time_range: Some(TimeRange::single(ts(2014, 1, 1, 0))),
            ..Default::default()
        };
        assert_eq!(filter(&ds, &criteria).len(), ds.len());
    }

    #[test]
    fn inverted_range_falls_back_to_full_range() {
        let ds = sample();
        let range = TimeRange::new(ts(2014, 1, 1, 0), ts(2013, 1, 1, 0));
        assert!(matches!(
            range.validate(),
            Err(FilterInputError::Inverted { .. })
        ));
        let criteria = FilterCriteria {
            time_range: Some(range),
            ..Default::default()
        };
        assert_eq!(filter(&ds, &criteria).len(), ds.len());
    }

    #[test]
    fn dimensions_combine_with_and() {
        let ds = sample();
        let criteria = FilterCriteria {
            seasons: set(&["Musim Dingin"]),
            day_types: set(&["Weekend"]),
            ..Default::default()
        };
        let out = filter(&ds, &criteria);
        assert_eq!(out.len(), 2);
        assert!(out
            .records()
            .iter()
            .all(|r| r.season == "Musim Dingin" && r.day_type == "Weekend"));
    }

    #[test]
    fn input_is_not_modified() {
        let ds = sample();
        let before = ds.clone();
        let criteria = FilterCriteria {
            categories: set(&["Berbahaya"]),
            ..Default::default()
        };
        assert_eq!(filter(&ds, &criteria).len(), 1);
        assert_eq!(ds, before);
    }

    #[test]
    fn indices_match_filtered_records() {
        let ds = sample();
        let criteria = FilterCriteria {
            day_types: set(&["Weekday"]),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&ds, &criteria), vec![0, 2, 4, 6]);
    }
}
