use std::sync::Arc;

use chrono::NaiveDate;

use crate::color::DimensionColors;
use crate::config::DashboardConfig;
use crate::data::filter::{filter, FilterCriteria, TimeRange};
use crate::data::model::{Dataset, Dimension};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The four analysis views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Season,
    DayType,
    SeasonAndDayType,
    Category,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Season, Tab::DayType, Tab::SeasonAndDayType, Tab::Category];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Season => "By Season",
            Tab::DayType => "By Day Type",
            Tab::SeasonAndDayType => "Season × Day Type",
            Tab::Category => "By Category",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Session dataset, shared read-only.
    pub dataset: Arc<Dataset>,

    pub config: DashboardConfig,

    /// Series colours, fixed for the session.
    pub colors: DimensionColors,

    /// Current filter selections.
    pub criteria: FilterCriteria,

    /// Records passing the current filters (cached until criteria change).
    pub filtered: Dataset,

    /// Date-picker state; only applied while `use_date_range` is set.
    pub use_date_range: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    pub tab: Tab,

    /// Show the filtered records as a table.
    pub show_table: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(dataset: Arc<Dataset>, config: DashboardConfig) -> Self {
        let (first, last) = dataset
            .time_span()
            .map(|(a, b)| (a.date(), b.date()))
            .unwrap_or_default();

        Self {
            filtered: (*dataset).clone(),
            colors: DimensionColors::new(&dataset),
            dataset,
            config,
            criteria: FilterCriteria::default(),
            use_date_range: false,
            start_date: first,
            end_date: last,
            tab: Tab::default(),
            show_table: false,
            status_message: None,
        }
    }

    /// Earliest and latest selectable dates.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.dataset.time_span().map(|(a, b)| (a.date(), b.date()))
    }

    /// Recompute `filtered` after a criteria change.
    pub fn refilter(&mut self) {
        self.filtered = filter(&self.dataset, &self.criteria);
        log::debug!(
            "{} of {} records pass {:?}",
            self.filtered.len(),
            self.dataset.len(),
            self.criteria
        );
    }

    /// Copy the date-picker state into the criteria and refilter.
    pub fn apply_date_range(&mut self) {
        self.criteria.time_range = self
            .use_date_range
            .then(|| TimeRange::from_dates(self.start_date, self.end_date));
        self.refilter();
    }

    /// Toggle a single label in a dimension's selection.
    pub fn toggle_filter_value(&mut self, dim: Dimension, label: &str) {
        if let Some(selected) = self.criteria.selection_mut(dim) {
            if !selected.remove(label) {
                selected.insert(label.to_string());
            }
            self.refilter();
        }
    }

    /// Drop the restriction on a dimension.
    pub fn clear_selection(&mut self, dim: Dimension) {
        if let Some(selected) = self.criteria.selection_mut(dim) {
            selected.clear();
            self.refilter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::sample;

    fn state() -> AppState {
        AppState::new(Arc::new(sample()), DashboardConfig::default())
    }

    #[test]
    fn starts_unfiltered_with_full_date_span() {
        let s = state();
        assert_eq!(s.filtered.len(), s.dataset.len());
        assert_eq!(s.start_date, NaiveDate::from_ymd_opt(2013, 3, 1).unwrap());
        assert_eq!(s.end_date, NaiveDate::from_ymd_opt(2014, 10, 4).unwrap());
    }

    #[test]
    fn toggling_a_label_twice_restores_everything() {
        let mut s = state();
        s.toggle_filter_value(Dimension::Season, "Musim Gugur");
        assert_eq!(s.filtered.len(), 2);
        s.toggle_filter_value(Dimension::Season, "Musim Gugur");
        assert!(s.criteria.is_empty());
        assert_eq!(s.filtered.len(), 8);
    }

    #[test]
    fn inverted_dates_fall_back_to_all_records() {
        let mut s = state();
        s.use_date_range = true;
        s.start_date = NaiveDate::from_ymd_opt(2014, 6, 1).unwrap();
        s.end_date = NaiveDate::from_ymd_opt(2013, 6, 1).unwrap();
        s.apply_date_range();
        assert_eq!(s.filtered.len(), 8);

        s.end_date = NaiveDate::from_ymd_opt(2014, 12, 31).unwrap();
        s.apply_date_range();
        assert_eq!(s.filtered.len(), 2);
    }

    #[test]
    fn series_colours_survive_filter_changes() {
        let mut s = state();
        let before = s.colors.get(Dimension::Season).color_for("Musim Gugur");
        s.toggle_filter_value(Dimension::Season, "Musim Gugur");
        s.toggle_filter_value(Dimension::Season, "Musim Semi");
        assert_eq!(s.filtered.len(), 4);
        assert_eq!(s.colors.get(Dimension::Season).color_for("Musim Gugur"), before);
    }

    #[test]
    fn clearing_a_selection_removes_the_restriction() {
        let mut s = state();
        s.toggle_filter_value(Dimension::DayType, "Weekend");
        assert_eq!(s.filtered.len(), 4);
        s.clear_selection(Dimension::DayType);
        assert_eq!(s.filtered.len(), 8);
    }
}
