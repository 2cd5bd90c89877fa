use eframe::egui::{self, RichText, Ui};

use super::charts::{self, ChartLabels};
use crate::data::aggregate::{
    distribution_by, mean_by, percent_distribution_by_year, shares_pivot, AggregateError,
    PivotTable,
};
use crate::data::model::Dimension;
use crate::state::{AppState, Tab};

const PM25_AXIS: &str = "PM2.5 concentration (µg/m³)";

// ---------------------------------------------------------------------------
// Tab strip + dispatch
// ---------------------------------------------------------------------------

pub fn tab_strip(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for tab in Tab::ALL {
            ui.selectable_value(&mut state.tab, tab, tab.title());
        }
    });
}

/// Render the selected analysis view from the filtered records.
/// All aggregates are rebuilt on every call.
pub fn show(ui: &mut Ui, state: &AppState) {
    match state.tab {
        Tab::Season => season_tab(ui, state),
        Tab::DayType => day_type_tab(ui, state),
        Tab::SeasonAndDayType => combined_tab(ui, state),
        Tab::Category => category_tab(ui, state),
    }
}

/// Collapsible section, like an expander.
fn section(ui: &mut Ui, heading: &str, open: bool, add_contents: impl FnOnce(&mut Ui)) {
    egui::CollapsingHeader::new(heading)
        .default_open(open)
        .show(ui, add_contents);
}

/// Draw `draw` with the aggregate, or log the failure and leave the
/// section empty.
fn with_result<T>(ui: &mut Ui, result: Result<T, AggregateError>, draw: impl FnOnce(&mut Ui, T)) {
    match result {
        Ok(value) => draw(ui, value),
        Err(e) => {
            log::error!("aggregation failed: {e}");
            ui.label(RichText::new(format!("Could not aggregate: {e}")).weak());
        }
    }
}

/// Mean PM2.5 with `row` labels as rows and years as columns.
fn by_year(state: &AppState, row: Dimension) -> Result<PivotTable, AggregateError> {
    mean_by(&state.filtered, &[Dimension::Year, row])?.pivot(&[row], Dimension::Year)
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

fn season_tab(ui: &mut Ui, state: &AppState) {
    ui.heading("PM2.5 by season");
    let data = &state.filtered;

    section(ui, "Bar chart: mean PM2.5 per season", true, |ui| {
        with_result(ui, mean_by(data, &[Dimension::Season]), |ui, means| {
            charts::bar_chart(
                ui,
                "season_bar",
                &means,
                state.colors.get(Dimension::Season),
                &ChartLabels {
                    title: "Mean PM2.5 concentration by season",
                    x: "Season",
                    y: PM25_AXIS,
                },
            );
        });
    });

    section(ui, "Clustered bar chart: season and year", false, |ui| {
        with_result(ui, by_year(state, Dimension::Season), |ui, mut table| {
            table.reorder_rows(&state.config.season_order);
            charts::clustered_bar_chart(
                ui,
                "season_year_bars",
                &table,
                state.colors.get(Dimension::Season),
                &ChartLabels {
                    title: "Mean PM2.5 per season and year",
                    x: "Year",
                    y: PM25_AXIS,
                },
            );
        });
    });

    section(ui, "Heatmap: season and year", false, |ui| {
        with_result(ui, by_year(state, Dimension::Season), |ui, table| {
            charts::heatmap(
                ui,
                "season_year_heat",
                &table,
                &ChartLabels {
                    title: "PM2.5 concentration per season and year",
                    x: "Year",
                    y: "Season",
                },
                "µg/m³",
            );
        });
    });

    section(ui, "Line chart: seasonal trend", false, |ui| {
        with_result(ui, by_year(state, Dimension::Season), |ui, table| {
            charts::line_chart(
                ui,
                "season_year_line",
                &table,
                state.colors.get(Dimension::Season),
                &ChartLabels {
                    title: "PM2.5 trend by season and year",
                    x: "Year",
                    y: PM25_AXIS,
                },
            );
        });
    });

    section(ui, "Box plot: distribution per season", false, |ui| {
        charts::box_plot(
            ui,
            "season_box",
            &distribution_by(data, Dimension::Season),
            state.colors.get(Dimension::Season),
            &ChartLabels {
                title: "PM2.5 distribution by season",
                x: "Season",
                y: PM25_AXIS,
            },
        );
    });
}

fn day_type_tab(ui: &mut Ui, state: &AppState) {
    ui.heading("PM2.5 by day type");
    let data = &state.filtered;

    section(ui, "Bar chart: weekday vs weekend", true, |ui| {
        with_result(ui, mean_by(data, &[Dimension::DayType]), |ui, means| {
            charts::bar_chart(
                ui,
                "day_type_bar",
                &means,
                state.colors.get(Dimension::DayType),
                &ChartLabels {
                    title: "Mean PM2.5 concentration on weekdays and weekends",
                    x: "Day type",
                    y: PM25_AXIS,
                },
            );
        });
    });

    section(ui, "Heatmap: day type and year", false, |ui| {
        with_result(ui, by_year(state, Dimension::DayType), |ui, table| {
            charts::heatmap(
                ui,
                "day_type_year_heat",
                &table,
                &ChartLabels {
                    title: "PM2.5 concentration per day type and year",
                    x: "Year",
                    y: "Day type",
                },
                "µg/m³",
            );
        });
    });

    section(ui, "Line chart: day type trend", false, |ui| {
        with_result(ui, by_year(state, Dimension::DayType), |ui, table| {
            charts::line_chart(
                ui,
                "day_type_year_line",
                &table,
                state.colors.get(Dimension::DayType),
                &ChartLabels {
                    title: "PM2.5 per day type and year",
                    x: "Year",
                    y: PM25_AXIS,
                },
            );
        });
    });

    section(ui, "Box plot: distribution per day type", false, |ui| {
        charts::box_plot(
            ui,
            "day_type_box",
            &distribution_by(data, Dimension::DayType),
            state.colors.get(Dimension::DayType),
            &ChartLabels {
                title: "PM2.5 distribution by day type",
                x: "Day type",
                y: PM25_AXIS,
            },
        );
    });
}

fn combined_tab(ui: &mut Ui, state: &AppState) {
    ui.heading("Season and day type combined");
    let data = &state.filtered;

    section(ui, "Clustered bar chart: season × day type", true, |ui| {
        let table = mean_by(data, &[Dimension::Season, Dimension::DayType])
            .and_then(|m| m.pivot(&[Dimension::DayType], Dimension::Season));
        with_result(ui, table, |ui, mut table| {
            table.reorder_cols(&state.config.season_order);
            charts::clustered_bar_chart(
                ui,
                "season_day_type_bars",
                &table,
                state.colors.get(Dimension::DayType),
                &ChartLabels {
                    title: "Mean PM2.5 per season (weekday vs weekend)",
                    x: "Season",
                    y: PM25_AXIS,
                },
            );
        });
    });

    section(ui, "Heatmap: season × day type and year", false, |ui| {
        let table = mean_by(data, &[Dimension::Season, Dimension::DayType, Dimension::Year])
            .and_then(|m| m.pivot(&[Dimension::Season, Dimension::DayType], Dimension::Year));
        with_result(ui, table, |ui, table| {
            charts::heatmap(
                ui,
                "season_day_type_heat",
                &table,
                &ChartLabels {
                    title: "PM2.5 concentration per season, day type and year",
                    x: "Year",
                    y: "Season - day type",
                },
                "µg/m³",
            );
        });
    });
}

fn category_tab(ui: &mut Ui, state: &AppState) {
    ui.heading("PM2.5 category distribution");

    section(ui, "About the categories", false, |ui| {
        ui.label("Fine particulate (PM2.5) concentration bands:");
        for line in [
            "Baik (good): 0 – 15.5 µg/m³",
            "Sedang (moderate): 15.6 – 55.4 µg/m³",
            "Tidak Sehat (unhealthy): 55.5 – 150.4 µg/m³",
            "Sangat Tidak Sehat (very unhealthy): 150.5 – 250.4 µg/m³",
            "Berbahaya (hazardous): above 250.5 µg/m³",
        ] {
            ui.label(format!("• {line}"));
        }
        ui.hyperlink_to("Source: BMKG", "https://www.bmkg.go.id/kualitas-udara/pm25");
    });

    section(ui, "Heatmap: category share per year", true, |ui| {
        let order = &state.config.category_order;
        let shares = percent_distribution_by_year(&state.filtered, order);
        charts::heatmap(
            ui,
            "category_year_heat",
            &shares_pivot(&shares, order),
            &ChartLabels {
                title: "Share of PM2.5 categories per year",
                x: "Year",
                y: "Category",
            },
            "%",
        );
    });
}
