use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoint,
    PlotPoints, Points, Polygon, Text,
};

use crate::color::{annotation_color, heat_color, ColorMap};
use crate::data::aggregate::{BoxSummary, GroupedMeans, PivotTable};

const CHART_HEIGHT: f32 = 320.0;
const HEATMAP_HEIGHT: f32 = 420.0;

/// Title and axis text shared by every chart kind.
pub struct ChartLabels<'a> {
    pub title: &'a str,
    pub x: &'a str,
    pub y: &'a str,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Axis formatter that prints `labels[i]` at integer position `i`.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let v = mark.value;
        if v < -0.5 || (v - v.round()).abs() > 1e-6 {
            return String::new();
        }
        labels.get(v.round() as usize).cloned().unwrap_or_default()
    }
}

fn title(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).strong().size(15.0));
}

fn no_data(ui: &mut Ui) {
    ui.add_space(8.0);
    ui.label(RichText::new("No data for the current filters.").italics().color(Color32::GRAY));
    ui.add_space(8.0);
}

// ---------------------------------------------------------------------------
// Bar chart
// ---------------------------------------------------------------------------

/// One bar per group of a single-key mean, coloured by its label.
pub fn bar_chart(
    ui: &mut Ui,
    id: &str,
    means: &GroupedMeans,
    colors: &ColorMap,
    labels: &ChartLabels,
) {
    title(ui, labels.title);
    let rows: Vec<_> = means.rows.iter().filter(|r| r.mean.is_some()).collect();
    if rows.is_empty() {
        no_data(ui);
        return;
    }

    let names: Vec<String> = rows.iter().map(|r| r.key.join(" - ")).collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(labels.x)
        .y_axis_label(labels.y)
        .x_axis_formatter(category_axis(names.clone()))
        .include_y(0.0)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, (row, name)) in rows.iter().zip(&names).enumerate() {
                let value = row.mean.unwrap_or_default();
                let bar = Bar::new(i as f64, value).width(0.6).name(name);
                plot_ui.bar_chart(
                    BarChart::new(vec![bar])
                        .name(name)
                        .color(colors.color_for(name)),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Clustered bar chart
// ---------------------------------------------------------------------------

/// Groups along the x axis are the table's columns; each row is one series
/// drawn side by side within every group. Empty cells leave a gap.
pub fn clustered_bar_chart(
    ui: &mut Ui,
    id: &str,
    table: &PivotTable,
    colors: &ColorMap,
    labels: &ChartLabels,
) {
    title(ui, labels.title);
    if table.is_empty() {
        no_data(ui);
        return;
    }

    let n_series = table.row_labels.len();
    let slot = 0.8 / n_series as f64;

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(labels.x)
        .y_axis_label(labels.y)
        .x_axis_formatter(category_axis(table.col_labels.clone()))
        .include_y(0.0)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (s, series) in table.row_labels.iter().enumerate() {
                let offset = -0.4 + slot * (s as f64 + 0.5);
                let bars: Vec<Bar> = table.cells[s]
                    .iter()
                    .enumerate()
                    .filter_map(|(c, cell)| {
                        let value = (*cell)?;
                        Some(
                            Bar::new(c as f64 + offset, value)
                                .width(slot * 0.95)
                                .name(format!("{series} · {}", table.col_labels[c])),
                        )
                    })
                    .collect();
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(series)
                        .color(colors.color_for(series)),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Line chart
// ---------------------------------------------------------------------------

/// One line with markers per table row across the columns. A missing cell
/// breaks the line.
pub fn line_chart(
    ui: &mut Ui,
    id: &str,
    table: &PivotTable,
    colors: &ColorMap,
    labels: &ChartLabels,
) {
    title(ui, labels.title);
    if table.is_empty() {
        no_data(ui);
        return;
    }

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(labels.x)
        .y_axis_label(labels.y)
        .x_axis_formatter(category_axis(table.col_labels.clone()))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (r, series) in table.row_labels.iter().enumerate() {
                let color = colors.color_for(series);

                // Split into runs of consecutive present values.
                let mut runs: Vec<Vec<[f64; 2]>> = vec![Vec::new()];
                for (c, cell) in table.cells[r].iter().enumerate() {
                    match cell {
                        Some(v) => {
                            if let Some(run) = runs.last_mut() {
                                run.push([c as f64, *v]);
                            }
                        }
                        None => runs.push(Vec::new()),
                    }
                }

                for run in runs.into_iter().filter(|run| !run.is_empty()) {
                    plot_ui.line(
                        Line::new(PlotPoints::from(run.clone()))
                            .name(series)
                            .color(color)
                            .width(2.0),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from(run))
                            .name(series)
                            .color(color)
                            .radius(4.0),
                    );
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

pub fn box_plot(
    ui: &mut Ui,
    id: &str,
    summaries: &[BoxSummary],
    colors: &ColorMap,
    labels: &ChartLabels,
) {
    title(ui, labels.title);
    if summaries.is_empty() {
        no_data(ui);
        return;
    }

    let names: Vec<String> = summaries.iter().map(|s| s.label.clone()).collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(labels.x)
        .y_axis_label(labels.y)
        .x_axis_formatter(category_axis(names.clone()))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, s) in summaries.iter().enumerate() {
                let color = colors.color_for(&s.label);
                let elem = BoxElem::new(
                    i as f64,
                    BoxSpread::new(s.lower_whisker, s.q1, s.median, s.q3, s.upper_whisker),
                )
                .name(format!("{} (n = {})", s.label, s.count))
                .box_width(0.5)
                .fill(color.gamma_multiply(0.3))
                .stroke(Stroke::new(1.5, color));
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&s.label));

                if !s.outliers.is_empty() {
                    let points: PlotPoints = s.outliers.iter().map(|&v| [i as f64, v]).collect();
                    plot_ui.points(
                        Points::new(points)
                            .name(&s.label)
                            .color(color.gamma_multiply(0.7))
                            .radius(2.0),
                    );
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

/// Coloured cells for every present value; blank cells are "no data".
/// Small tables also get the value printed in each cell.
pub fn heatmap(ui: &mut Ui, id: &str, table: &PivotTable, labels: &ChartLabels, unit: &str) {
    title(ui, labels.title);
    let Some((lo, hi)) = table.value_range() else {
        no_data(ui);
        return;
    };
    let span = if hi > lo { hi - lo } else { 1.0 };
    let threshold = table.overall_mean().unwrap_or(hi);
    let annotate = table.fits_annotations();

    let n_rows = table.row_labels.len();
    // First row at the top.
    let y_labels: Vec<String> = table.row_labels.iter().rev().cloned().collect();

    Plot::new(id)
        .height(HEATMAP_HEIGHT)
        .x_axis_label(labels.x)
        .y_axis_label(labels.y)
        .x_axis_formatter(category_axis(table.col_labels.clone()))
        .y_axis_formatter(category_axis(y_labels))
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (r, row) in table.cells.iter().enumerate() {
                let y = (n_rows - 1 - r) as f64;
                for (c, cell) in row.iter().enumerate() {
                    let Some(value) = *cell else { continue };
                    let x = c as f64;
                    let color = heat_color((value - lo) / span);
                    let square = vec![
                        [x - 0.5, y - 0.5],
                        [x + 0.5, y - 0.5],
                        [x + 0.5, y + 0.5],
                        [x - 0.5, y + 0.5],
                    ];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(square))
                            .fill_color(color)
                            .stroke(Stroke::new(1.0, Color32::WHITE)),
                    );
                    if annotate {
                        plot_ui.text(Text::new(
                            PlotPoint::new(x, y),
                            RichText::new(format!("{value:.1}"))
                                .color(annotation_color(value, threshold))
                                .size(12.0),
                        ));
                    }
                }
            }
        });

    color_bar(ui, lo, hi, unit);
}

/// Horizontal legend strip for the heatmap scale.
fn color_bar(ui: &mut Ui, lo: f64, hi: f64, unit: &str) {
    const STEPS: usize = 48;
    ui.horizontal(|ui| {
        ui.label(format!("{lo:.1}"));
        let (rect, _) = ui.allocate_exact_size(egui::vec2(240.0, 12.0), egui::Sense::hover());
        let step = rect.width() / STEPS as f32;
        for i in 0..STEPS {
            let cell = egui::Rect::from_min_size(
                rect.min + egui::vec2(i as f32 * step, 0.0),
                egui::vec2(step + 0.5, rect.height()),
            );
            ui.painter()
                .rect_filled(cell, 0.0, heat_color(i as f64 / (STEPS - 1) as f64));
        }
        ui.label(format!("{hi:.1}"));
        ui.label(RichText::new(unit).color(Color32::GRAY));
    });
}
