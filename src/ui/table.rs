use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Dataset;

const ROW_HEIGHT: f32 = 18.0;
const HEADERS: [&str; 6] = ["Timestamp", "Year", "PM2.5 (µg/m³)", "Season", "Day type", "Category"];

/// Scrollable view of the filtered records. Rows are laid out lazily, so
/// the full dataset can be shown.
pub fn records_table(ui: &mut Ui, dataset: &Dataset) {
    ui.label(RichText::new(format!("{} records", dataset.len())).strong());
    let records = dataset.records();

    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(320.0)
        .column(Column::auto().at_least(130.0))
        .columns(Column::auto().at_least(60.0), HEADERS.len() - 1)
        .header(20.0, |mut header| {
            for name in HEADERS {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, records.len(), |mut row| {
                let r = &records[row.index()];
                row.col(|ui| {
                    ui.label(r.timestamp.format("%Y-%m-%d %H:%M").to_string());
                });
                row.col(|ui| {
                    ui.label(r.year.to_string());
                });
                row.col(|ui| {
                    ui.label(r.pm25.map(|v| format!("{v:.1}")).unwrap_or_else(|| "–".into()));
                });
                row.col(|ui| {
                    ui.label(r.season.as_str());
                });
                row.col(|ui| {
                    ui.label(r.day_type.as_str());
                });
                row.col(|ui| {
                    ui.label(r.category.as_str());
                });
            });
        });
}
