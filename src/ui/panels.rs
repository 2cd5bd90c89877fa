use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::export::write_csv;
use crate::data::model::Dimension;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("PM2.5 Filters");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            date_range(ui, state);
            ui.separator();

            for dim in [Dimension::Season, Dimension::DayType, Dimension::Category] {
                multi_select(ui, state, dim);
            }

            ui.separator();
            ui.checkbox(&mut state.show_table, "Show filtered data");
        });
}

fn date_range(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Time range");
    let Some((min, max)) = state.date_bounds() else {
        ui.label("No records.");
        return;
    };

    let mut changed = ui
        .checkbox(&mut state.use_date_range, "Limit to dates")
        .changed();

    ui.add_enabled_ui(state.use_date_range, |ui: &mut Ui| {
        egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
            ui.label("From");
            changed |= ui
                .add(DatePickerButton::new(&mut state.start_date).id_salt("range_start"))
                .changed();
            ui.end_row();

            ui.label("To");
            changed |= ui
                .add(DatePickerButton::new(&mut state.end_date).id_salt("range_end"))
                .changed();
            ui.end_row();
        });
    });

    if changed {
        state.start_date = state.start_date.clamp(min, max);
        state.end_date = state.end_date.clamp(min, max);
        state.apply_date_range();
    }
    if state.use_date_range && state.start_date > state.end_date {
        ui.label(
            RichText::new("Start is after end; showing the full range.")
                .small()
                .color(Color32::YELLOW),
        );
    }
    ui.label(RichText::new(format!("Data covers {min} to {max}")).small().weak());
}

/// Checkbox list for one categorical dimension. No label ticked means no
/// restriction.
fn multi_select(ui: &mut Ui, state: &mut AppState, dim: Dimension) {
    let all_values = state.dataset.labels(dim);
    let n_selected = state.criteria.selection(dim).map_or(0, |s| s.len());
    let header_text = if n_selected == 0 {
        format!("{dim}  (all)")
    } else {
        format!("{dim}  ({n_selected}/{})", all_values.len())
    };

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(dim)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("Clear").clicked() {
                state.clear_selection(dim);
            }

            for label in &all_values {
                let mut checked = state
                    .criteria
                    .selection(dim)
                    .is_some_and(|s| s.contains(label));
                let text = if label.is_empty() { "(blank)" } else { label.as_str() };
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_filter_value(dim, label);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Export filtered CSV…").clicked() {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} records loaded, {} after filters",
            state.dataset.len(),
            state.filtered.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered data")
        .add_filter("CSV", &["csv"])
        .set_file_name("pm25_filtered.csv")
        .save_file();

    if let Some(path) = file {
        match write_csv(&state.filtered, &path, &state.config.columns) {
            Ok(()) => {
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
