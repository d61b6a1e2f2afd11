use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::export::DEFAULT_EXPORT_NAME;
use crate::data::model::Dimension;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Filters");
        if state.dataset.is_some() && ui.button("🔄 Reset").clicked() {
            state.reset_filters();
        }
    });
    ui.separator();

    // Cheap Arc clone so the dataset can be read while the state is mutated.
    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Date range ----
            if let Some((min, max)) = dataset.date_bounds() {
                ui.strong("Order date");
                let current = state.filters.date_range();
                let mut start = current.map_or(min, |r| r.start);
                let mut end = current.map_or(max, |r| r.end);

                let mut changed = false;
                egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
                    ui.label("From");
                    changed |= ui
                        .add(DatePickerButton::new(&mut start).id_salt("date_from"))
                        .changed();
                    ui.end_row();
                    ui.label("To");
                    changed |= ui
                        .add(DatePickerButton::new(&mut end).id_salt("date_to"))
                        .changed();
                    ui.end_row();
                });
                if changed {
                    state.set_date_range(start, end);
                }
                if state.filters.date_range().is_some_and(|r| r.is_empty()) {
                    ui.label(RichText::new("Start is after end: no rows match.").color(Color32::YELLOW));
                }
                ui.separator();
            }

            // ---- Per-dimension multiselects (collapsible) ----
            for dim in Dimension::ALL {
                let Some(all_values) = dataset.options(dim) else {
                    continue;
                };

                let n_selected = state.filters.selection(dim).map_or(0, |s| s.len());
                let n_total = all_values.len();
                let header_text = if n_selected == 0 {
                    format!("{}  (all {n_total})", dim.label())
                } else {
                    format!("{}  ({n_selected}/{n_total})", dim.label())
                };

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(dim)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        if ui
                            .add_enabled(n_selected > 0, egui::Button::new("All").small())
                            .clicked()
                        {
                            state.select_all(dim);
                        }

                        let colors = state.color_maps.get(&dim).cloned();
                        for value in all_values {
                            let mut checked = state.filters.is_selected(dim, value);
                            let mut text = RichText::new(value);
                            if let Some(cm) = &colors {
                                text = text.color(cm.color_for(Some(value)));
                            }
                            if ui.checkbox(&mut checked, text).changed() {
                                state.toggle_filter_value(dim, value);
                            }
                        }
                    });
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
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.dataset.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("📥 Export filtered CSV…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} rows loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
            let active = state.filters.active_dimensions();
            if active > 0 {
                ui.label(RichText::new(format!("{active} filter(s) active")).weak());
            }
            if let Some(src) = &state.source {
                ui.separator();
                ui.label(RichText::new(src.display().to_string()).weak());
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "parquet", "pq", "json"])
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered data")
        .set_file_name(DEFAULT_EXPORT_NAME)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        match state.export_to(&path) {
            Ok(rows) => {
                state.status_message = None;
                log::info!("Exported {rows} rows");
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
