use std::ops::RangeInclusive;

use bos311_dashboard::data::model::Dimension;
use chrono::{Days, NaiveDate};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::config::Layout;
use crate::state::{AppState, FILTER_DIMENSIONS};

/// Sidebar label for null cells.
const NULL_LABEL: &str = "(none)";

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.heading("Filters");
        ui.separator();
        ui.label("No dataset loaded.");
        return;
    }

    match state.layout {
        Layout::Full => full_filters(ui, state),
        Layout::DateOnly => date_slider(ui, state),
    }
}

fn full_filters(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Requests");
    ui.separator();

    // ---- Open date range ----
    ui.strong("Open Date Range");
    let Some((mut start, mut end)) = state.dates else {
        ui.label("Dataset is empty.");
        return;
    };
    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        changed |= ui
            .add(DatePickerButton::new(&mut start).id_salt("open_start"))
            .changed();
        ui.label("–");
        changed |= ui
            .add(DatePickerButton::new(&mut end).id_salt("open_end"))
            .changed();
    });
    if changed {
        state.set_date_range(start, end);
    }
    ui.separator();

    let Some(dataset) = &state.dataset else {
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let lists: Vec<(Dimension, Vec<String>, bool)> = FILTER_DIMENSIONS
        .into_iter()
        .map(|dim| {
            let values = dataset.values(dim).map(str::to_string).collect();
            (dim, values, dataset.has_nulls.contains(&dim))
        })
        .collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (dim, values, has_nulls) in &lists {
                category_list(ui, state, *dim, values, *has_nulls);
            }
        });
}

/// Collapsible multi-select for one dimension.
fn category_list(
    ui: &mut Ui,
    state: &mut AppState,
    dim: Dimension,
    values: &[String],
    has_nulls: bool,
) {
    let n_selected = state.selections.get(&dim).map_or(0, |s| s.len());
    let n_total = values.len() + usize::from(has_nulls);
    let header_text = format!("{}  ({n_selected}/{n_total})", dim.label());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(dim.column_name())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(dim);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(dim);
                }
            });

            for value in values {
                let mut checked = state
                    .selections
                    .get(&dim)
                    .is_some_and(|s| s.values.contains(value));
                let mut text = RichText::new(value);
                if dim == Dimension::Reason {
                    text = text.color(state.reason_colors.color_for(value));
                }
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_value(dim, value);
                }
            }

            if has_nulls {
                let mut checked = state
                    .selections
                    .get(&dim)
                    .is_some_and(|s| s.include_null);
                if ui
                    .checkbox(&mut checked, RichText::new(NULL_LABEL).italics())
                    .changed()
                {
                    state.toggle_null(dim);
                }
            }
        });
}

/// Start/end sliders bounded by the dataset's open dates.
fn date_slider(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter by Date");
    ui.separator();

    let bounds = state.dataset.as_ref().and_then(|ds| ds.date_bounds());
    let Some((min_date, max_date)) = bounds else {
        ui.label("Dataset is empty.");
        return;
    };
    let max_offset = (max_date - min_date).num_days();
    let offset = |d: NaiveDate| (d - min_date).num_days().clamp(0, max_offset);
    let to_date = move |days: i64| {
        min_date
            .checked_add_days(Days::new(days.max(0) as u64))
            .unwrap_or(max_date)
    };

    let (current_start, current_end) = state.dates.unwrap_or((min_date, max_date));
    let mut start = offset(current_start);
    let mut end = offset(current_end);

    ui.label("Select date range:");
    let fmt = move |v: f64, _: RangeInclusive<usize>| to_date(v as i64).to_string();
    let start_changed = ui
        .add(
            egui::Slider::new(&mut start, 0..=max_offset)
                .text("from")
                .custom_formatter(fmt),
        )
        .changed();
    let end_changed = ui
        .add(
            egui::Slider::new(&mut end, 0..=max_offset)
                .text("to")
                .custom_formatter(fmt),
        )
        .changed();

    if start_changed || end_changed {
        // Keep the handles ordered like a two-ended range slider.
        if start_changed && start > end {
            end = start;
        } else if end_changed && end < start {
            start = end;
        }
        state.set_date_range(to_date(start), to_date(end));
    }
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
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} requests loaded, {} visible",
                ds.len(),
                state.snapshot.indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open 311 service requests")
        .add_filter("Supported files", &["csv", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match bos311_dashboard::data::loader::load_file(&path) {
            Ok(dataset) => state.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
