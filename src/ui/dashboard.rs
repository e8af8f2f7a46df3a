use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::config::Layout;
use crate::state::AppState;
use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the central panel for the active layout.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view requests  (File → Open…)");
        });
        return;
    }

    match state.layout {
        Layout::Full => full_dashboard(ui, state),
        Layout::DateOnly => date_only_dashboard(ui, state),
    }
}

fn metric_card(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(label);
        ui.label(RichText::new(value).size(28.0).strong());
    });
}

fn full_dashboard(ui: &mut Ui, state: &AppState) {
    ui.heading("📍 Boston 311 Service Request Dashboard");

    // ---- Top-level metrics ----
    let summary = &state.snapshot.summary;
    ui.columns(3, |cols| {
        metric_card(&mut cols[0], "Total Requests", summary.total_count.to_string());
        metric_card(&mut cols[1], "Resolved On Time (%)", summary.on_time_percent_label());
        metric_card(&mut cols[2], "Avg Resolution Time (hrs)", summary.avg_resolution_label());
    });
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Request Trends and Breakdown");
            ui.columns(2, |cols| {
                plot::reason_chart(&mut cols[0], state);
                plot::on_time_chart(&mut cols[1], state);
            });
            plot::time_histogram(ui, state);

            ui.add_space(8.0);
            ui.heading("Requests by Neighborhood");
            plot::neighborhood_chart(ui, state);

            ui.add_space(8.0);
            ui.heading("Filtered Data Table");
            if let Some(ds) = &state.dataset {
                egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
                    table::request_table(ui, ds, &state.snapshot.indices, false);
                });
            }
        });
}

fn date_only_dashboard(ui: &mut Ui, state: &AppState) {
    ui.heading("📅 Boston 311 Requests - Simple Date Filter");
    match state.dates {
        Some((start, end)) => ui.label(format!(
            "Showing {} requests between {start} and {end}",
            state.snapshot.indices.len()
        )),
        None => ui.label("The dataset has no requests."),
    };
    ui.separator();

    if let Some(ds) = &state.dataset {
        table::request_table(ui, ds, &state.snapshot.indices, true);
    }
}
