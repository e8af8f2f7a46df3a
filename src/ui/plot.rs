use chrono::{DateTime, NaiveDateTime};
use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot};

use crate::color::ColorMap;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Category charts
// ---------------------------------------------------------------------------

/// One bar per category, labelled on the x axis.
fn category_chart(
    ui: &mut Ui,
    id: &str,
    y_label: &str,
    counts: &[(String, usize)],
    colors: Option<&ColorMap>,
) {
    let labels: Vec<String> = counts.iter().map(|(label, _)| label.clone()).collect();
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (label, n))| {
            let color = colors.map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(label));
            Bar::new(i as f64, *n as f64)
                .name(label)
                .width(0.8)
                .fill(color)
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .y_axis_label(y_label)
        .x_axis_formatter(move |mark: GridMark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

/// "Requests by Reason" – one coloured bar per reason.
pub fn reason_chart(ui: &mut Ui, state: &AppState) {
    ui.strong("Requests by Reason");
    category_chart(
        ui,
        "by_reason",
        "count",
        &state.snapshot.by_reason,
        Some(&state.reason_colors),
    );
}

/// "On Time vs Late" – request count per `on_time` flag.
pub fn on_time_chart(ui: &mut Ui, state: &AppState) {
    ui.strong("On Time vs Late");
    category_chart(
        ui,
        "by_on_time",
        "count",
        &state.snapshot.by_on_time,
        Some(&state.on_time_colors),
    );
}

/// "Request Volume by Neighborhood", largest first.
pub fn neighborhood_chart(ui: &mut Ui, state: &AppState) {
    ui.strong("Request Volume by Neighborhood");
    category_chart(
        ui,
        "by_neighborhood",
        "Number of Requests",
        &state.snapshot.by_neighborhood,
        None,
    );
}

// ---------------------------------------------------------------------------
// Requests over time
// ---------------------------------------------------------------------------

/// Plot x coordinate for a timestamp: days since the Unix epoch.
fn to_plot_x(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64 / SECONDS_PER_DAY
}

fn format_plot_x(x: f64) -> String {
    DateTime::from_timestamp((x * SECONDS_PER_DAY) as i64, 0)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_default()
}

/// "Requests Over Time" – histogram of open dates.
pub fn time_histogram(ui: &mut Ui, state: &AppState) {
    ui.strong("Requests Over Time");

    let bars: Vec<Bar> = state
        .snapshot
        .histogram
        .iter()
        .map(|bin| {
            let start = to_plot_x(bin.start);
            let end = to_plot_x(bin.end);
            // Zero-width span (single instant) still gets a visible bar.
            let width = (end - start).max(1.0 / 24.0);
            Bar::new(start + width / 2.0, bin.count as f64)
                .width(width)
                .name(format!("{} – {}", bin.start, bin.end))
        })
        .collect();

    Plot::new("over_time")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("open_dt")
        .y_axis_label("count")
        .x_axis_formatter(|mark: GridMark, _range| format_plot_x(mark.value))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .color(Color32::LIGHT_BLUE)
                    .name("requests"),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn plot_x_round_trips_to_calendar_date() {
        let ts = NaiveDate::from_ymd_opt(2023, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(format_plot_x(to_plot_x(ts)), "2023-01-05");
        assert_eq!(format_plot_x(to_plot_x(ts) + 0.5), "2023-01-05");
    }
}
