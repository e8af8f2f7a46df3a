use bos311_dashboard::data::model::{Dataset, ServiceRequest};
use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

const ROW_HEIGHT: f32 = 18.0;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A column of the raw-data table.
struct TableColumn {
    header: &'static str,
    cell: fn(&ServiceRequest) -> String,
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

static SUMMARY_COLUMNS: [TableColumn; 6] = [
    TableColumn { header: "case_enquiry_id", cell: |r| r.case_enquiry_id.clone() },
    TableColumn { header: "open_dt", cell: |r| r.open_dt.format(TIMESTAMP_FORMAT).to_string() },
    TableColumn {
        header: "closed_dt",
        cell: |r| {
            r.closed_dt
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default()
        },
    },
    TableColumn { header: "case_status", cell: |r| r.case_status.clone() },
    TableColumn { header: "reason", cell: |r| r.reason.clone() },
    TableColumn { header: "neighborhood", cell: |r| opt(r.neighborhood.as_deref()) },
];

static ON_TIME_COLUMN: TableColumn = TableColumn {
    header: "on_time",
    cell: |r| opt(r.on_time.as_deref()),
};

/// Render the visible rows.  `all_columns` adds the `on_time` flag.
pub fn request_table(ui: &mut Ui, dataset: &Dataset, indices: &[usize], all_columns: bool) {
    let mut columns: Vec<&TableColumn> = SUMMARY_COLUMNS.iter().collect();
    if all_columns {
        columns.push(&ON_TIME_COLUMN);
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .columns(Column::auto().at_least(80.0), columns.len())
        .header(ROW_HEIGHT + 2.0, |mut header| {
            for col in &columns {
                header.col(|ui| {
                    ui.strong(col.header);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, indices.len(), |mut row| {
                let Some(req) = indices
                    .get(row.index())
                    .and_then(|&i| dataset.requests.get(i))
                else {
                    return;
                };
                for col in &columns {
                    row.col(|ui| {
                        ui.label((col.cell)(req));
                    });
                }
            });
        });
}
