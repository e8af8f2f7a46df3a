use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value as JsonValue};

use super::error::DataLoadError;
use super::model::{Dataset, ServiceRequest};

type Result<T> = std::result::Result<T, DataLoadError>;

const CASE_ENQUIRY_ID: &str = "case_enquiry_id";
const OPEN_DT: &str = "open_dt";
const CLOSED_DT: &str = "closed_dt";
const CASE_STATUS: &str = "case_status";
const REASON: &str = "reason";
const NEIGHBORHOOD: &str = "neighborhood";
const ON_TIME: &str = "on_time";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a service-request dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – header row with the 311 column names (recommended)
/// * `.json` – `[{ "case_enquiry_id": ..., "open_dt": "...", ... }, ...]`
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        other => return Err(DataLoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} service requests from {}",
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Raw row → ServiceRequest
// ---------------------------------------------------------------------------

/// Text cells of one row, before type conversion.  Empty cells are `None`.
#[derive(Debug)]
struct RawRow<'a> {
    case_enquiry_id: Option<&'a str>,
    open_dt: Option<&'a str>,
    closed_dt: Option<&'a str>,
    case_status: Option<&'a str>,
    reason: Option<&'a str>,
    neighborhood: Option<&'a str>,
    on_time: Option<&'a str>,
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

impl RawRow<'_> {
    /// `row` is the 1-based data row, header excluded.
    fn into_request(self, row: usize) -> Result<ServiceRequest> {
        let required = |value: Option<&str>, column: &'static str| {
            value
                .map(str::to_string)
                .ok_or(DataLoadError::MissingValue { row, column })
        };

        let open_text = self.open_dt.ok_or(DataLoadError::InvalidTimestamp {
            row,
            column: OPEN_DT,
            value: String::new(),
        })?;
        let open_dt = parse_timestamp(open_text).ok_or_else(|| DataLoadError::InvalidTimestamp {
            row,
            column: OPEN_DT,
            value: open_text.to_string(),
        })?;

        let closed_dt = match self.closed_dt {
            Some(text) => Some(parse_timestamp(text).ok_or_else(|| {
                DataLoadError::InvalidTimestamp {
                    row,
                    column: CLOSED_DT,
                    value: text.to_string(),
                }
            })?),
            None => None,
        };

        Ok(ServiceRequest {
            case_enquiry_id: required(self.case_enquiry_id, CASE_ENQUIRY_ID)?,
            open_dt,
            closed_dt,
            case_status: required(self.case_status, CASE_STATUS)?,
            reason: required(self.reason, REASON)?,
            neighborhood: self.neighborhood.map(str::to_string),
            on_time: self.on_time.map(str::to_string),
        })
    }
}

/// Parse the timestamp layouts seen in 311 exports.
///
/// Offsets in RFC 3339 input are dropped; the wall-clock time is kept.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%m/%d/%Y %I:%M:%S %p",
    ];

    let s = s.trim();
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%#z") {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Column positions resolved from the CSV header.
struct CsvColumns {
    case_enquiry_id: usize,
    open_dt: usize,
    closed_dt: Option<usize>,
    case_status: usize,
    reason: usize,
    neighborhood: Option<usize>,
    on_time: Option<usize>,
}

impl CsvColumns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require =
            |name: &str| find(name).ok_or_else(|| DataLoadError::MissingColumn(name.to_string()));

        Ok(CsvColumns {
            case_enquiry_id: require(CASE_ENQUIRY_ID)?,
            open_dt: require(OPEN_DT)?,
            closed_dt: find(CLOSED_DT),
            case_status: require(CASE_STATUS)?,
            reason: require(REASON)?,
            neighborhood: find(NEIGHBORHOOD),
            on_time: find(ON_TIME),
        })
    }

    fn raw<'a>(&self, record: &'a csv::StringRecord) -> RawRow<'a> {
        let cell = |idx: usize| record.get(idx).and_then(non_empty);
        let optional = |idx: Option<usize>| idx.and_then(cell);
        RawRow {
            case_enquiry_id: cell(self.case_enquiry_id),
            open_dt: cell(self.open_dt),
            closed_dt: optional(self.closed_dt),
            case_status: cell(self.case_status),
            reason: cell(self.reason),
            neighborhood: optional(self.neighborhood),
            on_time: optional(self.on_time),
        }
    }
}

/// CSV layout: header row with column names, one request per line.
/// Columns beyond the ones the dashboards use are ignored.
fn load_csv(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file)
}

/// Read CSV from any reader.
pub fn read_csv<R: std::io::Read>(input: R) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(input);
    let columns = CsvColumns::resolve(reader.headers()?)?;

    let mut requests = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        requests.push(columns.raw(&record).into_request(row_no + 1)?);
    }

    Ok(Dataset::from_requests(requests))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "case_enquiry_id": 101004113,
///     "open_dt": "2023-01-01 00:04:00",
///     "closed_dt": null,
///     "case_status": "Open",
///     "reason": "Street Cleaning",
///     "neighborhood": "Dorchester",
///     "on_time": "ONTIME"
///   },
///   ...
/// ]
/// ```
///
/// Timestamps may be text or epoch milliseconds (pandas' default).
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_json(&text)
}

/// Parse records-oriented JSON text.
pub fn read_json(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root.as_array().ok_or(DataLoadError::NotAnArray)?;

    if let Some(first) = records.first().and_then(JsonValue::as_object) {
        for column in [CASE_ENQUIRY_ID, OPEN_DT, CASE_STATUS, REASON] {
            if !first.contains_key(column) {
                return Err(DataLoadError::MissingColumn(column.to_string()));
            }
        }
    }

    let mut requests = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let row = i + 1;
        let obj = rec.as_object().ok_or(DataLoadError::NotAnObject { row })?;
        let cells = JsonCells::from_object(obj);
        requests.push(cells.raw().into_request(row)?);
    }

    Ok(Dataset::from_requests(requests))
}

/// JSON cells rendered to text so they share the CSV conversion path.
struct JsonCells {
    case_enquiry_id: Option<String>,
    open_dt: Option<String>,
    closed_dt: Option<String>,
    case_status: Option<String>,
    reason: Option<String>,
    neighborhood: Option<String>,
    on_time: Option<String>,
}

impl JsonCells {
    fn from_object(obj: &Map<String, JsonValue>) -> Self {
        let text = |key: &str| obj.get(key).and_then(json_to_text);
        let timestamp = |key: &str| obj.get(key).and_then(json_to_timestamp_text);
        JsonCells {
            case_enquiry_id: text(CASE_ENQUIRY_ID),
            open_dt: timestamp(OPEN_DT),
            closed_dt: timestamp(CLOSED_DT),
            case_status: text(CASE_STATUS),
            reason: text(REASON),
            neighborhood: text(NEIGHBORHOOD),
            on_time: text(ON_TIME),
        }
    }

    fn raw(&self) -> RawRow<'_> {
        fn cell(v: &Option<String>) -> Option<&str> {
            v.as_deref().and_then(non_empty)
        }
        RawRow {
            case_enquiry_id: cell(&self.case_enquiry_id),
            open_dt: cell(&self.open_dt),
            closed_dt: cell(&self.closed_dt),
            case_status: cell(&self.case_status),
            reason: cell(&self.reason),
            neighborhood: cell(&self.neighborhood),
            on_time: cell(&self.on_time),
        }
    }
}

fn json_to_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Numbers in timestamp columns are epoch milliseconds, pandas' default
/// `date_format` for records-oriented JSON.  Out-of-range numbers keep their
/// raw text so they surface as an unparseable timestamp.
fn json_to_timestamp_text(val: &JsonValue) -> Option<String> {
    let JsonValue::Number(n) = val else {
        return json_to_text(val);
    };
    let parsed = n
        .as_i64()
        .or_else(|| n.as_f64().map(|f| f.round() as i64))
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    Some(parsed.unwrap_or_else(|| n.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::model::Dimension;

    const SAMPLE_CSV: &str = "\
case_enquiry_id,open_dt,closed_dt,case_status,reason,neighborhood,on_time,source
101004113,2023-01-01 00:04:00,2023-01-02 00:04:00,Closed,Trash,Dorchester,ONTIME,Citizens Connect App
101004114,2023-01-05 13:30:00,,Open,Pothole,,OVERDUE,Constituent Call
";

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn reads_csv_rows_with_nulls() {
        let ds = read_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);

        let first = &ds.requests[0];
        assert_eq!(first.case_enquiry_id, "101004113");
        assert_eq!(first.open_dt, ts(2023, 1, 1, 0, 4));
        assert_eq!(first.closed_dt, Some(ts(2023, 1, 2, 0, 4)));
        assert_eq!(first.neighborhood.as_deref(), Some("Dorchester"));

        let second = &ds.requests[1];
        assert_eq!(second.closed_dt, None);
        assert_eq!(second.neighborhood, None);
        assert_eq!(second.on_time.as_deref(), Some("OVERDUE"));
        assert!(ds.has_nulls.contains(&Dimension::Neighborhood));
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let csv = "case_enquiry_id,open_dt,case_status,reason\n7,2023-02-01,Open,Graffiti\n";
        let ds = read_csv(csv.as_bytes()).unwrap();
        let req = &ds.requests[0];
        assert_eq!(req.open_dt, ts(2023, 2, 1, 0, 0));
        assert_eq!(req.closed_dt, None);
        assert_eq!(req.neighborhood, None);
        assert_eq!(req.on_time, None);
    }

    #[test]
    fn missing_required_column_fails() {
        let csv = "case_enquiry_id,closed_dt,case_status,reason\n1,,Open,Trash\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn(ref c) if c == "open_dt"));
    }

    #[test]
    fn unparseable_timestamp_fails_whole_load() {
        let csv = "\
case_enquiry_id,open_dt,closed_dt,case_status,reason
1,2023-01-01 10:00:00,,Open,Trash
2,2023-01-02 10:00:00,yesterday,Closed,Trash
";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        match err {
            DataLoadError::InvalidTimestamp { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "closed_dt");
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_open_dt_is_rejected() {
        let csv = "case_enquiry_id,open_dt,case_status,reason\n1,,Open,Trash\n";
        assert!(matches!(
            read_csv(csv.as_bytes()),
            Err(DataLoadError::InvalidTimestamp { column: "open_dt", .. })
        ));
    }

    #[test]
    fn parses_common_timestamp_layouts() {
        let expected = ts(2023, 3, 4, 15, 6);
        for text in [
            "2023-03-04 15:06:00",
            "2023-03-04T15:06:00",
            "2023-03-04 15:06:00.000",
            "2023-03-04T15:06:00-05:00",
            "2023-03-04 15:06:00+00",
            "03/04/2023 15:06",
            "03/04/2023 03:06:00 PM",
        ] {
            assert_eq!(parse_timestamp(text), Some(expected), "{text}");
        }
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn reads_json_records() {
        let json = r#"[
            {"case_enquiry_id": 101004113, "open_dt": "2023-01-01 00:04:00",
             "closed_dt": null, "case_status": "Open", "reason": "Trash",
             "neighborhood": null}
        ]"#;
        let ds = read_json(json).unwrap();
        assert_eq!(ds.requests[0].case_enquiry_id, "101004113");
        assert_eq!(ds.requests[0].closed_dt, None);
        assert_eq!(ds.requests[0].on_time, None);
    }

    #[test]
    fn reads_json_epoch_millis() {
        let json = r#"[
            {"case_enquiry_id": 101004113, "open_dt": 1672531440000,
             "closed_dt": 1672617840500, "case_status": "Closed", "reason": "Trash",
             "neighborhood": "Dorchester", "on_time": "ONTIME"},
            {"case_enquiry_id": 101004114, "open_dt": 1672925400000,
             "closed_dt": null, "case_status": "Open", "reason": "Pothole",
             "neighborhood": null, "on_time": null}
        ]"#;
        let ds = read_json(json).unwrap();
        assert_eq!(ds.requests[0].open_dt, ts(2023, 1, 1, 0, 4));
        assert_eq!(
            ds.requests[0].closed_dt,
            Some(ts(2023, 1, 2, 0, 4) + chrono::Duration::milliseconds(500))
        );
        assert_eq!(ds.requests[1].open_dt, ts(2023, 1, 5, 13, 30));
        assert_eq!(ds.requests[1].closed_dt, None);
    }

    #[test]
    fn out_of_range_epoch_millis_is_rejected() {
        let json = r#"[{"case_enquiry_id": 1, "open_dt": 9223372036854775807,
                        "case_status": "Open", "reason": "Trash"}]"#;
        assert!(matches!(
            read_json(json),
            Err(DataLoadError::InvalidTimestamp { row: 1, column: "open_dt", .. })
        ));
    }

    #[test]
    fn empty_required_cell_fails_whole_load() {
        let csv = "\
case_enquiry_id,open_dt,case_status,reason
1,2023-01-01 10:00:00,Open,Trash
2,2023-01-02 10:00:00,Closed,
";
        match read_csv(csv.as_bytes()).unwrap_err() {
            DataLoadError::MissingValue { row, column } => {
                assert_eq!(row, 2);
                assert_eq!(column, "reason");
            }
            other => panic!("unexpected error: {other}"),
        }

        let json = r#"[{"case_enquiry_id": null, "open_dt": "2023-01-01",
                        "case_status": "Open", "reason": "Trash"}]"#;
        assert!(matches!(
            read_json(json),
            Err(DataLoadError::MissingValue { row: 1, column: "case_enquiry_id" })
        ));
    }

    #[test]
    fn json_records_must_be_objects() {
        let json = r#"[
            {"case_enquiry_id": 1, "open_dt": "2023-01-01", "case_status": "Open", "reason": "Trash"},
            ["not", "a", "record"]
        ]"#;
        assert!(matches!(
            read_json(json),
            Err(DataLoadError::NotAnObject { row: 2 })
        ));
    }

    #[test]
    fn json_missing_required_column_fails() {
        let json = r#"[{"case_enquiry_id": 1, "open_dt": "2023-01-01", "case_status": "Open"}]"#;
        let err = read_json(json).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn(ref c) if c == "reason"));
        assert_eq!(err.to_string(), "missing required column 'reason'");
    }

    #[test]
    fn error_rows_are_one_based() {
        let csv = "case_enquiry_id,open_dt,case_status,reason\n1,soon,Open,Trash\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "data row 1: cannot parse open_dt timestamp 'soon'"
        );
    }

    #[test]
    fn json_must_be_an_array() {
        assert!(matches!(read_json("{}"), Err(DataLoadError::NotAnArray)));
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let dir = tempfile::TempDir::new().unwrap();

        let csv_path = dir.path().join("bos311.csv");
        std::fs::File::create(&csv_path)
            .unwrap()
            .write_all(SAMPLE_CSV.as_bytes())
            .unwrap();
        assert_eq!(load_file(&csv_path).unwrap().len(), 2);

        let other = dir.path().join("bos311.xlsx");
        std::fs::write(&other, b"").unwrap();
        assert!(matches!(
            load_file(&other),
            Err(DataLoadError::UnsupportedFormat(ref e)) if e == "xlsx"
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_file(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }
}
