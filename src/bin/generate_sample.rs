use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use serde::Serialize;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write a synthetic Boston 311 extract for trying out the dashboards.
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
struct Args {
    /// Number of service requests to generate
    #[arg(short, long, default_value_t = 5_000)]
    rows: usize,

    /// PRNG seed; the same seed always yields the same file
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Days covered, starting 2023-01-01
    #[arg(short, long, default_value_t = 180)]
    days: i64,

    /// Output path
    #[arg(short, long, default_value = "bos311.csv")]
    output: PathBuf,
}

/// (reason, median hours to close, service-level target in hours)
const REASONS: [(&str, f64, f64); 8] = [
    ("Street Cleaning", 20.0, 48.0),
    ("Sanitation", 30.0, 72.0),
    ("Highway Maintenance", 90.0, 120.0),
    ("Enforcement & Abandoned Vehicles", 8.0, 24.0),
    ("Code Enforcement", 60.0, 96.0),
    ("Signs & Signals", 70.0, 96.0),
    ("Trees", 400.0, 720.0),
    ("Recycling", 48.0, 96.0),
];

const NEIGHBORHOODS: [&str; 10] = [
    "Dorchester",
    "Roxbury",
    "South Boston / South Boston Waterfront",
    "Allston / Brighton",
    "Jamaica Plain",
    "East Boston",
    "Back Bay",
    "Charlestown",
    "Mattapan",
    "West Roxbury",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One CSV row, in the column order of the city's export.
#[derive(Serialize)]
struct Row {
    case_enquiry_id: u64,
    open_dt: String,
    closed_dt: String,
    on_time: String,
    case_status: String,
    reason: String,
    neighborhood: String,
}

fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn generate_row(rng: &mut SimpleRng, id: u64, start: NaiveDateTime, args: &Args) -> Row {
    let period_end = start + Duration::days(args.days);
    let open_dt = start
        + Duration::seconds((rng.next_f64() * (args.days * 86_400) as f64) as i64);

    let &(reason, median_hours, target_hours) = rng.pick(&REASONS);
    // Log-normal resolution time around the reason's median.
    let hours = (median_hours.ln() + rng.gauss(0.0, 0.9)).exp();
    let closed_at = open_dt + Duration::seconds((hours * 3600.0) as i64);
    let still_open = closed_at > period_end || rng.chance(0.08);

    let (closed_dt, case_status, on_time) = if still_open {
        let overdue = (period_end - open_dt).num_hours() as f64 > target_hours;
        let flag = if rng.chance(0.3) {
            ""
        } else if overdue {
            "OVERDUE"
        } else {
            "ONTIME"
        };
        (String::new(), "Open", flag)
    } else {
        let flag = if hours <= target_hours { "ONTIME" } else { "OVERDUE" };
        (fmt_ts(closed_at), "Closed", flag)
    };

    let neighborhood = if rng.chance(0.04) {
        String::new()
    } else {
        rng.pick(&NEIGHBORHOODS).to_string()
    };

    Row {
        case_enquiry_id: id,
        open_dt: fmt_ts(open_dt),
        closed_dt,
        on_time: on_time.to_string(),
        case_status: case_status.to_string(),
        reason: reason.to_string(),
        neighborhood,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let start = NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("building start date")?;

    let mut rows: Vec<Row> = (0..args.rows as u64)
        .map(|i| generate_row(&mut rng, 101_004_113 + i, start, &args))
        .collect();
    // The export is ordered by open date.
    rows.sort_by(|a, b| a.open_dt.cmp(&b.open_dt));

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for row in &rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;

    println!(
        "Wrote {} service requests over {} days to {}",
        rows.len(),
        args.days,
        args.output.display()
    );
    Ok(())
}
