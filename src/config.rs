use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bos311-dashboard")]
#[command(version)]
#[command(about = "Interactive dashboards over Boston 311 service requests")]
pub struct Cli {
    /// Service-request table to load (.csv or .json)
    #[arg(default_value = "bos311.csv")]
    pub data: PathBuf,

    /// Which dashboard to show
    #[arg(short, long, value_enum, default_value_t = Layout::Full)]
    pub layout: Layout,
}

/// The two dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// Date, status, neighborhood and reason filters with metrics and charts
    Full,
    /// Open-date slider and the raw table
    DateOnly,
}

impl Layout {
    pub fn window_title(self) -> &'static str {
        match self {
            Layout::Full => "Boston 311 Service Request Dashboard",
            Layout::DateOnly => "Boston 311 Requests – Simple Date Filter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_full_dashboard_on_bos311_csv() {
        let cli = Cli::try_parse_from(["bos311-dashboard"]).unwrap();
        assert_eq!(cli.data, PathBuf::from("bos311.csv"));
        assert_eq!(cli.layout, Layout::Full);
    }

    #[test]
    fn parses_date_only_layout() {
        let cli =
            Cli::try_parse_from(["bos311-dashboard", "data/311.json", "--layout", "date-only"])
                .unwrap();
        assert_eq!(cli.data, PathBuf::from("data/311.json"));
        assert_eq!(cli.layout, Layout::DateOnly);
    }

    #[test]
    fn rejects_unknown_layout() {
        assert!(Cli::try_parse_from(["bos311-dashboard", "-l", "heatmap"]).is_err());
    }
}
