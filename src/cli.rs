//! CLI argument parsing for Kintai

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::month::MonthKey;

/// Output format for the generation bundle
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// JSON bundle for renderers (default)
    Json,
    /// Human-readable metric table
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "kintai")]
#[command(version)]
#[command(about = "Workforce attendance KPI engine", long_about = None)]
pub struct Cli {
    /// Directory containing the monthly employee and attendance files
    #[arg(short = 'd', long = "data-dir", value_name = "DIR")]
    pub data_dir: PathBuf,

    /// Target month (YYYY-MM); the aggregation window ends here
    #[arg(short = 'm', long = "month", value_name = "YYYY-MM")]
    pub month: MonthKey,

    /// Earliest month to include (defaults to twelve months before the target)
    #[arg(long = "from", value_name = "YYYY-MM")]
    pub from: Option<MonthKey>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Write the bundle to FILE instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Policy file (TOML) overriding thresholds and vocabularies
    #[arg(long = "policy", value_name = "FILE")]
    pub policy: Option<PathBuf>,

    /// KPI catalog file (TOML) replacing the standard eleven views
    #[arg(long = "catalog", value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Materialize all KPI views into the bundle
    #[arg(long = "views")]
    pub views: bool,

    /// Print a severity-grouped findings report to stderr
    #[arg(long = "summary")]
    pub summary: bool,

    /// Enable debug tracing to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// The earliest month of the aggregation window
    ///
    /// Explicit `--from` wins; otherwise the window reaches back twelve
    /// months from the target, inclusive.
    pub fn window_start(&self) -> MonthKey {
        if let Some(from) = self.from {
            return from;
        }
        let mut start = self.month;
        for _ in 0..11 {
            start = start.pred();
        }
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation_parses() {
        let cli = Cli::parse_from(["kintai", "-d", "./data", "-m", "2025-09"]);
        assert_eq!(cli.month, MonthKey::new(2025, 9).unwrap());
        assert!(cli.from.is_none());
        assert!(!cli.views);
    }

    #[test]
    fn test_default_window_reaches_back_twelve_months() {
        let cli = Cli::parse_from(["kintai", "-d", "./data", "-m", "2025-09"]);
        assert_eq!(cli.window_start(), MonthKey::new(2024, 10).unwrap());
    }

    #[test]
    fn test_explicit_from_wins() {
        let cli = Cli::parse_from([
            "kintai", "-d", "./data", "-m", "2025-09", "--from", "2025-07",
        ]);
        assert_eq!(cli.window_start(), MonthKey::new(2025, 7).unwrap());
    }

    #[test]
    fn test_invalid_month_rejected() {
        let result = Cli::try_parse_from(["kintai", "-d", "./data", "-m", "September"]);
        assert!(result.is_err());
    }
}
