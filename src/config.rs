use std::path::PathBuf;

use clap::Parser;

/// Hospital appointment no-show dashboard.
#[derive(Debug, Parser)]
#[command(name = "appointment-insights", version, about)]
pub struct Args {
    /// Appointment table to open at startup (.csv, .json, .parquet)
    #[arg(value_name = "SOURCE")]
    pub source: Option<PathBuf>,
}

/// Runtime settings for the viewer.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub source: Option<PathBuf>,
    pub window_title: String,
    pub inner_size: [f32; 2],
    pub min_inner_size: [f32; 2],
    /// Rows shown in the dataset overview table.
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: None,
            window_title: "Appointment Insights – Hospital No-Show Dashboard".to_string(),
            inner_size: [1400.0, 900.0],
            min_inner_size: [800.0, 500.0],
            preview_rows: 20,
        }
    }
}

impl From<Args> for DashboardConfig {
    fn from(args: Args) -> Self {
        Self {
            source: args.source,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_source_is_optional() {
        let args = Args::try_parse_from(["appointment-insights"]).unwrap();
        assert!(args.source.is_none());

        let args = Args::try_parse_from(["appointment-insights", "data/appointments.csv"]).unwrap();
        let config = DashboardConfig::from(args);
        assert_eq!(config.source, Some(PathBuf::from("data/appointments.csv")));
        assert_eq!(config.preview_rows, 20);
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Args::try_parse_from(["appointment-insights", "--location", "Lagos"]).is_err());
    }
}
