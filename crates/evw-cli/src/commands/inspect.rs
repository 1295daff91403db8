//! Recording inspection command

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use evw_core::{ColumnStats, Recording, Resolution};

use crate::config::EvwConfig;
use crate::error::CliResult;
use crate::source::{load_recording, RecordingFormat};

/// Summarize the substreams of a recording
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Recording file
    pub input: PathBuf,

    /// Only report this substream
    #[arg(long)]
    pub camera: Option<String>,

    /// Recording format (detected from the extension by default)
    #[arg(long, value_enum)]
    pub input_format: Option<RecordingFormat>,
}

/// Per-substream report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamReport {
    /// Substream name
    pub name: String,
    #[serde(flatten)]
    pub stats: ColumnStats,
    /// Every coordinate lies inside the configured grid
    pub fits: bool,
}

impl InspectCommand {
    /// Print a JSON report for each requested substream
    pub fn execute(self, config: EvwConfig) -> CliResult<()> {
        let resolution = config.resolution()?;
        let recording = load_recording(
            &self.input,
            self.input_format,
            &config.sensor.camera_events,
        )?;

        let reports = inspect(&recording, self.camera.as_deref(), &resolution)?;
        for report in &reports {
            if !report.stats.sorted {
                warn!("Stream '{}' has decreasing timestamps", report.name);
            }
            if !report.fits {
                warn!(
                    "Stream '{}' has coordinates outside {}x{}",
                    report.name, resolution.width, resolution.height
                );
            }
        }

        info!("{}: {} stream(s)", self.input.display(), reports.len());
        println!("{}", serde_json::to_string_pretty(&reports)?);
        Ok(())
    }
}

/// Build reports for every substream, or just `only` when given
pub fn inspect(
    recording: &Recording,
    only: Option<&str>,
    resolution: &Resolution,
) -> CliResult<Vec<StreamReport>> {
    let mut reports = Vec::new();
    match only {
        Some(name) => reports.push(report(name, recording, resolution)?),
        None => {
            for name in recording.stream_names() {
                reports.push(report(name, recording, resolution)?);
            }
        }
    }
    Ok(reports)
}

fn report(name: &str, recording: &Recording, resolution: &Resolution) -> CliResult<StreamReport> {
    let stats = recording.stream(name)?.stats()?;
    Ok(StreamReport {
        name: name.to_string(),
        fits: stats.fits(resolution),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use evw_core::{EventColumns, WindowError};

    fn recording() -> Recording {
        let mut recording = Recording::new();
        recording.insert(
            "left",
            EventColumns::new(vec![0, 9], vec![0, 1], vec![0.1, 0.05], vec![1, 0]).unwrap(),
        );
        recording.insert(
            "right",
            EventColumns::new(vec![1], vec![2], vec![0.3], vec![1]).unwrap(),
        );
        recording
    }

    #[test]
    fn test_all_streams() {
        let res = Resolution::new(4, 4).unwrap();
        let reports = inspect(&recording(), None, &res).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].name, "left");
        assert!(!reports[0].stats.sorted);
        assert!(!reports[0].fits);
        assert_eq!(reports[0].stats.off_events, 1);
        assert!(reports[1].stats.sorted);
        assert!(reports[1].fits);
    }

    #[test]
    fn test_single_stream() {
        let res = Resolution::new(4, 4).unwrap();
        let reports = inspect(&recording(), Some("right"), &res).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].stats.events, 1);

        let err = inspect(&recording(), Some("center"), &res).unwrap_err();
        assert!(matches!(err, CliError::Window(WindowError::UnknownStream { .. })));
    }
}
