//! Recording loaders
//!
//! Two on-disk shapes are accepted:
//! - JSON mirroring the dataset dictionary used by the capture tooling:
//!   `{"data": {"<camera>": {"dvs": {"x": [..], "y": [..], "ts": [..], "pol": [..]}}}}`
//! - whitespace-separated text, one event per line: `x y ts pol [camera]`.
//!   Blank lines and lines starting with `#` are skipped.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use evw_core::{EventColumns, Recording};
use serde::Deserialize;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Recording file formats
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordingFormat {
    /// Nested JSON dataset dictionary
    Json,
    /// Whitespace-separated text
    Text,
}

impl RecordingFormat {
    /// Guess the format from the file extension (`.json` or text)
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => RecordingFormat::Json,
            _ => RecordingFormat::Text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    data: BTreeMap<String, CameraEntry>,
}

#[derive(Debug, Deserialize)]
struct CameraEntry {
    dvs: EventColumns,
}

/// Load a recording from disk
///
/// `default_stream` names the substream for text lines without a camera column.
pub fn load_recording(
    path: &Path,
    format: Option<RecordingFormat>,
    default_stream: &str,
) -> CliResult<Recording> {
    let format = format.unwrap_or_else(|| RecordingFormat::detect(path));
    debug!("Loading {} as {:?}", path.display(), format);

    let file = std::fs::File::open(path)
        .with_context(|| format!("opening recording {}", path.display()))?;
    let reader = std::io::BufReader::new(file);

    let recording = match format {
        RecordingFormat::Json => parse_json(reader)?,
        RecordingFormat::Text => parse_text(reader, default_stream)?,
    };

    for (name, columns) in recording.streams() {
        columns.validate()?;
        debug!("Stream '{}': {} events", name, columns.len());
    }
    Ok(recording)
}

/// Parse the nested JSON dataset layout
pub fn parse_json(reader: impl std::io::Read) -> CliResult<Recording> {
    let file: DatasetFile = serde_json::from_reader(reader)?;
    let mut recording = Recording::new();
    for (name, entry) in file.data {
        recording.insert(name, entry.dvs);
    }
    Ok(recording)
}

/// Parse whitespace-separated `x y ts pol [camera]` lines
pub fn parse_text(reader: impl BufRead, default_stream: &str) -> CliResult<Recording> {
    let mut recording = Recording::new();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 || parts.len() > 5 {
            return Err(CliError::invalid_record(
                line_no,
                format!("expected 4 or 5 fields, found {}", parts.len()),
            ));
        }

        let x: u32 = field(parts[0], "x", line_no)?;
        let y: u32 = field(parts[1], "y", line_no)?;
        let ts: f64 = field(parts[2], "ts", line_no)?;
        let pol: i64 = field(parts[3], "pol", line_no)?;
        let stream = parts.get(4).copied().unwrap_or(default_stream);

        recording.stream_mut(stream).push(x, y, ts, pol);
    }

    Ok(recording)
}

fn field<T: std::str::FromStr>(raw: &str, name: &str, line: usize) -> CliResult<T> {
    raw.parse()
        .map_err(|_| CliError::invalid_record(line, format!("bad {} value '{}'", name, raw)))
}
