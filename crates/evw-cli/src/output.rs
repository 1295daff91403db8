//! Frame output sinks
//!
//! Frames are written sparsely: only the active cells of each grid, as
//! `[x, y]` pairs in row-major order.

use std::io::Write;

use clap::ValueEnum;
use evw_core::{FramePair, FrameSink, SinkError, WindowInfo, WindowSpan};
use serde::{Deserialize, Serialize};

use crate::error::CliResult;

/// Output formats for `evw run`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON frame record per line
    Json,
    /// A single bincode-encoded list of frame records
    Bincode,
    /// No frames, only the run summary
    Summary,
}

/// One emitted window in serialized form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Emission index
    pub index: usize,
    /// Events behind the frame
    pub events: usize,
    /// Covered range
    pub span: WindowSpan,
    /// Active ON cells
    pub on: Vec<[u32; 2]>,
    /// Active OFF cells
    pub off: Vec<[u32; 2]>,
}

impl FrameRecord {
    /// Capture a frame pair
    pub fn capture(info: &WindowInfo, frame: &FramePair) -> Self {
        Self {
            index: info.index,
            events: info.events,
            span: info.span,
            on: frame.on.active_cells().map(|(x, y)| [x, y]).collect(),
            off: frame.off.active_cells().map(|(x, y)| [x, y]).collect(),
        }
    }
}

/// Streams frame records as JSON lines
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flush and return the writer
    pub fn into_inner(mut self) -> CliResult<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn emit(&mut self, info: &WindowInfo, frame: &FramePair) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &FrameRecord::capture(info, frame))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Buffers frame records and writes them as one bincode list
#[derive(Debug, Default)]
pub struct BincodeSink {
    records: Vec<FrameRecord>,
}

impl BincodeSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode every buffered record into `writer`
    pub fn write_to(self, writer: impl Write) -> CliResult<usize> {
        let count = self.records.len();
        bincode::serialize_into(writer, &self.records)?;
        Ok(count)
    }
}

impl FrameSink for BincodeSink {
    fn emit(&mut self, info: &WindowInfo, frame: &FramePair) -> Result<(), SinkError> {
        self.records.push(FrameRecord::capture(info, frame));
        Ok(())
    }
}
