//! Fixed event-count windows
//!
//! The stream is cut into consecutive, non-overlapping batches of
//! `num_events` events (the last batch may be shorter). Timestamps are not
//! consulted. Within a batch the last event to land on a cell wins; grids are
//! reset after every emission.

use crate::error::{Result, WindowError};
use crate::event::{Event, Resolution};
use crate::frame::FramePair;
use crate::policy::{deliver, RunSummary, Windower};
use crate::sink::{FrameSink, WindowInfo, WindowSpan};

/// Parameters for [`FixedCountWindower`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CountWindowConfig {
    /// Events per batch
    pub num_events: usize,
}

impl Default for CountWindowConfig {
    fn default() -> Self {
        Self { num_events: 10 }
    }
}

impl CountWindowConfig {
    /// Create a validated configuration
    pub fn new(num_events: usize) -> Result<Self> {
        let config = Self { num_events };
        config.validate()?;
        Ok(config)
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if self.num_events == 0 {
            return Err(WindowError::invalid_parameter("num_events", 0, ">= 1"));
        }
        Ok(())
    }
}

/// Batches a stream by event count
#[derive(Debug)]
pub struct FixedCountWindower {
    resolution: Resolution,
    config: CountWindowConfig,
    frame: FramePair,
    batch_start: usize,
    pending: usize,
    summary: RunSummary,
}

impl FixedCountWindower {
    /// Create a windower with blank grids
    pub fn new(resolution: Resolution, config: CountWindowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resolution,
            config,
            frame: FramePair::new(resolution),
            batch_start: 0,
            pending: 0,
            summary: RunSummary::new("count"),
        })
    }

    /// Events accumulated in the current batch
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Index of the batch being filled
    pub fn batch_index(&self) -> usize {
        self.summary.windows_emitted
    }

    fn emit(&mut self, sink: &mut dyn FrameSink) -> Result<()> {
        let info = WindowInfo {
            index: self.summary.windows_emitted,
            events: self.pending,
            span: WindowSpan::Count {
                start: self.batch_start,
                end: self.summary.events_seen,
            },
        };
        let delivered = deliver(sink, &info, &self.frame);

        self.frame.reset();
        self.pending = 0;
        self.batch_start = self.summary.events_seen;
        self.summary.windows_emitted += 1;

        delivered
    }
}

impl Windower for FixedCountWindower {
    fn push(&mut self, event: Event, sink: &mut dyn FrameSink) -> Result<()> {
        self.resolution.check(self.summary.events_seen, &event)?;

        self.summary.events_seen += 1;
        self.summary.events_applied += 1;
        self.frame.mark(&event);
        self.pending += 1;

        if self.pending == self.config.num_events {
            self.emit(sink)?;
        }
        Ok(())
    }

    fn finish(&mut self, sink: &mut dyn FrameSink) -> Result<RunSummary> {
        if self.pending > 0 {
            self.emit(sink)?;
        }
        Ok(self.summary.clone())
    }

    fn frame(&self) -> &FramePair {
        &self.frame
    }

    fn summary(&self) -> &RunSummary {
        &self.summary
    }
}
