//! Windower trait, policy selection and run driver

use crate::count::{CountWindowConfig, FixedCountWindower};
use crate::error::{Result, WindowError};
use crate::event::{Event, Resolution};
use crate::frame::FramePair;
use crate::sink::{FrameSink, WindowInfo};
use crate::sliding::{SlidingTimeWindower, SlidingWindowConfig};
use crate::time::{FixedTimeWindower, TimeWindowConfig};

/// Counters describing one windowing run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    /// Policy name (`count`, `time` or `sliding`)
    pub policy: String,
    /// Events accepted from the stream
    pub events_seen: usize,
    /// Events that were written into a frame
    pub events_applied: usize,
    /// Window-closing events consumed without being applied
    pub dropped: usize,
    /// Frame pairs handed to the sink
    pub windows_emitted: usize,
    /// Events evicted from the sliding queue
    pub evictions: usize,
}

impl RunSummary {
    /// Create zeroed counters for a policy
    pub fn new(policy: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            ..Default::default()
        }
    }
}

/// A push-driven windowing state machine.
///
/// Each call to [`push`](Windower::push) consumes one event; the windower
/// emits completed frame pairs to the sink as it goes. Events must be pushed
/// in stream order. Once [`finish`](Windower::finish) has been called the
/// windower should be discarded.
pub trait Windower {
    /// Process the next event
    fn push(&mut self, event: Event, sink: &mut dyn FrameSink) -> Result<()>;

    /// Handle end of stream and return the run counters
    fn finish(&mut self, sink: &mut dyn FrameSink) -> Result<RunSummary>;

    /// Live frame pair
    fn frame(&self) -> &FramePair;

    /// Counters so far
    fn summary(&self) -> &RunSummary;
}

/// Drive a windower over a whole stream
pub fn run_windower<W, I>(windower: &mut W, events: I, sink: &mut dyn FrameSink) -> Result<RunSummary>
where
    W: Windower + ?Sized,
    I: IntoIterator<Item = Event>,
{
    for event in events {
        windower.push(event, sink)?;
    }
    let summary = windower.finish(sink)?;
    log::info!(
        "Windowing completed ({}): {} events, {} frames",
        summary.policy,
        summary.events_seen,
        summary.windows_emitted
    );
    Ok(summary)
}

/// Hand a frame to the sink, tagging failures with the window index
pub(crate) fn deliver(sink: &mut dyn FrameSink, info: &WindowInfo, frame: &FramePair) -> Result<()> {
    log::debug!("Emitting window {} ({} events)", info.index, info.events);
    sink.emit(info, frame)
        .map_err(|source| WindowError::sink(info.index, source))
}

/// Rejects non-finite or decreasing timestamps
#[derive(Debug, Default)]
pub(crate) struct OrderGuard {
    last: Option<f64>,
}

impl OrderGuard {
    pub(crate) fn check(&mut self, index: usize, timestamp: f64) -> Result<()> {
        let previous = self.last.unwrap_or(f64::NEG_INFINITY);
        if !timestamp.is_finite() || timestamp < previous {
            return Err(WindowError::out_of_order(index, previous, timestamp));
        }
        self.last = Some(timestamp);
        Ok(())
    }
}

/// Batching policy selection
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "policy", rename_all = "kebab-case"))]
pub enum WindowPolicy {
    /// Fixed event count
    FixedCount(CountWindowConfig),
    /// Fixed time window
    FixedTime(TimeWindowConfig),
    /// Sliding time window
    SlidingTime(SlidingWindowConfig),
}

impl WindowPolicy {
    /// Short policy name
    pub fn name(&self) -> &'static str {
        match self {
            WindowPolicy::FixedCount(_) => "count",
            WindowPolicy::FixedTime(_) => "time",
            WindowPolicy::SlidingTime(_) => "sliding",
        }
    }

    /// Validate the policy parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            WindowPolicy::FixedCount(c) => c.validate(),
            WindowPolicy::FixedTime(c) => c.validate(),
            WindowPolicy::SlidingTime(c) => c.validate(),
        }
    }

    /// Construct a fresh windower for this policy
    pub fn build(&self, resolution: Resolution) -> Result<Box<dyn Windower>> {
        Ok(match *self {
            WindowPolicy::FixedCount(c) => Box::new(FixedCountWindower::new(resolution, c)?),
            WindowPolicy::FixedTime(c) => Box::new(FixedTimeWindower::new(resolution, c)?),
            WindowPolicy::SlidingTime(c) => Box::new(SlidingTimeWindower::new(resolution, c)?),
        })
    }

    /// Window a whole stream with fresh state
    pub fn run<I>(&self, resolution: Resolution, events: I, sink: &mut dyn FrameSink) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Event>,
    {
        let mut windower = self.build(resolution)?;
        log::info!(
            "Starting {} windowing on a {}x{} grid",
            self.name(),
            resolution.width,
            resolution.height
        );
        run_windower(windower.as_mut(), events, sink)
    }
}
