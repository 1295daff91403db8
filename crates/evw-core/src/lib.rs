//! Event windowing engine for DVS recordings
//!
//! This crate turns a timestamp-ordered stream of pixel events into a
//! sequence of ON/OFF frame pairs under one of three batching policies:
//!
//! - [`FixedCountWindower`]: consecutive batches of `num_events` events
//! - [`FixedTimeWindower`]: consecutive windows of `window_period` ms
//! - [`SlidingTimeWindower`]: a moving window backed by an explicit event queue
//!
//! Completed frames go to a [`FrameSink`]. All configuration is checked when a
//! windower is built, and every event is bounds-checked before it touches a grid.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod count;
pub mod error;
pub mod event;
pub mod frame;
pub mod policy;
pub mod sink;
pub mod sliding;
pub mod stream;
pub mod time;

// Re-export essential types
pub use count::{CountWindowConfig, FixedCountWindower};
pub use error::{Result, SinkError, WindowError};
pub use event::{Event, Polarity, Resolution, MAX_SENSOR_DIM};
pub use frame::{FramePair, Grid, ACTIVE, INACTIVE};
pub use policy::{run_windower, RunSummary, WindowPolicy, Windower};
pub use sink::{CollectSink, EmittedFrame, FrameSink, NullSink, WindowInfo, WindowSpan};
pub use sliding::{Eviction, SlidingTimeWindower, SlidingWindowConfig};
pub use stream::{ColumnStats, EventColumns, Recording};
pub use time::{FixedTimeWindower, TimeWindowConfig, MAX_WINDOW_INDEX};

/// Multiplier from second-stamped recordings to milliseconds
pub const SECONDS_TO_MILLIS: f64 = 1_000.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_integration() {
        let columns = EventColumns::new(vec![0, 1], vec![0, 1], vec![0.001, 0.002], vec![1, 0]).unwrap();
        let events: Vec<_> = columns.events_scaled(SECONDS_TO_MILLIS).unwrap().collect();

        let policy = WindowPolicy::FixedTime(TimeWindowConfig::new(10.0).unwrap());
        let mut sink = CollectSink::new();
        let summary = policy
            .run(Resolution::new(2, 2).unwrap(), events, &mut sink)
            .unwrap();

        assert_eq!(summary.windows_emitted, 1);
        assert!(sink.frames()[0].frame.on.is_active(0, 0));
        assert!(sink.frames()[0].frame.off.is_active(1, 1));
    }
}
