//! Fixed time windows
//!
//! Window `n` covers `n * D < t <= (n + 1) * D`; the first boundary is
//! exactly `D`. Grids accumulate within a window and are reset when an event
//! beyond the boundary closes it.

use crate::error::{ensure_positive, Result, WindowError};
use crate::event::{Event, Resolution};
use crate::frame::FramePair;
use crate::policy::{deliver, OrderGuard, RunSummary, Windower};
use crate::sink::{FrameSink, WindowInfo, WindowSpan};

/// Largest window index a timestamp may fall into. Integers up to 2^52 are
/// exact in `f64`, so `n * D` boundaries stay well defined.
pub const MAX_WINDOW_INDEX: u64 = 1 << 52;

/// Parameters for [`FixedTimeWindower`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimeWindowConfig {
    /// Window duration `D` (ms)
    pub window_period: f64,
    /// Apply the event that closes a window to the window it belongs to.
    /// When unset the closing event is dropped and the boundary moves by one `D`.
    pub carry_trigger: bool,
    /// Emit the trailing partial window when the stream ends
    pub flush_final: bool,
}

impl Default for TimeWindowConfig {
    fn default() -> Self {
        Self {
            window_period: 10.0,
            carry_trigger: true,
            flush_final: true,
        }
    }
}

impl TimeWindowConfig {
    /// Create a validated configuration
    pub fn new(window_period: f64) -> Result<Self> {
        let config = Self {
            window_period,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Drop closing events and never flush the last window
    pub fn reference(window_period: f64) -> Result<Self> {
        Ok(Self::new(window_period)?
            .with_carry_trigger(false)
            .with_flush_final(false))
    }

    /// Set whether the closing event is applied
    pub fn with_carry_trigger(mut self, enabled: bool) -> Self {
        self.carry_trigger = enabled;
        self
    }

    /// Set whether the last partial window is emitted
    pub fn with_flush_final(mut self, enabled: bool) -> Self {
        self.flush_final = enabled;
        self
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        ensure_positive("window_period", self.window_period)
    }
}

/// Batches a stream into consecutive fixed-length time windows
#[derive(Debug)]
pub struct FixedTimeWindower {
    resolution: Resolution,
    config: TimeWindowConfig,
    frame: FramePair,
    window: u64,
    in_window: usize,
    order: OrderGuard,
    summary: RunSummary,
}

impl FixedTimeWindower {
    /// Create a windower whose first boundary is `window_period`
    pub fn new(resolution: Resolution, config: TimeWindowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resolution,
            config,
            frame: FramePair::new(resolution),
            window: 0,
            in_window: 0,
            order: OrderGuard::default(),
            summary: RunSummary::new("time"),
        })
    }

    /// Inclusive upper edge of the current window (ms)
    pub fn boundary(&self) -> f64 {
        self.edge(self.window + 1)
    }

    /// Events applied to the current window
    pub fn pending(&self) -> usize {
        self.in_window
    }

    fn edge(&self, n: u64) -> f64 {
        n as f64 * self.config.window_period
    }

    fn apply(&mut self, event: &Event) {
        self.frame.mark(event);
        self.in_window += 1;
        self.summary.events_applied += 1;
    }

    /// Close the current window, emitting it when `emit` is set
    fn close(&mut self, emit: bool, sink: &mut dyn FrameSink) -> Result<()> {
        let delivered = if emit {
            let info = WindowInfo {
                index: self.summary.windows_emitted,
                events: self.in_window,
                span: WindowSpan::Time {
                    start: self.edge(self.window),
                    end: self.boundary(),
                },
            };
            self.summary.windows_emitted += 1;
            deliver(sink, &info, &self.frame)
        } else {
            Ok(())
        };

        self.frame.reset();
        self.in_window = 0;
        self.window += 1;

        delivered
    }

    fn check_range(&self, index: usize, ts: f64) -> Result<()> {
        // non-finite timestamps are left to the order check
        if ts.is_finite() && ts / self.config.window_period > MAX_WINDOW_INDEX as f64 {
            return Err(WindowError::invalid_parameter(
                format!("timestamp of event {}", index),
                ts,
                format!(
                    "at most {} windows of {}ms",
                    MAX_WINDOW_INDEX, self.config.window_period
                ),
            ));
        }
        Ok(())
    }

    /// Move forward to the first window whose boundary is `>= ts`
    fn skip_to(&mut self, ts: f64) {
        let floor = self.window;
        let estimate = (ts / self.config.window_period).ceil() - 1.0;
        if estimate.is_finite() && estimate > floor as f64 {
            self.window = estimate as u64;
        }
        // the estimate can be off by one either way after rounding
        while ts > self.boundary() {
            self.window += 1;
        }
        while self.window > floor && ts <= self.edge(self.window) {
            self.window -= 1;
        }
    }
}

impl Windower for FixedTimeWindower {
    fn push(&mut self, event: Event, sink: &mut dyn FrameSink) -> Result<()> {
        let index = self.summary.events_seen;
        self.resolution.check(index, &event)?;
        self.check_range(index, event.timestamp)?;
        self.order.check(index, event.timestamp)?;
        self.summary.events_seen += 1;

        if event.timestamp <= self.boundary() {
            self.apply(&event);
            return Ok(());
        }

        if !self.config.carry_trigger {
            self.summary.dropped += 1;
            log::trace!("Dropping window trigger at {}ms", event.timestamp);
            return self.close(true, sink);
        }

        let emit = self.in_window > 0;
        let delivered = self.close(emit, sink);
        self.skip_to(event.timestamp);
        self.apply(&event);
        delivered
    }

    fn finish(&mut self, sink: &mut dyn FrameSink) -> Result<RunSummary> {
        if self.in_window > 0 {
            if self.config.flush_final {
                self.close(true, sink)?;
            } else {
                log::debug!(
                    "Discarding final window ({} events) ending at {}ms",
                    self.in_window,
                    self.boundary()
                );
            }
        }
        if self.summary.dropped > 0 {
            log::warn!("{} window-closing events were not applied", self.summary.dropped);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::run_windower;
    use crate::sink::CollectSink;

    fn res() -> Resolution {
        Resolution::new(8, 8).unwrap()
    }

    fn run(config: TimeWindowConfig, events: Vec<Event>) -> (RunSummary, CollectSink) {
        let mut win = FixedTimeWindower::new(res(), config).unwrap();
        let mut sink = CollectSink::new();
        let summary = run_windower(&mut win, events, &mut sink).unwrap();
        (summary, sink)
    }

    #[test]
    fn test_invalid_period_rejected() {
        assert!(TimeWindowConfig::new(0.0).is_err());
        assert!(TimeWindowConfig::new(-1.0).is_err());
        assert!(TimeWindowConfig::new(f64::NAN).is_err());
    }

    #[test]
    fn test_first_boundary_is_period() {
        let win = FixedTimeWindower::new(res(), TimeWindowConfig::new(10.0).unwrap()).unwrap();
        assert_eq!(win.boundary(), 10.0);
    }

    #[test]
    fn test_trigger_closes_window() {
        let events = vec![Event::on(0, 0, 5.0), Event::on(1, 0, 9.0), Event::on(2, 0, 15.0)];
        let (_, sink) = run(TimeWindowConfig::reference(10.0).unwrap(), events);

        assert_eq!(sink.len(), 1);
        let first = &sink.frames()[0];
        assert_eq!(first.info.events, 2);
        assert_eq!(first.frame.on.active_cells().collect::<Vec<_>>(), vec![(0, 0), (1, 0)]);
        assert_eq!(first.info.span, WindowSpan::Time { start: 0.0, end: 10.0 });
    }

    #[test]
    fn test_boundary_event_belongs_to_current_window() {
        let events = vec![Event::on(0, 0, 10.0), Event::on(1, 0, 10.5)];
        let (_, sink) = run(TimeWindowConfig::new(10.0).unwrap(), events);

        assert_eq!(sink.len(), 2);
        assert!(sink.frames()[0].frame.on.is_active(0, 0));
        assert!(!sink.frames()[0].frame.on.is_active(1, 0));
        assert!(sink.frames()[1].frame.on.is_active(1, 0));
    }

    #[test]
    fn test_reference_drops_trigger_and_final_window() {
        let events = vec![Event::on(0, 0, 5.0), Event::on(1, 0, 15.0), Event::on(2, 0, 16.0)];
        let (summary, sink) = run(TimeWindowConfig::reference(10.0).unwrap(), events);

        assert_eq!(sink.len(), 1);
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.events_applied, 2);
    }

    #[test]
    fn test_carry_and_flush() {
        let events = vec![Event::on(0, 0, 5.0), Event::on(1, 0, 15.0), Event::on(2, 0, 16.0)];
        let (summary, sink) = run(TimeWindowConfig::new(10.0).unwrap(), events);

        assert_eq!(sink.len(), 2);
        assert_eq!(summary.dropped, 0);
        let second = &sink.frames()[1];
        assert_eq!(second.info.events, 2);
        assert_eq!(second.info.span, WindowSpan::Time { start: 10.0, end: 20.0 });
        assert!(second.frame.on.is_active(1, 0));
    }

    #[test]
    fn test_gap_skips_empty_windows() {
        let events = vec![Event::on(0, 0, 1.0), Event::on(1, 0, 47.0)];
        let (_, sink) = run(TimeWindowConfig::new(10.0).unwrap(), events);

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.frames()[1].info.span, WindowSpan::Time { start: 40.0, end: 50.0 });
    }

    #[test]
    fn test_reference_emits_empty_window_on_gap() {
        let events = vec![Event::on(0, 0, 25.0), Event::on(1, 0, 26.0)];
        let (_, sink) = run(TimeWindowConfig::reference(10.0).unwrap(), events);

        assert_eq!(sink.len(), 2);
        assert!(sink.frames().iter().all(|f| f.frame.is_blank()));
    }

    #[test]
    fn test_huge_gap_rejected_without_state_change() {
        let mut win = FixedTimeWindower::new(res(), TimeWindowConfig::new(10.0).unwrap()).unwrap();
        let mut sink = CollectSink::new();
        win.push(Event::on(0, 0, 1.0), &mut sink).unwrap();

        let err = win.push(Event::on(1, 0, 1e21), &mut sink).unwrap_err();
        assert!(matches!(err, WindowError::InvalidParameter { .. }));
        assert_eq!(win.pending(), 1);
        assert_eq!(win.boundary(), 10.0);
        assert_eq!(win.summary().events_seen, 1);
        assert!(sink.is_empty());

        // the largest representable window is still reachable
        let far = MAX_WINDOW_INDEX as f64 * 10.0;
        win.push(Event::on(1, 0, far), &mut sink).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(win.boundary(), far);
        assert_eq!(win.pending(), 1);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut win = FixedTimeWindower::new(res(), TimeWindowConfig::new(10.0).unwrap()).unwrap();
        let mut sink = CollectSink::new();
        win.push(Event::on(0, 0, 5.0), &mut sink).unwrap();
        let err = win.push(Event::on(0, 0, 4.0), &mut sink).unwrap_err();
        assert!(matches!(err, WindowError::OutOfOrder { index: 1, .. }));
    }
}
