//! Sliding time windows
//!
//! Membership is tracked by an explicit FIFO of the events inside the live
//! window; the grids are maintained incrementally from queue pushes and
//! evictions and are never reset. Every queued event satisfies
//! `ts >= newest_ts - initial_window_period` once the fill phase is over.
//!
//! Frames are emitted each time an event lands past the buffer horizon
//! `initial_window_period + time_buff`, after which the horizon moves forward
//! by `sliding_step`.

use std::collections::VecDeque;

use crate::error::{ensure_positive, Result};
use crate::event::{Event, Polarity, Resolution};
use crate::frame::FramePair;
use crate::policy::{deliver, OrderGuard, RunSummary, Windower};
use crate::sink::{FrameSink, WindowInfo, WindowSpan};

/// What happens to a grid cell when its event leaves the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Eviction {
    /// Always clear the cell, even if a younger event re-marked it
    Unconditional,
    /// Clear only once no queued event with the same cell and polarity remains
    #[default]
    LastWriter,
}

/// Parameters for [`SlidingTimeWindower`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SlidingWindowConfig {
    /// Window duration (ms)
    pub initial_window_period: f64,
    /// Horizon advance per emission (ms)
    #[cfg_attr(feature = "serde", serde(alias = "sliding_wdw"))]
    pub sliding_step: f64,
    /// Initial buffer past the first window (ms)
    pub time_buff: f64,
    /// Cell clearing rule on eviction
    pub eviction: Eviction,
    /// Slide the event that crosses the horizon into the window instead of dropping it
    pub carry_trigger: bool,
    /// Emit the live frame at end of stream if it changed since the last emission
    pub flush_final: bool,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            initial_window_period: 300.0,
            sliding_step: 100.0,
            time_buff: 100.0,
            eviction: Eviction::LastWriter,
            carry_trigger: true,
            flush_final: true,
        }
    }
}

impl SlidingWindowConfig {
    /// Create a validated configuration
    pub fn new(initial_window_period: f64, sliding_step: f64, time_buff: f64) -> Result<Self> {
        let config = Self {
            initial_window_period,
            sliding_step,
            time_buff,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Unconditional eviction, dropped horizon triggers, no final flush
    pub fn reference(initial_window_period: f64, sliding_step: f64, time_buff: f64) -> Result<Self> {
        Ok(Self::new(initial_window_period, sliding_step, time_buff)?
            .with_eviction(Eviction::Unconditional)
            .with_carry_trigger(false)
            .with_flush_final(false))
    }

    /// Set the eviction rule
    pub fn with_eviction(mut self, eviction: Eviction) -> Self {
        self.eviction = eviction;
        self
    }

    /// Set whether the horizon-crossing event is applied
    pub fn with_carry_trigger(mut self, enabled: bool) -> Self {
        self.carry_trigger = enabled;
        self
    }

    /// Set whether a changed live frame is emitted at end of stream
    pub fn with_flush_final(mut self, enabled: bool) -> Self {
        self.flush_final = enabled;
        self
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        ensure_positive("initial_window_period", self.initial_window_period)?;
        ensure_positive("sliding_wdw", self.sliding_step)?;
        ensure_positive("time_buff", self.time_buff)
    }
}

/// Maintains a moving time window over the stream
#[derive(Debug)]
pub struct SlidingTimeWindower {
    resolution: Resolution,
    config: SlidingWindowConfig,
    frame: FramePair,
    queue: VecDeque<Event>,
    /// Queued events per cell, ON grid first then OFF. Empty for unconditional eviction.
    writers: Vec<u32>,
    time_buff: f64,
    dirty: bool,
    order: OrderGuard,
    summary: RunSummary,
}

impl SlidingTimeWindower {
    /// Create a windower in its fill phase
    pub fn new(resolution: Resolution, config: SlidingWindowConfig) -> Result<Self> {
        config.validate()?;
        let writers = match config.eviction {
            Eviction::LastWriter => vec![0; resolution.cells() * 2],
            Eviction::Unconditional => Vec::new(),
        };
        Ok(Self {
            resolution,
            config,
            frame: FramePair::new(resolution),
            queue: VecDeque::new(),
            writers,
            time_buff: config.time_buff,
            dirty: false,
            order: OrderGuard::default(),
            summary: RunSummary::new("sliding"),
        })
    }

    /// Events currently inside the window, oldest first
    pub fn queue(&self) -> &VecDeque<Event> {
        &self.queue
    }

    /// Timestamp past which the next event triggers an emission (ms)
    pub fn horizon(&self) -> f64 {
        self.config.initial_window_period + self.time_buff
    }

    /// Current buffer extension (ms)
    pub fn time_buff(&self) -> f64 {
        self.time_buff
    }

    fn slot(&self, event: &Event) -> usize {
        let cell = self.resolution.index(event.x, event.y);
        match event.polarity {
            Polarity::On => cell,
            Polarity::Off => self.resolution.cells() + cell,
        }
    }

    fn insert(&mut self, event: Event) {
        self.frame.mark(&event);
        if self.config.eviction == Eviction::LastWriter {
            let slot = self.slot(&event);
            self.writers[slot] += 1;
        }
        self.queue.push_back(event);
        self.summary.events_applied += 1;
        self.dirty = true;
    }

    fn release(&mut self, old: &Event) {
        match self.config.eviction {
            Eviction::Unconditional => {
                self.frame.unmark(old);
            }
            Eviction::LastWriter => {
                let slot = self.slot(old);
                self.writers[slot] -= 1;
                if self.writers[slot] == 0 {
                    self.frame.unmark(old);
                }
            }
        }
        self.summary.evictions += 1;
        self.dirty = true;
    }

    fn slide(&mut self, event: Event) {
        let cutoff = event.timestamp - self.config.initial_window_period;
        while let Some(head) = self.queue.front() {
            if head.timestamp >= cutoff {
                break;
            }
            if let Some(old) = self.queue.pop_front() {
                self.release(&old);
            }
        }
        self.insert(event);
    }

    /// Emit the live frame. The span ends at the newest queued event and
    /// includes its lower edge, matching the eviction cutoff.
    fn emit(&mut self, sink: &mut dyn FrameSink) -> Result<()> {
        let end = self
            .queue
            .back()
            .map_or(self.horizon(), |newest| newest.timestamp);
        let info = WindowInfo {
            index: self.summary.windows_emitted,
            events: self.queue.len(),
            span: WindowSpan::Time {
                start: end - self.config.initial_window_period,
                end,
            },
        };
        self.summary.windows_emitted += 1;
        self.dirty = false;
        log::trace!(
            "Sliding window {} holds {} events, horizon {}ms",
            info.index,
            info.events,
            self.horizon()
        );
        deliver(sink, &info, &self.frame)
    }

    /// Advance the horizon until it covers `ts`
    fn extend_to(&mut self, ts: f64) {
        let gap = ts - self.horizon();
        if gap > 0.0 {
            self.time_buff += (gap / self.config.sliding_step).ceil() * self.config.sliding_step;
        }
        while ts > self.horizon() {
            self.time_buff += self.config.sliding_step;
        }
    }
}

impl Windower for SlidingTimeWindower {
    fn push(&mut self, event: Event, sink: &mut dyn FrameSink) -> Result<()> {
        let index = self.summary.events_seen;
        self.resolution.check(index, &event)?;
        self.order.check(index, event.timestamp)?;
        self.summary.events_seen += 1;

        let ts = event.timestamp;
        if ts <= self.config.initial_window_period {
            self.insert(event);
            return Ok(());
        }
        if ts <= self.horizon() {
            self.slide(event);
            return Ok(());
        }

        let delivered = self.emit(sink);
        self.time_buff += self.config.sliding_step;
        if self.config.carry_trigger {
            self.extend_to(ts);
            self.slide(event);
        } else {
            self.summary.dropped += 1;
        }
        delivered
    }

    fn finish(&mut self, sink: &mut dyn FrameSink) -> Result<RunSummary> {
        if self.dirty && self.config.flush_final {
            self.emit(sink)?;
        }
        if self.summary.dropped > 0 {
            log::warn!("{} horizon-crossing events were not applied", self.summary.dropped);
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
