//! Parallel-column event input and named recordings
//!
//! Event sources hand over four equal-length sequences (`x`, `y`, `ts`, `pol`)
//! where index `i` across all four describes one event. A recording may hold
//! several such substreams, keyed by camera name.

use std::collections::BTreeMap;

use crate::error::{ensure_positive, Result, WindowError};
use crate::event::{Event, Polarity, Resolution};

/// Four parallel event columns
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventColumns {
    /// Columns
    pub x: Vec<u32>,
    /// Rows
    pub y: Vec<u32>,
    /// Timestamps, in the source's unit
    pub ts: Vec<f64>,
    /// Raw polarities (`1` = ON, anything else = OFF)
    pub pol: Vec<i64>,
}

impl EventColumns {
    /// Create columns, checking that they line up
    pub fn new(x: Vec<u32>, y: Vec<u32>, ts: Vec<f64>, pol: Vec<i64>) -> Result<Self> {
        let columns = Self { x, y, ts, pol };
        columns.validate()?;
        Ok(columns)
    }

    /// Append one event to every column
    pub fn push(&mut self, x: u32, y: u32, ts: f64, pol: i64) {
        self.x.push(x);
        self.y.push(y);
        self.ts.push(ts);
        self.pol.push(pol);
    }

    /// Number of events (length of the `x` column)
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether there are no events
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Reject columns whose lengths differ from `x`
    pub fn validate(&self) -> Result<()> {
        let expected = self.x.len();
        for (column, found) in [("y", self.y.len()), ("ts", self.ts.len()), ("pol", self.pol.len())] {
            if found != expected {
                return Err(WindowError::LengthMismatch {
                    column,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Events in stream order, timestamps taken as-is
    pub fn events(&self) -> Result<impl Iterator<Item = Event> + '_> {
        self.validate()?;
        Ok(self.iter_scaled(1.0))
    }

    /// Events in stream order with every timestamp multiplied by `factor`
    ///
    /// Recordings stamped in seconds become milliseconds with `factor = 1000.0`.
    pub fn events_scaled(&self, factor: f64) -> Result<impl Iterator<Item = Event> + '_> {
        ensure_positive("time_scale", factor)?;
        self.validate()?;
        Ok(self.iter_scaled(factor))
    }

    fn iter_scaled(&self, factor: f64) -> impl Iterator<Item = Event> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.ts)
            .zip(&self.pol)
            .map(move |(((&x, &y), &ts), &pol)| {
                Event::new(x, y, ts * factor, Polarity::from_raw(pol))
            })
    }

    /// Summary statistics over the columns
    pub fn stats(&self) -> Result<ColumnStats> {
        self.validate()?;
        Ok(ColumnStats::collect(self))
    }
}

/// Summary of one substream
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnStats {
    /// Total events
    pub events: usize,
    /// ON events
    pub on_events: usize,
    /// OFF events
    pub off_events: usize,
    /// First timestamp (source unit)
    pub first_ts: Option<f64>,
    /// Last timestamp (source unit)
    pub last_ts: Option<f64>,
    /// Largest column seen
    pub max_x: Option<u32>,
    /// Largest row seen
    pub max_y: Option<u32>,
    /// Whether timestamps never decrease
    pub sorted: bool,
}

impl ColumnStats {
    fn collect(columns: &EventColumns) -> Self {
        let on_events = columns
            .pol
            .iter()
            .filter(|&&p| Polarity::from_raw(p) == Polarity::On)
            .count();
        Self {
            events: columns.len(),
            on_events,
            off_events: columns.len() - on_events,
            first_ts: columns.ts.first().copied(),
            last_ts: columns.ts.last().copied(),
            max_x: columns.x.iter().copied().max(),
            max_y: columns.y.iter().copied().max(),
            sorted: columns.ts.windows(2).all(|w| w[0] <= w[1]),
        }
    }

    /// Whether every event fits inside `resolution`
    pub fn fits(&self, resolution: &Resolution) -> bool {
        self.max_x.map_or(true, |x| x < resolution.width)
            && self.max_y.map_or(true, |y| y < resolution.height)
    }
}

/// Named substreams of a single recording (e.g. `left` and `right` cameras)
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Recording {
    streams: BTreeMap<String, EventColumns>,
}

impl Recording {
    /// Create an empty recording
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a substream
    pub fn insert(&mut self, name: impl Into<String>, columns: EventColumns) {
        self.streams.insert(name.into(), columns);
    }

    /// Mutable access to a substream, creating it when missing
    pub fn stream_mut(&mut self, name: &str) -> &mut EventColumns {
        self.streams.entry(name.to_string()).or_default()
    }

    /// Select a substream by name
    pub fn stream(&self, name: &str) -> Result<&EventColumns> {
        self.streams
            .get(name)
            .ok_or_else(|| WindowError::UnknownStream {
                name: name.to_string(),
                available: self.stream_names().collect::<Vec<_>>().join(", "),
            })
    }

    /// Substream names in sorted order
    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    /// All substreams in name order
    pub fn streams(&self) -> impl Iterator<Item = (&str, &EventColumns)> {
        self.streams.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of substreams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether the recording has no substreams
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> EventColumns {
        EventColumns::new(
            vec![0, 1, 0],
            vec![0, 1, 0],
            vec![0.005, 0.009, 0.015],
            vec![1, 0, 0],
        )
        .unwrap()
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = EventColumns::new(vec![0, 1], vec![0, 1], vec![0.0], vec![1, 1]).unwrap_err();
        match err {
            WindowError::LengthMismatch {
                column,
                expected,
                found,
            } => {
                assert_eq!(column, "ts");
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mismatch_detected_after_mutation() {
        let mut cols = columns();
        cols.pol.pop();
        assert!(cols.events().is_err());
    }

    #[test]
    fn test_events_in_order() {
        let cols = columns();
        let events: Vec<_> = cols.events().unwrap().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], Event::on(0, 0, 0.005));
        assert_eq!(events[1].polarity, Polarity::Off);
    }

    #[test]
    fn test_events_scaled_to_millis() {
        let cols = columns();
        let ts: Vec<f64> = cols.events_scaled(1000.0).unwrap().map(|e| e.timestamp).collect();
        assert!((ts[0] - 5.0).abs() < 1e-9);
        assert!((ts[2] - 15.0).abs() < 1e-9);
        assert!(cols.events_scaled(0.0).is_err());
    }

    #[test]
    fn test_stats() {
        let stats = columns().stats().unwrap();
        assert_eq!(stats.events, 3);
        assert_eq!(stats.on_events, 1);
        assert_eq!(stats.off_events, 2);
        assert_eq!(stats.max_x, Some(1));
        assert!(stats.sorted);
        assert!(stats.fits(&Resolution::new(2, 2).unwrap()));
        assert!(!stats.fits(&Resolution::new(1, 2).unwrap()));
    }

    #[test]
    fn test_empty_stats() {
        let stats = EventColumns::default().stats().unwrap();
        assert_eq!(stats.events, 0);
        assert_eq!(stats.first_ts, None);
        assert!(stats.sorted);
    }

    #[test]
    fn test_recording_stream_selection() {
        let mut rec = Recording::new();
        rec.insert("right", columns());
        rec.insert("left", EventColumns::default());

        assert_eq!(rec.stream("right").unwrap().len(), 3);
        assert_eq!(rec.stream_names().collect::<Vec<_>>(), vec!["left", "right"]);

        let err = rec.stream("center").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("center"));
        assert!(msg.contains("left, right"));
    }
}
