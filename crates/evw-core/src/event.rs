//! Sensor events and grid geometry

use crate::error::{Result, WindowError};

/// Largest accepted grid dimension. 32768 x 32768 is far beyond any DVS sensor.
pub const MAX_SENSOR_DIM: u32 = 32768;

/// Direction of the brightness change that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Polarity {
    /// Brightness increase
    On,
    /// Brightness decrease
    Off,
}

impl Polarity {
    /// Decode a raw polarity value: `1` is ON, anything else is OFF.
    pub fn from_raw(value: i64) -> Self {
        if value == 1 {
            Polarity::On
        } else {
            Polarity::Off
        }
    }

    /// Raw encoding (`1` for ON, `0` for OFF)
    pub fn raw(self) -> i64 {
        match self {
            Polarity::On => 1,
            Polarity::Off => 0,
        }
    }
}

/// A single DVS sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
    /// Timestamp in milliseconds
    pub timestamp: f64,
    /// Polarity
    pub polarity: Polarity,
}

impl Event {
    /// Create a new event
    pub fn new(x: u32, y: u32, timestamp: f64, polarity: Polarity) -> Self {
        Self {
            x,
            y,
            timestamp,
            polarity,
        }
    }

    /// Create an ON event
    pub fn on(x: u32, y: u32, timestamp: f64) -> Self {
        Self::new(x, y, timestamp, Polarity::On)
    }

    /// Create an OFF event
    pub fn off(x: u32, y: u32, timestamp: f64) -> Self {
        Self::new(x, y, timestamp, Polarity::Off)
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.x,
            self.y,
            self.timestamp,
            self.polarity.raw()
        )
    }
}

/// Output grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resolution {
    /// Columns
    pub width: u32,
    /// Rows
    pub height: u32,
}

impl Resolution {
    /// Create a validated resolution
    pub fn new(width: u32, height: u32) -> Result<Self> {
        for (name, value) in [("width", width), ("height", height)] {
            if value == 0 || value > MAX_SENSOR_DIM {
                return Err(WindowError::invalid_parameter(
                    name,
                    value,
                    format!("1..={}", MAX_SENSOR_DIM),
                ));
            }
        }
        Ok(Self { width, height })
    }

    /// Whether `(x, y)` lies inside `[0, width) x [0, height)`
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Row-major cell index. Caller must check [`contains`](Self::contains) first.
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Number of cells in one grid
    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Fail with [`WindowError::OutOfBounds`] unless the event fits the grid
    pub fn check(&self, index: usize, event: &Event) -> Result<()> {
        if self.contains(event.x, event.y) {
            Ok(())
        } else {
            Err(WindowError::out_of_bounds(
                index,
                event.x,
                event.y,
                self.width,
                self.height,
            ))
        }
    }
}
