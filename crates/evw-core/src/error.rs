//! Error types for the event windower

use thiserror::Error;

/// Result type for windowing operations
pub type Result<T> = std::result::Result<T, WindowError>;

/// Boxed error returned by a [`FrameSink`](crate::sink::FrameSink)
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while windowing an event stream
#[derive(Error, Debug)]
pub enum WindowError {
    /// Invalid configuration parameter, rejected at construction
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Event coordinate outside the configured grid
    #[error("Event {index} at ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        /// Position of the event in the stream
        index: usize,
        /// Event column
        x: u32,
        /// Event row
        y: u32,
        /// Grid width
        width: u32,
        /// Grid height
        height: u32,
    },

    /// Parallel input columns of different lengths
    #[error("Column '{column}' has {found} entries, expected {expected}")]
    LengthMismatch {
        /// Offending column name
        column: &'static str,
        /// Length of the `x` column
        expected: usize,
        /// Length of the offending column
        found: usize,
    },

    /// Timestamp went backwards (or is not a number)
    #[error("Event {index} has timestamp {timestamp}ms, earlier than previous {previous}ms")]
    OutOfOrder {
        /// Position of the event in the stream
        index: usize,
        /// Last accepted timestamp
        previous: f64,
        /// Offending timestamp
        timestamp: f64,
    },

    /// Requested substream does not exist in the recording
    #[error("Unknown stream '{name}' (available: {available})")]
    UnknownStream {
        /// Requested stream name
        name: String,
        /// Comma-separated list of stream names
        available: String,
    },

    /// The sink rejected a frame pair
    #[error("Sink failed on window {window}: {source}")]
    Sink {
        /// Index of the window being delivered
        window: usize,
        /// Source sink error
        source: SinkError,
    },
}

impl WindowError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl ToString,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    /// Create an out-of-bounds error
    pub fn out_of_bounds(index: usize, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            index,
            x,
            y,
            width,
            height,
        }
    }

    /// Create an out-of-order error
    pub fn out_of_order(index: usize, previous: f64, timestamp: f64) -> Self {
        Self::OutOfOrder {
            index,
            previous,
            timestamp,
        }
    }

    /// Create a sink error
    pub fn sink(window: usize, source: SinkError) -> Self {
        Self::Sink { window, source }
    }
}

/// Reject anything that is not a finite, strictly positive number.
pub(crate) fn ensure_positive(parameter: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(WindowError::invalid_parameter(parameter, value, "finite and > 0"))
    }
}
