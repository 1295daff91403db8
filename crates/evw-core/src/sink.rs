//! Consumers of completed frame pairs

use crate::error::SinkError;
use crate::frame::FramePair;

/// Which part of the stream a window covers
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WindowSpan {
    /// Half-open range `[start, end)` of stream positions
    Count {
        /// First event position
        start: usize,
        /// One past the last event position
        end: usize,
    },
    /// Time range in milliseconds. Fixed windows cover `start < t <= end`;
    /// sliding windows cover `start <= t <= end`.
    Time {
        /// Lower edge (inclusive for sliding windows)
        start: f64,
        /// Inclusive upper edge
        end: f64,
    },
}

/// Metadata delivered alongside every frame pair
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowInfo {
    /// Zero-based emission index
    pub index: usize,
    /// Events contributing to the frame (queue length for sliding windows)
    pub events: usize,
    /// Covered range
    pub span: WindowSpan,
}

/// Receives frame pairs in the order they are computed.
///
/// The frame is borrowed: the windower keeps reusing its buffers after `emit`
/// returns, so a sink that wants to retain a frame must clone it.
pub trait FrameSink {
    /// Deliver one completed window
    fn emit(&mut self, info: &WindowInfo, frame: &FramePair) -> Result<(), SinkError>;
}

impl<F> FrameSink for F
where
    F: FnMut(&WindowInfo, &FramePair) -> Result<(), SinkError>,
{
    fn emit(&mut self, info: &WindowInfo, frame: &FramePair) -> Result<(), SinkError> {
        self(info, frame)
    }
}

/// An owned snapshot of one emission
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedFrame {
    /// Window metadata
    pub info: WindowInfo,
    /// Frame contents at emission time
    pub frame: FramePair,
}

/// Retains a copy of every frame it receives
#[derive(Debug, Default)]
pub struct CollectSink {
    frames: Vec<EmittedFrame>,
}

impl CollectSink {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames received so far
    pub fn frames(&self) -> &[EmittedFrame] {
        &self.frames
    }

    /// Number of frames received
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether nothing has been received
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Take ownership of the collected frames
    pub fn into_frames(self) -> Vec<EmittedFrame> {
        self.frames
    }
}

impl FrameSink for CollectSink {
    fn emit(&mut self, info: &WindowInfo, frame: &FramePair) -> Result<(), SinkError> {
        self.frames.push(EmittedFrame {
            info: *info,
            frame: frame.clone(),
        });
        Ok(())
    }
}

/// Discards frames, counting them
#[derive(Debug, Default)]
pub struct NullSink {
    /// Frames received
    pub count: usize,
}

impl FrameSink for NullSink {
    fn emit(&mut self, _info: &WindowInfo, _frame: &FramePair) -> Result<(), SinkError> {
        self.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, Resolution};

    fn info(index: usize) -> WindowInfo {
        WindowInfo {
            index,
            events: 1,
            span: WindowSpan::Count {
                start: index,
                end: index + 1,
            },
        }
    }

    #[test]
    fn test_collect_sink_snapshots() {
        let mut frame = FramePair::new(Resolution::new(2, 2).unwrap());
        let mut sink = CollectSink::new();

        frame.mark(&Event::on(1, 0, 0.0));
        sink.emit(&info(0), &frame).unwrap();
        frame.reset();
        sink.emit(&info(1), &frame).unwrap();

        assert_eq!(sink.len(), 2);
        assert!(sink.frames()[0].frame.on.is_active(1, 0));
        assert!(sink.frames()[1].frame.is_blank());
    }

    #[test]
    fn test_closure_sink() {
        let frame = FramePair::new(Resolution::new(2, 2).unwrap());
        let mut seen = Vec::new();
        {
            let mut sink = |info: &WindowInfo, _frame: &FramePair| -> Result<(), SinkError> {
                seen.push(info.index);
                Ok(())
            };
            sink.emit(&info(4), &frame).unwrap();
        }
        assert_eq!(seen, vec![4]);
    }
}
