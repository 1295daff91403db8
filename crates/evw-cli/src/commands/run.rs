//! Window a recording and write the emitted frame pairs
//!
//! Example:
//!   evw run recording.json --policy sliding --camera right --out frames.jsonl
//!   evw run events.txt --policy count --num-events 1000 --format summary
//!
//! Settings come from the configuration file; flags override them.

use clap::{Args, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use evw_core::{Eviction, NullSink, RunSummary, WindowPolicy};

use crate::config::EvwConfig;
use crate::error::{CliError, CliResult};
use crate::output::{BincodeSink, JsonLinesSink, OutputFormat};
use crate::source::{load_recording, RecordingFormat};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyKind {
    /// Fixed number of events per frame
    Count,
    /// Fixed time window per frame
    Time,
    /// Sliding time window
    Sliding,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvictionArg {
    /// Clear a cell whenever one of its events leaves the window
    Unconditional,
    /// Clear a cell once none of its events remain queued
    LastWriter,
}

impl From<EvictionArg> for Eviction {
    fn from(arg: EvictionArg) -> Self {
        match arg {
            EvictionArg::Unconditional => Eviction::Unconditional,
            EvictionArg::LastWriter => Eviction::LastWriter,
        }
    }
}

/// Window a recording
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Recording file (.json dataset or whitespace-separated text)
    pub input: PathBuf,

    /// Batching policy
    #[arg(long, value_enum, default_value = "time")]
    pub policy: PolicyKind,

    /// Substream to process (overrides sensor.camera_events)
    #[arg(long)]
    pub camera: Option<String>,

    /// Recording format (detected from the extension by default)
    #[arg(long, value_enum)]
    pub input_format: Option<RecordingFormat>,

    /// Grid width
    #[arg(long)]
    pub width: Option<u32>,

    /// Grid height
    #[arg(long)]
    pub height: Option<u32>,

    /// Multiplier from raw timestamps to milliseconds
    #[arg(long)]
    pub time_scale: Option<f64>,

    /// Count policy: events per frame
    #[arg(long)]
    pub num_events: Option<usize>,

    /// Time policy: window duration (ms)
    #[arg(long)]
    pub window_period: Option<f64>,

    /// Sliding policy: window duration (ms)
    #[arg(long)]
    pub initial_window_period: Option<f64>,

    /// Sliding policy: horizon advance per emission (ms)
    #[arg(long)]
    pub sliding_wdw: Option<f64>,

    /// Sliding policy: initial horizon past the first window (ms)
    #[arg(long)]
    pub time_buff: Option<f64>,

    /// Sliding policy: eviction rule
    #[arg(long, value_enum)]
    pub eviction: Option<EvictionArg>,

    /// Drop window-closing events, skip the final flush and evict unconditionally
    #[arg(long)]
    pub reference: bool,

    /// Do not emit the trailing partial window
    #[arg(long)]
    pub no_flush: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file (stdout when omitted; required for bincode)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

impl RunCommand {
    /// Window the selected substream and write every emitted frame
    pub fn execute(self, mut config: EvwConfig) -> CliResult<()> {
        if self.format == OutputFormat::Bincode && self.out.is_none() {
            return Err(CliError::invalid_args("--format bincode requires --out"));
        }

        self.apply_overrides(&mut config);
        let resolution = config.resolution()?;
        let policy = self.build_policy(&config)?;

        let camera = config.sensor.camera_events.as_str();
        let recording = load_recording(&self.input, self.input_format, camera)?;
        let columns = recording.stream(camera)?;
        let events = columns.events_scaled(config.sensor.time_scale)?;

        info!(
            "Windowing {} events from '{}' ({})",
            columns.len(),
            camera,
            self.input.display()
        );

        let summary = match self.format {
            OutputFormat::Json => {
                let mut sink = JsonLinesSink::new(open_output(self.out.as_deref())?);
                let summary = policy.run(resolution, events, &mut sink)?;
                sink.into_inner()?;
                summary
            }
            OutputFormat::Bincode => {
                let path = self
                    .out
                    .as_deref()
                    .ok_or_else(|| CliError::invalid_args("--format bincode requires --out"))?;
                let mut sink = BincodeSink::new();
                let summary = policy.run(resolution, events, &mut sink)?;
                sink.write_to(BufWriter::new(File::create(path)?))?;
                summary
            }
            OutputFormat::Summary => {
                let mut sink = NullSink::default();
                policy.run(resolution, events, &mut sink)?
            }
        };

        report(&summary, self.out.as_deref());
        // frames own stdout unless they went to a file
        if self.format == OutputFormat::Summary || self.out.is_some() {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Ok(())
    }

    /// Fold command-line flags into the loaded configuration
    pub fn apply_overrides(&self, config: &mut EvwConfig) {
        if let Some(camera) = &self.camera {
            config.sensor.camera_events = camera.clone();
        }
        if let Some(width) = self.width {
            config.sensor.width = width;
        }
        if let Some(height) = self.height {
            config.sensor.height = height;
        }
        if let Some(scale) = self.time_scale {
            config.sensor.time_scale = scale;
        }
        if let Some(n) = self.num_events {
            config.count.num_events = n;
        }
        if let Some(period) = self.window_period {
            config.time.window_period = period;
        }
        if let Some(period) = self.initial_window_period {
            config.sliding.initial_window_period = period;
        }
        if let Some(step) = self.sliding_wdw {
            config.sliding.sliding_step = step;
        }
        if let Some(buff) = self.time_buff {
            config.sliding.time_buff = buff;
        }
    }

    /// Select and validate the policy
    pub fn build_policy(&self, config: &EvwConfig) -> CliResult<WindowPolicy> {
        let policy = match self.policy {
            PolicyKind::Count => WindowPolicy::FixedCount(config.count),
            PolicyKind::Time => {
                let mut time = config.time;
                if self.reference {
                    time = time.with_carry_trigger(false).with_flush_final(false);
                }
                if self.no_flush {
                    time = time.with_flush_final(false);
                }
                WindowPolicy::FixedTime(time)
            }
            PolicyKind::Sliding => {
                let mut sliding = config.sliding;
                if self.reference {
                    sliding = sliding
                        .with_eviction(Eviction::Unconditional)
                        .with_carry_trigger(false)
                        .with_flush_final(false);
                }
                if self.no_flush {
                    sliding = sliding.with_flush_final(false);
                }
                if let Some(eviction) = self.eviction {
                    sliding = sliding.with_eviction(eviction.into());
                }
                WindowPolicy::SlidingTime(sliding)
            }
        };
        policy.validate()?;
        Ok(policy)
    }
}

fn open_output(path: Option<&Path>) -> CliResult<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

fn report(summary: &RunSummary, out: Option<&Path>) {
    info!(
        "{} policy: {} frames from {} events ({} applied, {} dropped, {} evictions)",
        summary.policy,
        summary.windows_emitted,
        summary.events_seen,
        summary.events_applied,
        summary.dropped,
        summary.evictions
    );
    if let Some(path) = out {
        info!("Frames written to {}", path.display());
    }
}
