//! Recorded input sessions
//!
//! A trace is a JSON-lines file. Each line is either a seat notification
//! (`{"type": "pointer_motion", "time": 10, "x": 1.5, "y": 2.0}`) or a
//! surface lifecycle record (`{"type": "register_surface", "surface": 1,
//! "width": 640, "height": 480, "effective_scale": 1.5, "output_scale": 2}`).
//! Blank lines and lines starting with `#` are skipped.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::dispatch::{FragmentSource, Incoming, ReadResult};
use crate::protocol::{SurfaceId, WireEvent};
use crate::scale::ScaleContext;

/// Lines handed to the dispatcher per read.
pub const DEFAULT_BATCH_SIZE: usize = 64;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to open trace {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read trace line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("malformed trace line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Surface lifecycle records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceRecord {
    RegisterSurface {
        surface: SurfaceId,
        width: i32,
        height: i32,
        #[serde(default = "default_effective_scale")]
        effective_scale: f64,
        #[serde(default = "default_output_scale")]
        output_scale: u32,
    },
    UpdateScale {
        surface: SurfaceId,
        #[serde(default = "default_effective_scale")]
        effective_scale: f64,
        #[serde(default = "default_output_scale")]
        output_scale: u32,
    },
    UnregisterSurface {
        surface: SurfaceId,
    },
}

fn default_effective_scale() -> f64 {
    1.0
}

fn default_output_scale() -> u32 {
    1
}

/// One line of a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceLine {
    Wire(WireEvent),
    Surface(SurfaceRecord),
}

impl From<TraceLine> for Incoming {
    fn from(line: TraceLine) -> Self {
        match line {
            TraceLine::Wire(event) => Incoming::Wire(event),
            TraceLine::Surface(SurfaceRecord::RegisterSurface {
                surface,
                width,
                height,
                effective_scale,
                output_scale,
            }) => Incoming::RegisterSurface {
                surface,
                width,
                height,
                scale: ScaleContext::new(effective_scale, output_scale),
            },
            TraceLine::Surface(SurfaceRecord::UpdateScale {
                surface,
                effective_scale,
                output_scale,
            }) => Incoming::UpdateScale {
                surface,
                scale: ScaleContext::new(effective_scale, output_scale),
            },
            TraceLine::Surface(SurfaceRecord::UnregisterSurface { surface }) => {
                Incoming::UnregisterSurface { surface }
            }
        }
    }
}

/// Parse one line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line_number: usize, line: &str) -> Result<Option<TraceLine>, TraceError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| TraceError::Parse {
            line: line_number,
            source,
        })
}

/// Replays a trace as a [`FragmentSource`].
pub struct TraceSource {
    reader: Box<dyn BufRead + Send>,
    line_number: usize,
    batch_size: usize,
    finished: bool,
}

impl TraceSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TraceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!("📼 Replaying trace {}", path.display());
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
            line_number: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            finished: false,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Next item, skipping blanks and comments. `Ok(None)` at end of input.
    pub fn next_item(&mut self) -> Result<Option<Incoming>, TraceError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            self.line_number += 1;
            let read = self
                .reader
                .read_line(&mut buf)
                .map_err(|source| TraceError::Read {
                    line: self.line_number,
                    source,
                })?;
            if read == 0 {
                return Ok(None);
            }
            if let Some(line) = parse_line(self.line_number, &buf)? {
                return Ok(Some(line.into()));
            }
        }
    }

    /// Read the whole trace.
    pub fn read_all(mut self) -> Result<Vec<Incoming>, TraceError> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item()? {
            items.push(item);
        }
        Ok(items)
    }
}

impl FragmentSource for TraceSource {
    fn read(&mut self, _idle_timeout: Duration) -> ReadResult {
        if self.finished {
            return ReadResult::Closed;
        }

        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.next_item() {
                Ok(Some(item)) => batch.push(item),
                Ok(None) => {
                    debug!("trace ended after {} line(s)", self.line_number - 1);
                    self.finished = true;
                    break;
                }
                Err(e) => {
                    self.finished = true;
                    return ReadResult::Error(e.to_string());
                }
            }
        }

        if batch.is_empty() {
            ReadResult::Closed
        } else {
            ReadResult::Events(batch)
        }
    }
}
