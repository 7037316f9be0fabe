//! Message Types for Thread Communication
//!
//! Commands flow from the caller -> control thread.
//! Events flow from the control thread (and the stream error callback) -> caller.

use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;

/// Commands sent to the analyzer's control thread
#[derive(Debug, Clone)]
pub enum Command {
    /// Open a capture session on the named device (system default if `None`)
    Start { device: Option<String> },

    /// Tear down the running session
    Stop,

    /// Replace the configuration; a running session is rebuilt with it
    UpdateConfig(AnalyzerConfig),

    /// Request current state (triggers StateUpdate event)
    RequestState,

    /// Shutdown the engine
    Shutdown,
}

/// Events reported by the analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Capture session is running
    Started {
        device: String,
        sample_rate: u32,
        channels: u16,
        frame_size: usize,
    },

    /// Capture session stopped
    Stopped,

    /// Error occurred
    Error { message: String },

    /// Current state snapshot
    StateUpdate {
        is_running: bool,
        frames_received: u64,
        spectra_published: u64,
        frames_dropped: u64,
    },

    /// Configuration changed
    ConfigChanged(AnalyzerConfig),
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }
}
