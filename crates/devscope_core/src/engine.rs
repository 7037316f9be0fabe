//! Analyzer Engine - Main Entry Point
//!
//! The AnalyzerEngine owns a control thread that serializes every session
//! transition: start, stop and configuration changes are processed one at a
//! time, in order. The cpal stream lives on that thread only.
//!
//! # Architecture
//!
//! ```text
//!   caller ──Command──▶ control thread ──builds──▶ CaptureStream
//!     ▲                      │                        │ (device thread)
//!     └──────Event───────────┘                        ▼
//!     ▲                                         SpectrumPipeline
//!     └──── latest_spectrum() ◀── triple buffer ──────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::capture::CaptureStream;
use crate::config::AnalyzerConfig;
use crate::device::InputDevice;
use crate::error::{EngineError, EngineResult};
use crate::message::{Command, Event};
use crate::snapshot::{SpectrumReceiver, SpectrumSnapshot};

/// Consumer side of the running session's snapshot handoff
type SpectrumSlot = Arc<Mutex<Option<SpectrumReceiver>>>;

/// The main analyzer controller
///
/// Lives on the caller's thread and talks to the control thread via channels.
pub struct AnalyzerEngine {
    /// Channel for sending commands to the control thread
    command_sender: Sender<Command>,

    /// Channel for receiving events from the control thread
    event_receiver: Receiver<Event>,

    /// Handle to the control thread
    control_thread: Option<JoinHandle<()>>,

    /// Flag to signal shutdown
    shutdown_flag: Arc<AtomicBool>,

    /// Configuration the next session will use
    config: AnalyzerConfig,

    /// Whether a capture session is active
    is_running: Arc<AtomicBool>,

    spectrum: SpectrumSlot,
}

impl AnalyzerEngine {
    /// Create a new engine with default configuration
    pub fn new() -> EngineResult<Self> {
        Self::with_config(AnalyzerConfig::default())
    }

    /// Create a new engine with custom configuration
    pub fn with_config(config: AnalyzerConfig) -> EngineResult<Self> {
        config.validate().map_err(EngineError::ConfigError)?;

        let (command_sender, command_receiver) = bounded::<Command>(32);
        let (event_sender, event_receiver) = unbounded::<Event>();

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let is_running = Arc::new(AtomicBool::new(false));
        let spectrum: SpectrumSlot = Arc::new(Mutex::new(None));

        // Clone for the control thread
        let shutdown_clone = Arc::clone(&shutdown_flag);
        let running_clone = Arc::clone(&is_running);
        let spectrum_clone = Arc::clone(&spectrum);
        let config_clone = config.clone();

        // cpal streams are !Send: the control state is built on its own thread
        let control_thread = thread::Builder::new()
            .name("devscope-audio".into())
            .spawn(move || {
                ControlThread {
                    command_receiver,
                    event_sender,
                    shutdown_flag: shutdown_clone,
                    is_running: running_clone,
                    spectrum: spectrum_clone,
                    config: config_clone,
                    session: None,
                    device: None,
                }
                .run();
            })
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;

        Ok(Self {
            command_sender,
            event_receiver,
            control_thread: Some(control_thread),
            shutdown_flag,
            config,
            is_running,
            spectrum,
        })
    }

    /// Start capturing from `device` (system default input if `None`)
    pub fn start(&self, device: Option<String>) -> EngineResult<()> {
        self.send_command(Command::Start { device })
    }

    /// Stop capturing
    pub fn stop(&self) -> EngineResult<()> {
        self.send_command(Command::Stop)
    }

    /// Replace the analyzer configuration
    ///
    /// Rejected immediately if invalid. A running session is rebuilt with the
    /// new frame size and axis.
    pub fn update_config(&mut self, config: AnalyzerConfig) -> EngineResult<()> {
        config.validate().map_err(EngineError::ConfigError)?;
        self.config = config.clone();
        self.send_command(Command::UpdateConfig(config))
    }

    /// Request state update
    pub fn request_state(&self) -> EngineResult<()> {
        self.send_command(Command::RequestState)
    }

    /// Check if a capture session is active
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Get next event (non-blocking)
    pub fn poll_event(&self) -> Option<Event> {
        self.event_receiver.try_recv().ok()
    }

    /// Get next event (blocking)
    pub fn wait_event(&self) -> Option<Event> {
        self.event_receiver.recv().ok()
    }

    /// Get next event, giving up after `timeout`
    pub fn wait_event_timeout(&self, timeout: Duration) -> Option<Event> {
        self.event_receiver.recv_timeout(timeout).ok()
    }

    /// Latest published spectrum of the running session
    ///
    /// `None` while stopped or before the first spectrum is published.
    pub fn latest_spectrum(&self) -> Option<SpectrumSnapshot> {
        self.spectrum
            .lock()
            .as_mut()
            .and_then(|receiver| receiver.latest().cloned())
    }

    /// Get all capture devices
    pub fn list_devices(&self) -> EngineResult<Vec<InputDevice>> {
        InputDevice::enumerate()
    }

    /// Get current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Send command to the control thread
    fn send_command(&self, command: Command) -> EngineResult<()> {
        self.command_sender
            .send(command)
            .map_err(|_| EngineError::ChannelSendError)
    }
}

impl Drop for AnalyzerEngine {
    fn drop(&mut self) {
        // Signal shutdown
        self.shutdown_flag.store(true, Ordering::SeqCst);

        // Send shutdown command
        let _ = self.command_sender.send(Command::Shutdown);

        // Wait for the control thread to finish
        if let Some(handle) = self.control_thread.take() {
            let _ = handle.join();
        }
    }
}

/// State owned by the control thread
struct ControlThread {
    command_receiver: Receiver<Command>,
    event_sender: Sender<Event>,
    shutdown_flag: Arc<AtomicBool>,
    is_running: Arc<AtomicBool>,
    spectrum: SpectrumSlot,
    config: AnalyzerConfig,
    session: Option<CaptureStream>,
    /// Device requested by the last start, reused when a config change restarts
    device: Option<String>,
}

impl ControlThread {
    fn run(mut self) {
        info!("Analyzer thread started");

        while !self.shutdown_flag.load(Ordering::SeqCst) {
            // Timeout so the shutdown flag is checked even without commands
            match self.command_receiver.recv_timeout(Duration::from_millis(16)) {
                Ok(command) => self.handle(command),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Command channel disconnected");
                    break;
                }
            }
        }

        self.stop_session();
        info!("Analyzer thread shutting down");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start { device } => {
                if self.session.is_some() {
                    warn!("Analyzer already running");
                    let _ = self.event_sender.send(Event::error(EngineError::AlreadyRunning));
                    return;
                }
                self.device = device;
                self.start_session();
            }

            Command::Stop => {
                if self.stop_session() {
                    let _ = self.event_sender.send(Event::Stopped);
                } else {
                    debug!("Stop requested while not running");
                }
            }

            Command::UpdateConfig(config) => {
                info!(
                    "Config changed: frame_size={}, interval={}ms, range={}..{} dB",
                    config.frame_size, config.min_publish_interval_ms, config.db_min, config.db_max
                );
                self.config = config.clone();
                let _ = self.event_sender.send(Event::ConfigChanged(config));

                // Frame size and axis are fixed per session: rebuild
                if self.stop_session() {
                    let _ = self.event_sender.send(Event::Stopped);
                    self.start_session();
                }
            }

            Command::RequestState => {
                let (frames_received, spectra_published, frames_dropped) = self
                    .session
                    .as_ref()
                    .map(|s| {
                        let stats = s.stats();
                        (
                            stats.frames_received(),
                            stats.spectra_published(),
                            stats.frames_dropped(),
                        )
                    })
                    .unwrap_or((0, 0, 0));

                let _ = self.event_sender.send(Event::StateUpdate {
                    is_running: self.session.is_some(),
                    frames_received,
                    spectra_published,
                    frames_dropped,
                });
            }

            Command::Shutdown => {
                info!("Shutdown command received");
                self.shutdown_flag.store(true, Ordering::SeqCst);
            }
        }
    }

    fn start_session(&mut self) {
        match self.open_session() {
            Ok((stream, receiver)) => {
                info!(
                    "Capture started on '{}': {} Hz, {} channels, frame size {}",
                    stream.device_name(),
                    stream.sample_rate(),
                    stream.channels(),
                    self.config.frame_size
                );
                *self.spectrum.lock() = Some(receiver);
                self.is_running.store(true, Ordering::SeqCst);
                let _ = self.event_sender.send(Event::Started {
                    device: stream.device_name().to_string(),
                    sample_rate: stream.sample_rate(),
                    channels: stream.channels(),
                    frame_size: self.config.frame_size,
                });
                self.session = Some(stream);
            }
            Err(e) => {
                error!("Failed to start capture: {}", e);
                let _ = self.event_sender.send(Event::error(e));
            }
        }
    }

    fn open_session(&self) -> EngineResult<(CaptureStream, SpectrumReceiver)> {
        let device = InputDevice::find(self.device.as_deref())?;
        CaptureStream::open(&device, &self.config, self.event_sender.clone())
    }

    /// Tear down the running session; returns whether one was running
    fn stop_session(&mut self) -> bool {
        let Some(stream) = self.session.take() else {
            return false;
        };

        info!("Stopping capture on '{}'", stream.device_name());
        stream.stop();
        // The consumer no longer sees a spectrum once stopped
        self.spectrum.lock().take();
        self.is_running.store(false, Ordering::SeqCst);
        true
    }
}
