mod cli;
mod render;

use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use devscope_core::{AnalyzerEngine, AnalyzerSettings, Event, InputDevice};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;

/// How long to wait for the control thread to confirm a start/stop
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);

/// Fastest terminal refresh, regardless of the publish interval
const MIN_REFRESH: Duration = Duration::from_millis(16);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("devscope=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_devices {
        return list_devices();
    }

    let mut settings = AnalyzerSettings::load();
    cli.apply(&mut settings);
    settings
        .analyzer
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid analyzer configuration")?;

    if cli.save {
        settings
            .save()
            .map_err(anyhow::Error::msg)
            .context("failed to save settings")?;
    }

    let duration = cli
        .duration
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("invalid --duration")?;

    run(&settings, duration)
}

fn list_devices() -> Result<()> {
    let devices = InputDevice::enumerate().context("failed to enumerate capture devices")?;
    for device in devices {
        let marker = if device.is_default { "*" } else { " " };
        let rate = device
            .default_sample_rate
            .map(|r| format!("{} Hz", r))
            .unwrap_or_else(|| "unknown rate".to_string());
        println!(
            "{} {} ({}, up to {} channels)",
            marker, device.name, rate, device.max_channels
        );
    }
    Ok(())
}

fn run(settings: &AnalyzerSettings, duration: Option<Duration>) -> Result<()> {
    let config = &settings.analyzer;
    let engine =
        AnalyzerEngine::with_config(config.clone()).context("failed to create analyzer engine")?;

    engine.start(settings.input_device.clone())?;
    match engine.wait_event_timeout(CONFIRM_TIMEOUT) {
        Some(Event::Started {
            device,
            sample_rate,
            channels,
            frame_size,
        }) => info!(
            "Analyzing '{}' at {} Hz, {} channels, {} bins of {:.1} Hz",
            device,
            sample_rate,
            channels,
            frame_size / 2,
            config.resolution_hz(sample_rate as f32)
        ),
        Some(Event::Error { message }) => bail!("capture failed to start: {}", message),
        other => bail!("capture did not start: {:?}", other),
    }

    let deadline = duration.map(|d| Instant::now() + d);
    let refresh = config.min_publish_interval().max(MIN_REFRESH);
    let range = config.db_range();
    let mut stdout = std::io::stdout();

    while deadline.map_or(true, |d| Instant::now() < d) {
        while let Some(event) = engine.poll_event() {
            match event {
                Event::Error { message } => warn!("Capture error: {}", message),
                other => debug!("Event: {:?}", other),
            }
        }

        if let Some(snapshot) = engine.latest_spectrum() {
            let line = render::render_line(
                &snapshot,
                settings.display.bar_count,
                range,
                settings.display.show_peak,
            );
            write!(stdout, "\r{}", line)?;
            stdout.flush()?;
        }

        thread::sleep(refresh);
    }
    writeln!(stdout)?;

    engine.request_state()?;
    engine.stop()?;
    while let Some(event) = engine.wait_event_timeout(CONFIRM_TIMEOUT) {
        match event {
            Event::StateUpdate {
                frames_received,
                spectra_published,
                frames_dropped,
                ..
            } => info!(
                "{} frames received, {} spectra published, {} dropped by the throttle",
                frames_received, spectra_published, frames_dropped
            ),
            Event::Stopped => break,
            other => debug!("Event: {:?}", other),
        }
    }

    Ok(())
}
