//! Voxpipe - signal-controlled voice-to-text daemon for PipeWire
//!
//! Run with `voxpipe` or `voxpipe daemon` to start the daemon.
//! Use `voxpipe devices test --all` to find a working microphone.
//! Use `voxpipe record toggle` to control a running daemon.

use anyhow::Context;
use clap::Parser;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use voxpipe::cli::{Cli, Commands, DevicesAction, EngineArg, RecordAction};
use voxpipe::config::{self, AudioParams, Engine, Settings, StoredConfig, TranscribeSettings};
use voxpipe::discovery::{self, Device};
use voxpipe::{daemon, devtest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("voxpipe={},warn", log_level))),
        )
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .clone()
        .or_else(config::config_file)
        .unwrap_or_else(|| PathBuf::from("voxpipe.toml"));

    // Validation failure is advisory; the daemon still starts with
    // defaults.
    if !StoredConfig::validate(&config_path) {
        tracing::warn!("Configuration file has issues, continuing with defaults...");
    }
    let stored = StoredConfig::load(&config_path);

    let transcribe = TranscribeSettings {
        engine: match cli.engine {
            EngineArg::WhisperCli => Engine::WhisperCli,
            EngineArg::Remote => Engine::Remote,
        },
        model: cli
            .model
            .clone()
            .unwrap_or_else(|| TranscribeSettings::default().model),
        threads: None,
        remote_endpoint: cli.remote_endpoint.clone(),
        remote_timeout_secs: TranscribeSettings::default().remote_timeout_secs,
    };
    let audio_params = AudioParams::from_stored(&stored);

    match cli.command {
        None | Some(Commands::Daemon) => {
            // Device from the command line is saved for next time;
            // otherwise fall back to the stored one.
            let device = match cli.device {
                Some(device) => {
                    if let Err(e) = StoredConfig::save_device(&config_path, &device) {
                        tracing::warn!("Failed to save device to config: {}", e);
                    }
                    device
                }
                None => stored.device.clone().context(
                    "No device specified and no saved configuration found.\n\
                     Run with --device <NAME>, or 'voxpipe devices test --all' to find a working device.",
                )?,
            };

            let settings = Settings {
                device,
                audio: audio_params,
                transcribe,
                keep_audio: cli.keep_audio,
                print_text: cli.print_text,
                notify: cli.notify,
            };

            let mut daemon = daemon::Daemon::new(settings)?;
            daemon.run().await?;
        }

        Some(Commands::Devices { action }) => match action {
            DevicesAction::List => run_devices_list(),
            DevicesAction::Test {
                device,
                all,
                duration,
            } => {
                run_devices_test(device, all, Duration::from_secs(duration), &audio_params).await?;
            }
        },

        Some(Commands::Config) => {
            show_config(&config_path, &stored);
        }

        Some(Commands::Record { action }) => {
            run_record(action)?;
        }
    }

    Ok(())
}

/// List discovered audio input devices
fn run_devices_list() {
    let devices = discovery::discover();
    if devices.is_empty() {
        println!("No audio input devices found.");
        println!("Make sure audio devices are connected and PipeWire/ALSA is running.");
        return;
    }

    println!("Found {} audio input device(s):", devices.len());
    for (i, device) in devices.iter().enumerate() {
        println!("  {}. {}", i + 1, device.display_name);
        println!("     Device: {}", device.node_name);
    }
}

/// Test one or all devices and print the ranked report
async fn run_devices_test(
    device: Option<String>,
    all: bool,
    duration: Duration,
    params: &AudioParams,
) -> anyhow::Result<()> {
    let discovered = discovery::discover();

    let candidates: Vec<Device> = if all {
        if discovered.is_empty() {
            anyhow::bail!(
                "No audio input devices found. \
                 Make sure audio devices are connected and PipeWire/ALSA is running."
            );
        }
        discovered
    } else if let Some(name) = device {
        // Prefer the discovered entry so the report shows its display
        // name; an unknown name is still tested as-is.
        match discovered.into_iter().find(|d| d.node_name == name) {
            Some(found) => vec![found],
            None => vec![Device {
                id: "manual".to_string(),
                node_name: name.clone(),
                display_name: name,
            }],
        }
    } else {
        anyhow::bail!("Specify a device name or use --all to test every device.");
    };

    println!(
        "Testing {} device(s), {}s each. Please speak into the microphone!",
        candidates.len(),
        duration.as_secs()
    );

    let results = devtest::test_all(&candidates, params, duration).await;

    println!("\n=== Test Results Summary ===");
    let working: Vec<_> = results.iter().filter(|r| r.success).collect();

    if working.is_empty() {
        println!("No working devices found!\n");
        println!("All tested devices and their issues:");
        for result in &results {
            println!("  - {}: {}", result.device.display_name, result.details);
        }
        println!("\nIf no devices worked:");
        println!("  - Check your microphone is connected and not muted");
        println!("  - Verify audio permissions for the terminal/application");
        println!("  - Try: pactl list sources | grep -E 'Name:|Description:'");
        return Ok(());
    }

    println!("Found {} working device(s):\n", working.len());
    for (i, result) in working.iter().enumerate() {
        println!("  {}. {}", i + 1, result.device.display_name);
        println!("     Device: {}", result.device.node_name);
        println!("     Signal strength (RMS): {:.6}\n", result.rms);
    }

    println!("Recommended: the device with the highest signal strength.");
    println!("Start the daemon with:");
    println!("    voxpipe --device {}", working[0].device.node_name);

    Ok(())
}

/// Show the effective configuration
fn show_config(config_path: &std::path::Path, stored: &StoredConfig) {
    println!("Config file: {:?}", config_path);
    if config_path.exists() {
        let valid = StoredConfig::validate(config_path);
        println!("Valid: {}", if valid { "yes" } else { "no (using defaults)" });
    } else {
        println!("Valid: file does not exist (using defaults)");
    }

    let params = AudioParams::from_stored(stored);
    println!();
    println!("Device:       {}", stored.device.as_deref().unwrap_or("(not configured)"));
    println!("Sample rate:  {} Hz", params.sample_rate);
    println!("Channels:     {}", params.channels);
    println!("Format:       {}", params.format);
    println!();
    println!("Runtime dir:  {:?}", config::runtime_dir());
    println!("Capture path: {:?}", config::capture_path());
}

/// Send a control signal to the running daemon
fn run_record(action: RecordAction) -> anyhow::Result<()> {
    let pid_path = config::runtime_dir().join("pid");
    let pid_str = std::fs::read_to_string(&pid_path)
        .with_context(|| format!("Cannot read {:?}. Is the daemon running?", pid_path))?;
    let pid: i32 = pid_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid PID file contents: {:?}", pid_str.trim()))?;

    let sig = match action {
        RecordAction::Start => Signal::SIGUSR1,
        RecordAction::Stop => Signal::SIGUSR2,
        RecordAction::Toggle => {
            // The daemon's state file says whether a recording is live.
            let state_path = config::runtime_dir().join("state");
            let state = std::fs::read_to_string(&state_path).unwrap_or_default();
            if state.trim() == "recording" {
                Signal::SIGUSR2
            } else {
                Signal::SIGUSR1
            }
        }
    };

    signal::kill(Pid::from_raw(pid), sig)
        .with_context(|| format!("Failed to signal daemon (pid {})", pid))?;
    tracing::debug!("Sent {:?} to daemon (pid {})", sig, pid);

    Ok(())
}
