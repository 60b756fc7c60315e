// Command-line interface definitions for voxpipe
//
// This module is separate so it can be used by both the binary
// (main.rs) and build.rs for generating man pages.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "voxpipe")]
#[command(author, version, about = "Signal-controlled voice-to-text daemon for PipeWire")]
#[command(long_about = "
Voxpipe records from a PipeWire audio source on an external signal and
hands the capture to a transcription engine; the text lands on your
clipboard.

SETUP:
  1. Run: voxpipe devices test --all (to find a working microphone)
  2. Run: voxpipe --device <NAME> (saves the device and starts the daemon)
  3. Bind a key to: voxpipe record toggle

USAGE:
  Trigger 'voxpipe record toggle' (or send SIGUSR1/SIGUSR2 to the
  daemon) to start and stop recording. The transcription is copied to
  the clipboard when recording stops.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Audio input device name (saved to the config file for next time)
    #[arg(short, long, value_name = "NAME")]
    pub device: Option<String>,

    /// Transcription model (tiny, base, small, medium, large-v3) or path to a model file
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Transcription engine
    #[arg(long, value_enum, default_value_t = EngineArg::WhisperCli)]
    pub engine: EngineArg,

    /// Endpoint URL for the remote engine (e.g., http://localhost:8080)
    #[arg(long, value_name = "URL")]
    pub remote_endpoint: Option<String>,

    /// Print transcribed text to stdout
    #[arg(long)]
    pub print_text: bool,

    /// Keep the temporary audio file after transcription
    #[arg(long)]
    pub keep_audio: bool,

    /// Show desktop notifications when recording starts/stops
    #[arg(long)]
    pub notify: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Transcription engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    /// whisper-cli subprocess (local, offline)
    WhisperCli,
    /// OpenAI-compatible HTTP API
    Remote,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as daemon (default if no command specified)
    Daemon,

    /// Discover and test audio input devices
    Devices {
        #[command(subcommand)]
        action: DevicesAction,
    },

    /// Show current configuration
    Config,

    /// Control recording from external sources (compositor keybindings, scripts)
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },
}

#[derive(Subcommand)]
pub enum DevicesAction {
    /// List available audio input devices
    List,

    /// Record a short capture from devices and rank them by signal strength
    Test {
        /// Test a specific device (node name); omit with --all to test every device
        #[arg(value_name = "NAME")]
        device: Option<String>,

        /// Test all discovered devices
        #[arg(long)]
        all: bool,

        /// Capture length per device in seconds
        #[arg(long, default_value_t = 3)]
        duration: u64,
    },
}

#[derive(Subcommand)]
pub enum RecordAction {
    /// Start recording (send SIGUSR1 to daemon)
    Start,
    /// Stop recording and transcribe (send SIGUSR2 to daemon)
    Stop,
    /// Toggle recording state
    Toggle,
}
