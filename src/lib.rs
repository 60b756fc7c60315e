//! Voxpipe: signal-controlled voice-to-text for PipeWire
//!
//! This library provides the core functionality for:
//! - Discovering audio input devices (pw-cli, with arecord fallback)
//! - Scoring captures to tell working microphones from silent ones
//! - Recording via a managed pw-record subprocess, toggled by Unix signals
//! - Transcribing speech via whisper-cli or a remote Whisper API
//! - Copying the transcription to the clipboard
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────────┐
//!                     │           Daemon            │
//!                     └─────────────────────────────┘
//!                                   │
//!              ┌────────────────────┼────────────────────┐
//!              │                    │                    │
//!              ▼                    ▼                    ▼
//!      ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//!      │   Signals    │     │   Recorder   │     │   Session    │
//!      │ (USR1/USR2)  │     │ (pw-record)  │     │    State     │
//!      └──────────────┘     └──────────────┘     └──────────────┘
//!                                   │
//!                                   ▼ raw f32 capture
//!                           ┌──────────────┐
//!                           │  Transcribe  │
//!                           │ (cli/remote) │
//!                           └──────────────┘
//!                                   │
//!                                   ▼ text
//!                           ┌──────────────┐
//!                           │  Clipboard   │
//!                           │ wl-copy/xclip│
//!                           └──────────────┘
//! ```
//!
//! Device testing reuses the same recorder discipline: the `devtest`
//! orchestrator records a short capture per discovered device, scores
//! it with `audio::analysis`, and ranks the results.

pub mod audio;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod devtest;
pub mod discovery;
pub mod error;
pub mod output;
pub mod state;
pub mod transcribe;

pub use cli::{Cli, Commands, DevicesAction, EngineArg, RecordAction};
pub use config::Settings;
pub use daemon::Daemon;
pub use error::{Result, VoxpipeError};
