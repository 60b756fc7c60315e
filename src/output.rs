//! Clipboard hand-off for transcribed text
//!
//! The text lands on the system clipboard via whichever tool the
//! session provides: wl-copy on Wayland, xclip or xsel on X11. The
//! chain is ordered by the display-server environment and each tool is
//! tried until one succeeds.

use crate::error::OutputError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Trait for clipboard tool implementations
#[async_trait::async_trait]
pub trait TextOutput: Send + Sync {
    /// Copy text to the clipboard
    async fn copy(&self, text: &str) -> Result<(), OutputError>;

    /// Check if this tool is available
    fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Pipe text into a clipboard command over stdin
async fn pipe_to_command(program: &str, args: &[&str], text: &str) -> Result<(), OutputError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| OutputError::CopyFailed(format!("{}: {}", program, e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| OutputError::CopyFailed(format!("{}: {}", program, e)))?;
        drop(stdin); // EOF
    }

    let status = child
        .wait()
        .await
        .map_err(|e| OutputError::CopyFailed(format!("{}: {}", program, e)))?;

    if !status.success() {
        return Err(OutputError::CopyFailed(format!(
            "{} exited with {}",
            program, status
        )));
    }

    Ok(())
}

/// wl-copy (Wayland)
pub struct WlCopyOutput;

#[async_trait::async_trait]
impl TextOutput for WlCopyOutput {
    async fn copy(&self, text: &str) -> Result<(), OutputError> {
        pipe_to_command("wl-copy", &[], text).await
    }

    fn is_available(&self) -> bool {
        which::which("wl-copy").is_ok()
    }

    fn name(&self) -> &'static str {
        "wl-copy"
    }
}

/// xclip (X11)
pub struct XclipOutput;

#[async_trait::async_trait]
impl TextOutput for XclipOutput {
    async fn copy(&self, text: &str) -> Result<(), OutputError> {
        pipe_to_command("xclip", &["-selection", "clipboard"], text).await
    }

    fn is_available(&self) -> bool {
        which::which("xclip").is_ok()
    }

    fn name(&self) -> &'static str {
        "xclip"
    }
}

/// xsel (X11 fallback)
pub struct XselOutput;

#[async_trait::async_trait]
impl TextOutput for XselOutput {
    async fn copy(&self, text: &str) -> Result<(), OutputError> {
        pipe_to_command("xsel", &["--clipboard", "--input"], text).await
    }

    fn is_available(&self) -> bool {
        which::which("xsel").is_ok()
    }

    fn name(&self) -> &'static str {
        "xsel"
    }
}

/// Build the clipboard tool chain, ordered by display server.
///
/// Wayland sessions try wl-copy first; X11 sessions try xclip/xsel
/// first with wl-copy as the last resort.
pub fn create_output_chain() -> Vec<Box<dyn TextOutput>> {
    let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some();

    if wayland {
        vec![
            Box::new(WlCopyOutput),
            Box::new(XclipOutput),
            Box::new(XselOutput),
        ]
    } else {
        vec![
            Box::new(XclipOutput),
            Box::new(XselOutput),
            Box::new(WlCopyOutput),
        ]
    }
}

/// Try each clipboard tool in the chain until one succeeds
pub async fn copy_with_fallback(
    chain: &[Box<dyn TextOutput>],
    text: &str,
) -> Result<(), OutputError> {
    for output in chain {
        if !output.is_available() {
            tracing::debug!("{} not available, trying next", output.name());
            continue;
        }

        match output.copy(text).await {
            Ok(()) => {
                tracing::info!("Text copied to clipboard ({})", output.name());
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("{} failed: {}, trying next", output.name(), e);
            }
        }
    }

    Err(OutputError::NoToolAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_has_all_tools() {
        let chain = create_output_chain();
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(WlCopyOutput.name(), "wl-copy");
        assert_eq!(XclipOutput.name(), "xclip");
        assert_eq!(XselOutput.name(), "xsel");
    }
}
