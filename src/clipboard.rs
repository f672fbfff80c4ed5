use anyhow::{Context, Result};
use arboard::Clipboard;
#[cfg(target_os = "linux")]
use arboard::SetExtLinux;

pub const DAEMON_FLAG: &str = "__clipboard_daemon";

/// Destination for the rendered blob. The host only ever talks to this trait.
pub trait ClipboardSink: Send {
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard. On Linux the contents are handed to a detached
/// copy of this binary that keeps them alive after we exit.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        copy_text_to_clipboard(text)
    }
}

#[cfg(target_os = "linux")]
fn run_daemon_mode() -> Result<()> {
    let text = std::io::read_to_string(std::io::stdin())?;

    let mut clipboard = Clipboard::new()?;
    // Blocks until another application takes ownership of the selection.
    clipboard
        .set()
        .wait()
        .text(text)
        .context("clipboard daemon could not own the selection")?;
    Ok(())
}

/// Checks if the DAEMON_FLAG is present in args. If so, runs in daemon mode.
/// Returns Ok(true) if daemon mode was run, Ok(false) otherwise.
pub fn check_and_run_daemon_if_requested() -> Result<bool> {
    if std::env::args().any(|a| a == DAEMON_FLAG) {
        #[cfg(target_os = "linux")]
        {
            run_daemon_mode()?;
            return Ok(true);
        }
        #[cfg(not(target_os = "linux"))]
        {
            eprintln!(
                "Warning: {} flag used on non-Linux system. Ignoring.",
                DAEMON_FLAG
            );
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn copy_text_to_clipboard(text: &str) -> Result<()> {
    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard = Clipboard::new().context("clipboard unavailable")?;
        clipboard.set_text(text.to_owned())?;
    }

    #[cfg(target_os = "linux")]
    {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let mut child = Command::new(std::env::current_exe()?)
            .arg(DAEMON_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .current_dir("/")
            .spawn()
            .context("failed to start clipboard daemon")?;

        let Some(mut stdin) = child.stdin.take() else {
            anyhow::bail!("Failed to get stdin for clipboard daemon");
        };
        stdin.write_all(text.as_bytes())?;
        stdin.flush()?;
        tracing::debug!(pid = child.id(), bytes = text.len(), "handed blob to clipboard daemon");
    }
    Ok(())
}
