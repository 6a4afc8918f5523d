//! Terminal-backed [`NotificationPlatform`] used by the `pharmachain` binary.

use std::io::{BufRead, Write};

use async_trait::async_trait;
use pharmachain_core::config::PermissionMode;
use tracing::info;

use crate::{error::NotifyError, platform::NotificationPlatform, types::PermissionState};

/// Shows reminders as banners on stdout; the fallback alert goes to stderr.
///
/// In `prompt` mode the question is read on a blocking thread that nothing can
/// cancel, so the owning runtime must be shut down with
/// `shutdown_background` rather than dropped.
pub struct ConsolePlatform {
    mode: PermissionMode,
}

impl ConsolePlatform {
    pub fn new(mode: PermissionMode) -> Self {
        Self { mode }
    }
}

#[async_trait]
impl NotificationPlatform for ConsolePlatform {
    fn name(&self) -> &str {
        "console"
    }

    async fn request_permission(&self) -> Result<PermissionState, NotifyError> {
        match self.mode {
            PermissionMode::Granted => Ok(PermissionState::Granted),
            PermissionMode::Denied => Ok(PermissionState::Denied),
            PermissionMode::Prompt => tokio::task::spawn_blocking(prompt_stdin)
                .await
                .map_err(|e| NotifyError::PermissionRequest(e.to_string()))?,
        }
    }

    async fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "\n=== {title} ===\n{body}\n")
            .and_then(|_| out.flush())
            .map_err(|e| NotifyError::ShowFailed(e.to_string()))?;
        info!(%title, "reminder notification shown");
        Ok(())
    }

    fn alert(&self, text: &str) {
        let mut err = std::io::stderr().lock();
        // Nothing left to fall back to if stderr is gone.
        let _ = writeln!(err, "\u{7}\n{text}\n");
        let _ = err.flush();
    }
}

fn prompt_stdin() -> Result<PermissionState, NotifyError> {
    let mut out = std::io::stdout().lock();
    write!(out, "Allow medicine reminder notifications? [y/N] ")
        .and_then(|_| out.flush())
        .map_err(|e| NotifyError::PermissionRequest(e.to_string()))?;
    drop(out);

    let mut line = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| NotifyError::PermissionRequest(e.to_string()))?;
    if read == 0 {
        // stdin closed: nobody is there to answer.
        return Ok(PermissionState::Unknown);
    }
    Ok(parse_answer(&line))
}

fn parse_answer(line: &str) -> PermissionState {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => PermissionState::Granted,
        _ => PermissionState::Denied,
    }
}
