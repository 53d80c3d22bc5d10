use std::path::Path;

use anyhow::{Result, bail};
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Infected,
    /// No scanner configured or the binary is not installed.
    Skipped,
}

/// Runs an external ClamAV-style scanner (`<command> <path>`) over uploads.
pub struct VirusScanner {
    command: Option<String>,
}

impl VirusScanner {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }

    pub async fn scan(&self, path: &Path) -> Result<ScanVerdict> {
        let Some(command) = &self.command else {
            return Ok(ScanVerdict::Skipped);
        };

        let output = match Command::new(command).arg(path).output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} not installed, skipping virus scan", command);
                return Ok(ScanVerdict::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let verdict = classify(output.status.code(), &stdout)?;
        debug!("Scanned {}: {:?}", path.display(), verdict);
        Ok(verdict)
    }
}

/// Map the scanner's exit code and stdout to a verdict.
///
/// Exit 1 or a `FOUND` line means infected. Exit 2 (scanner-side error)
/// is tolerated. Any other non-zero exit is a failed scan.
pub fn classify(code: Option<i32>, stdout: &str) -> Result<ScanVerdict> {
    if code == Some(1) || stdout.contains("FOUND") {
        return Ok(ScanVerdict::Infected);
    }
    match code {
        Some(0) => Ok(ScanVerdict::Clean),
        Some(2) => {
            warn!("Virus scanner reported an error (exit 2), accepting upload");
            Ok(ScanVerdict::Clean)
        }
        other => bail!("virus scanner exited with {:?}", other),
    }
}
