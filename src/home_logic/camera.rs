//! Capture device seam.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Completion event for one capture attempt.
#[derive(Debug, Clone)]
pub struct CaptureEvent {
    /// Device-reported error, if any. An error still leads to a status
    /// post, just without a photo.
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// File name the device reports having written.
    pub filename: String,
}

#[async_trait]
pub trait CameraPort: Send + Sync {
    /// Takes one photo to the device's configured output path.
    async fn capture(&self) -> Result<CaptureEvent>;
}

/// Camera backed by an external capture command (e.g. `raspistill`). The
/// command is run once per capture with the output path appended.
pub struct ProcessCamera {
    command: String,
    output_path: PathBuf,
}

impl ProcessCamera {
    pub fn new(command: &str, output_path: &Path) -> Self {
        Self {
            command: command.to_string(),
            output_path: output_path.to_path_buf(),
        }
    }
}

#[async_trait]
impl CameraPort for ProcessCamera {
    async fn capture(&self) -> Result<CaptureEvent> {
        let mut words = self.command.split_whitespace();
        let Some(program) = words.next() else {
            bail!("Capture command is empty");
        };

        if let Some(dir) = self.output_path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let output = Command::new(program)
            .args(words)
            .arg("-o")
            .arg(&self.output_path)
            .output()
            .await
            .with_context(|| format!("Failed to run capture command '{program}'"))?;

        let error = if output.status.success() {
            None
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Some(format!("exit {}: {}", output.status, stderr.trim()))
        };

        let filename = self
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(CaptureEvent {
            error,
            timestamp: Utc::now(),
            filename,
        })
    }
}
