use std::{path::Path, process::Stdio};

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::{self, ChildStderr},
};
use tokio_util::sync::CancellationToken;

use crate::errors::ConversionError;

/// Turns an input video into a square video note
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ConversionError>;
}

/// Runs an external ffmpeg binary
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: String,
    size: u32,
}

impl Ffmpeg {
    pub fn new(program: impl Into<String>, size: u32) -> Self {
        Self {
            program: program.into(),
            size,
        }
    }
}

/// Center-crop to a square, scale to `size`x`size`, yuv420p, audio copied as is.
pub fn circular_args(input: &str, output: &str, size: u32) -> Vec<String> {
    vec![
        "-i".to_string(),
        input.to_string(),
        "-vf".to_string(),
        format!("crop=min(iw\\,ih):min(iw\\,ih),scale={size}:{size},format=yuv420p"),
        "-c:a".to_string(),
        "copy".to_string(),
        "-y".to_string(),
        output.to_string(),
    ]
}

#[async_trait]
impl Transcoder for Ffmpeg {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ConversionError> {
        let input = input.to_str().ok_or(ConversionError::NonUtf8Path)?;
        let output = output.to_str().ok_or(ConversionError::NonUtf8Path)?;

        let mut child = process::Command::new(&self.program)
            .args(circular_args(input, output, self.size))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ConversionError::Spawn)?;

        // ffmpeg stalls once the stderr pipe fills up, so it is drained while we wait.
        let progress = child.stderr.take().map(|s| tokio::spawn(log_ffmpeg_output(s)));

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Cancelling ffmpeg for {}", input);
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to kill ffmpeg: {}", e);
                }
                if let Some(task) = progress {
                    let _ = task.await;
                }
                return Err(ConversionError::Cancelled);
            }
            status = child.wait() => status.map_err(ConversionError::Spawn)?,
        };

        if let Some(task) = progress {
            let _ = task.await;
        }

        if !status.success() {
            return Err(ConversionError::FfmpegFailed(status));
        }

        Ok(())
    }
}

async fn log_ffmpeg_output(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => log::debug!("ffmpeg: {}", line),
            Ok(None) => break,
            Err(e) => {
                log::warn!("Failed to read ffmpeg output: {}", e);
                break;
            }
        }
    }
}
