//! ffmpeg-backed decoding and presentation.

pub mod decoder;
pub mod sink;

pub use decoder::*;
pub use sink::*;

use std::{path::Path, process::Stdio};

use tokio::process::{Child, ChildStdin, Command};

use crate::error::{ArkangelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
}

impl VideoInfo {
    /// Bytes in one packed rgb24 frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    pub fn size_arg(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Parse `ffprobe -of csv=p=0:s=x` output such as `1920x1080`.
pub fn parse_dimensions(output: &str) -> Option<VideoInfo> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    let mut parts = line.split('x').filter(|p| !p.is_empty());
    let width = parts.next()?.trim().parse().ok()?;
    let height = parts.next()?.trim().parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(VideoInfo { width, height })
}

/// Read the first video stream's dimensions using ffprobe
pub async fn probe_video(video_path: &Path) -> Result<VideoInfo> {
    if !video_path.is_file() {
        return Err(ArkangelError::VideoNotFound {
            path: video_path.to_path_buf(),
        });
    }

    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-select_streams")
        .arg("v:0")
        .arg("-show_entries")
        .arg("stream=width,height")
        .arg("-of")
        .arg("csv=p=0:s=x")
        .arg(video_path)
        .output()
        .await
        .map_err(|e| ArkangelError::ToolFailed {
            program: "ffprobe".to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ArkangelError::VideoOpenFailed {
            path: video_path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_dimensions(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        ArkangelError::VideoOpenFailed {
            path: video_path.to_path_buf(),
            reason: "no video stream".to_string(),
        }
    })
}

/// Spawn a tool that consumes raw frames on stdin.
fn spawn_frame_consumer(command: &mut Command) -> Result<(Child, ChildStdin)> {
    let program = command.as_std().get_program().to_string_lossy().to_string();
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ArkangelError::ToolFailed {
            program: program.clone(),
            reason: e.to_string(),
        })?;

    let stdin = child.stdin.take().ok_or_else(|| ArkangelError::ToolFailed {
        program,
        reason: "stdin was not captured".to_string(),
    })?;

    Ok((child, stdin))
}
