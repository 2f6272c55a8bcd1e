use std::{io::ErrorKind, num::NonZeroU32, path::Path};

use image::RgbImage;
use tokio::{
    io::AsyncWriteExt,
    process::{Child, ChildStdin, Command},
};

use crate::{
    error::{ArkangelError, Result},
    media::{VideoInfo, spawn_frame_consumer},
    playback::{FrameSink, SinkSignal},
};

pub const WINDOW_TITLE: &str = "Arkangel";

/// Shows frames in an ffplay window paced at the source frame rate.
///
/// Closing the window (or pressing `q`/`Esc`) ends ffplay, which is reported
/// as a user stop on the next frame.
pub struct WindowSink {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl WindowSink {
    pub fn spawn(info: VideoInfo, fps: NonZeroU32) -> Result<Self> {
        let (child, stdin) = spawn_frame_consumer(
            Command::new("ffplay")
                .arg("-loglevel")
                .arg("error")
                .arg("-autoexit")
                .arg("-window_title")
                .arg(WINDOW_TITLE)
                .arg("-f")
                .arg("rawvideo")
                .arg("-pixel_format")
                .arg("rgb24")
                .arg("-video_size")
                .arg(info.size_arg())
                .arg("-framerate")
                .arg(fps.to_string())
                .arg("-i")
                .arg("-"),
        )?;

        Ok(Self {
            child,
            stdin: Some(stdin),
        })
    }
}

impl FrameSink for WindowSink {
    async fn present(&mut self, frame: &RgbImage) -> Result<SinkSignal> {
        if let Ok(Some(_)) = self.child.try_wait() {
            return Ok(SinkSignal::Stop);
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Ok(SinkSignal::Stop);
        };

        match stdin.write_all(frame.as_raw()).await {
            Ok(()) => Ok(SinkSignal::Continue),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(SinkSignal::Stop),
            Err(e) => Err(e.into()),
        }
    }

    async fn finish(&mut self) -> Result<()> {
        // ffplay drains what it has buffered, then exits on EOF
        drop(self.stdin.take());
        self.child.wait().await?;
        Ok(())
    }
}

/// Encodes the presented frames into a video file, keeping the source audio.
pub struct FileSink {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FileSink {
    pub fn spawn(info: VideoInfo, fps: NonZeroU32, source: &Path, output: &Path) -> Result<Self> {
        let (child, stdin) = spawn_frame_consumer(
            Command::new("ffmpeg")
                .arg("-y")
                .arg("-v")
                .arg("error")
                .arg("-f")
                .arg("rawvideo")
                .arg("-pixel_format")
                .arg("rgb24")
                .arg("-video_size")
                .arg(info.size_arg())
                .arg("-framerate")
                .arg(fps.to_string())
                .arg("-i")
                .arg("-")
                .arg("-i")
                .arg(source)
                .arg("-map")
                .arg("0:v:0")
                .arg("-map")
                .arg("1:a?")
                .arg("-c:v")
                .arg("libx264")
                .arg("-pix_fmt")
                .arg("yuv420p")
                .arg("-c:a")
                .arg("copy")
                .arg("-shortest")
                .arg(output),
        )?;

        Ok(Self {
            child,
            stdin: Some(stdin),
        })
    }
}

impl FrameSink for FileSink {
    async fn present(&mut self, frame: &RgbImage) -> Result<SinkSignal> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ArkangelError::ToolFailed {
                program: "ffmpeg".to_string(),
                reason: "encoder input already closed".to_string(),
            });
        };

        stdin
            .write_all(frame.as_raw())
            .await
            .map_err(|e| ArkangelError::ToolFailed {
                program: "ffmpeg".to_string(),
                reason: format!("encoder stopped accepting frames: {e}"),
            })?;
        Ok(SinkSignal::Continue)
    }

    async fn finish(&mut self) -> Result<()> {
        drop(self.stdin.take());
        let status = self.child.wait().await?;
        if !status.success() {
            return Err(ArkangelError::ToolFailed {
                program: "ffmpeg".to_string(),
                reason: format!("encoder exited with {status}"),
            });
        }
        Ok(())
    }
}

/// Discards frames. Only the decision log is produced.
#[derive(Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    async fn present(&mut self, _frame: &RgbImage) -> Result<SinkSignal> {
        Ok(SinkSignal::Continue)
    }

    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

pub enum OutputSink {
    Window(WindowSink),
    File(FileSink),
    Null(NullSink),
}

impl FrameSink for OutputSink {
    async fn present(&mut self, frame: &RgbImage) -> Result<SinkSignal> {
        match self {
            OutputSink::Window(sink) => sink.present(frame).await,
            OutputSink::File(sink) => sink.present(frame).await,
            OutputSink::Null(sink) => sink.present(frame).await,
        }
    }

    async fn finish(&mut self) -> Result<()> {
        match self {
            OutputSink::Window(sink) => sink.finish().await,
            OutputSink::File(sink) => sink.finish().await,
            OutputSink::Null(sink) => sink.finish().await,
        }
    }
}
