use std::{io::ErrorKind, path::Path, process::Stdio};

use image::RgbImage;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, ChildStdout, Command},
};

use crate::{
    error::{ArkangelError, Result},
    media::{VideoInfo, probe_video},
    playback::{FrameRead, FrameSource},
};

/// Splits a packed rgb24 byte stream into frames.
///
/// A short final read is reported as one glitch, as is a read error. Either
/// way the stream is considered finished afterwards.
pub struct RawFrameReader<R> {
    reader: R,
    info: VideoInfo,
    finished: bool,
}

impl<R: AsyncRead + Unpin> RawFrameReader<R> {
    pub fn new(reader: R, info: VideoInfo) -> Self {
        Self {
            reader,
            info,
            finished: false,
        }
    }
}

impl<R: AsyncRead + Unpin> FrameSource for RawFrameReader<R> {
    async fn read_frame(&mut self) -> Result<FrameRead> {
        if self.finished {
            return Ok(FrameRead::EndOfStream);
        }

        let frame_len = self.info.frame_len();
        let mut buf = vec![0u8; frame_len];
        let mut filled = 0;

        while filled < frame_len {
            match self.reader.read(&mut buf[filled..]).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("decoder read failed: {e}");
                    self.finished = true;
                    return Ok(FrameRead::Glitch);
                }
            }
        }

        if filled == 0 {
            self.finished = true;
            return Ok(FrameRead::EndOfStream);
        }

        if filled < frame_len {
            log::warn!("truncated frame: {filled} of {frame_len} bytes");
            self.finished = true;
            return Ok(FrameRead::Glitch);
        }

        Ok(RgbImage::from_raw(self.info.width, self.info.height, buf)
            .map(FrameRead::Frame)
            .unwrap_or(FrameRead::Glitch))
    }
}

/// Decodes a video file to raw frames through an ffmpeg child process.
pub struct FfmpegDecoder {
    child: Child,
    frames: RawFrameReader<ChildStdout>,
}

impl FfmpegDecoder {
    /// Probe and open a video. Fails before any frame is produced if the file
    /// is missing or has no decodable video stream.
    pub async fn open(video_path: &Path) -> Result<Self> {
        let info = probe_video(video_path).await?;

        let mut child = Command::new("ffmpeg")
            .arg("-v")
            .arg("error")
            .arg("-nostdin")
            .arg("-noautorotate")
            .arg("-i")
            .arg(video_path)
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ArkangelError::ToolFailed {
                program: "ffmpeg".to_string(),
                reason: e.to_string(),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| ArkangelError::ToolFailed {
            program: "ffmpeg".to_string(),
            reason: "stdout was not captured".to_string(),
        })?;

        log::debug!("decoding {} at {}", video_path.display(), info.size_arg());

        Ok(Self {
            child,
            frames: RawFrameReader::new(stdout, info),
        })
    }

    pub fn info(&self) -> VideoInfo {
        self.frames.info
    }
}

impl FrameSource for FfmpegDecoder {
    async fn read_frame(&mut self) -> Result<FrameRead> {
        let read = self.frames.read_frame().await?;

        if matches!(read, FrameRead::EndOfStream) {
            match self.child.wait().await {
                Ok(status) if !status.success() => {
                    log::warn!("ffmpeg decoder exited with {status}")
                }
                Err(e) => log::warn!("could not reap ffmpeg decoder: {e}"),
                _ => {}
            }
        }

        Ok(read)
    }
}
