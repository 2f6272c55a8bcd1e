use std::num::NonZeroU32;

use image::RgbImage;

use crate::{
    annotator::{Annotation, Decision, annotate},
    blur::blur_frame,
    error::Result,
    format::format_timestamp,
    verdict::VerdictSequence,
};

/// Outcome of a single decoder read.
#[derive(Debug)]
pub enum FrameRead {
    Frame(RgbImage),
    /// Unreadable or empty frame. It still occupies a frame slot.
    Glitch,
    EndOfStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkSignal {
    Continue,
    /// The viewer asked to stop (window closed, key pressed).
    Stop,
}

pub trait FrameSource {
    async fn read_frame(&mut self) -> Result<FrameRead>;
}

pub trait FrameSink {
    async fn present(&mut self, frame: &RgbImage) -> Result<SinkSignal>;

    /// Flush and release the presentation layer once playback is over.
    async fn finish(&mut self) -> Result<()>;
}

/// Loop-local state. Never shared outside [`play`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackState {
    pub frame_index: u64,
    pub decision: Decision,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackExit {
    VerdictsExhausted {
        second: u64,
    },
    UserStopped,
    #[default]
    EndOfStream,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSummary {
    /// Frame slots consumed, glitches included.
    pub frames_consumed: u64,
    pub frames_presented: u64,
    pub frames_blurred: u64,
    pub glitches: u64,
    /// Decision taken at each second boundary, in order.
    pub seconds: Vec<(u64, Decision)>,
    pub exit: PlaybackExit,
}

impl PlaybackSummary {
    pub fn blurred_seconds(&self) -> usize {
        self.seconds.iter().filter(|(_, d)| d.is_blur()).count()
    }
}

fn log_decision(second: u64, decision: &Decision) {
    let at = format_timestamp(second as f64);
    if decision.is_blur() {
        log::warn!("[{at}] second {second}: {decision}");
    } else {
        log::info!("[{at}] second {second}: {decision}");
    }
}

/// Read, annotate, blur and present frames one at a time until the verdicts
/// run out, the viewer stops, or the decoder reaches the end of the stream.
pub async fn play<S, K>(
    source: &mut S,
    sink: &mut K,
    verdicts: &VerdictSequence,
    fps: NonZeroU32,
) -> Result<PlaybackSummary>
where
    S: FrameSource,
    K: FrameSink,
{
    let mut state = PlaybackState::default();
    let mut summary = PlaybackSummary::default();

    let exit = loop {
        let frame = match source.read_frame().await? {
            FrameRead::EndOfStream => break PlaybackExit::EndOfStream,
            FrameRead::Glitch => None,
            FrameRead::Frame(frame) => Some(frame),
        };

        match annotate(state.frame_index, fps, verdicts, state.decision) {
            Annotation::Hold(_) => {}
            Annotation::Recomputed { second, decision } => {
                log_decision(second, &decision);
                summary.seconds.push((second, decision));
                state.decision = decision;
            }
            Annotation::Exhausted { second } => {
                log::info!(
                    "[{}] second {second}: no verdict, stopping playback",
                    format_timestamp(second as f64)
                );
                break PlaybackExit::VerdictsExhausted { second };
            }
        }

        let Some(frame) = frame else {
            log::debug!("frame {} unreadable, skipping", state.frame_index);
            summary.glitches += 1;
            state.frame_index += 1;
            continue;
        };

        let shown = if state.decision.is_blur() {
            summary.frames_blurred += 1;
            blur_frame(&frame)
        } else {
            frame
        };

        let signal = sink.present(&shown).await?;
        summary.frames_presented += 1;
        state.frame_index += 1;

        if signal == SinkSignal::Stop {
            break PlaybackExit::UserStopped;
        }
    };

    sink.finish().await?;

    summary.frames_consumed = state.frame_index;
    summary.exit = exit;
    Ok(summary)
}
