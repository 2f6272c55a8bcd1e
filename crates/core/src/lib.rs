//! Arkangel Core Library
//!
//! Uploads a video for content moderation, then replays it with every second
//! the service flagged above threshold blurred.

pub mod annotator;
pub mod blur;
pub mod cache;
pub mod error;
pub mod format;
pub mod media;
pub mod moderation;
pub mod playback;
pub mod provider;
pub mod types;
pub mod verdict;

// Re-export commonly used items at crate root
pub use annotator::{Annotation, Decision, annotate, evaluate, is_second_boundary, second_of};
pub use blur::{BLUR_SIGMA, blur_frame};
pub use cache::{get_analysis_path, get_cache_dir, load_analysis, save_analysis};
pub use error::{ArkangelError, ErrorKind, Result};
pub use format::{FlaggedSegment, flagged_segments, format_analysis_readable, format_timestamp};
pub use media::{FfmpegDecoder, FileSink, NullSink, OutputSink, VideoInfo, WindowSink, probe_video};
pub use moderation::ModerationClient;
pub use playback::{
    FrameRead, FrameSink, FrameSource, PlaybackExit, PlaybackState, PlaybackSummary, SinkSignal,
    play,
};
pub use provider::ProviderConfig;
pub use types::VideoAnalysis;
pub use verdict::{Category, Detection, THRESHOLD, Verdict, VerdictSequence};
