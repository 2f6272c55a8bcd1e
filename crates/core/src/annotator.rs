//! Maps frames onto verdict seconds and decides whether they are shown blurred.
//!
//! The decision is only recomputed on the first frame of each second and held
//! for the rest of it.

use std::{fmt, num::NonZeroU32};

use crate::verdict::{Category, THRESHOLD, Verdict, VerdictSequence};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Decision {
    #[default]
    Clean,
    Blur { category: Category, confidence: f64 },
}

impl Decision {
    pub fn is_blur(&self) -> bool {
        matches!(self, Decision::Blur { .. })
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            Decision::Clean => None,
            Decision::Blur { category, .. } => Some(*category),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Clean => f.write_str("clean"),
            Decision::Blur {
                category,
                confidence,
            } => write!(f, "blur: {category} detected (confidence {confidence:.2})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Annotation {
    /// Not a second boundary; the previous decision carries over.
    Hold(Decision),
    Recomputed { second: u64, decision: Decision },
    /// The boundary second has no verdict. Playback ends here.
    Exhausted { second: u64 },
}

pub fn second_of(frame_index: u64, fps: NonZeroU32) -> u64 {
    frame_index / u64::from(fps.get())
}

pub fn is_second_boundary(frame_index: u64, fps: NonZeroU32) -> bool {
    frame_index % u64::from(fps.get()) == 0
}

/// First category in priority order that is flagged above [`THRESHOLD`].
pub fn evaluate(verdict: &Verdict) -> Decision {
    verdict
        .detections()
        .into_iter()
        .find(|(_, detection)| detection.triggers(THRESHOLD))
        .map(|(category, detection)| Decision::Blur {
            category,
            confidence: detection.confidence,
        })
        .unwrap_or(Decision::Clean)
}

pub fn annotate(
    frame_index: u64,
    fps: NonZeroU32,
    verdicts: &VerdictSequence,
    previous: Decision,
) -> Annotation {
    if !is_second_boundary(frame_index, fps) {
        return Annotation::Hold(previous);
    }

    let second = second_of(frame_index, fps);
    match verdicts.get(second) {
        Some(verdict) => Annotation::Recomputed {
            second,
            decision: evaluate(verdict),
        },
        None => Annotation::Exhausted { second },
    }
}
