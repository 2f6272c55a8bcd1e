use std::fmt;

use serde::{Deserialize, Serialize};

/// Confidence a flagged detection must exceed (strictly) to trigger a blur.
pub const THRESHOLD: f64 = 0.80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Porn,
    Gore,
    Drug,
}

impl Category {
    /// Evaluation order. The first qualifying category wins.
    pub const PRIORITY: [Category; 3] = [Category::Porn, Category::Gore, Category::Drug];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Porn => "porn",
            Category::Gore => "gore",
            Category::Drug => "drug",
        }
    }

    /// Task name understood by the moderation service.
    pub fn task(&self) -> &'static str {
        match self {
            Category::Porn => "porn_detection",
            Category::Gore => "gore_detection",
            Category::Drug => "drug_detection",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub flagged: bool,
    pub confidence: f64,
}

impl Detection {
    pub fn new(flagged: bool, confidence: f64) -> Self {
        Self {
            flagged,
            confidence,
        }
    }

    pub fn triggers(&self, threshold: f64) -> bool {
        self.flagged && self.confidence > threshold
    }
}

/// The service's judgment for one second of video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub porn: Detection,
    pub gore: Detection,
    pub drug: Detection,
}

impl Verdict {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn detection(&self, category: Category) -> Detection {
        match category {
            Category::Porn => self.porn,
            Category::Gore => self.gore,
            Category::Drug => self.drug,
        }
    }

    /// Detections in priority order.
    pub fn detections(&self) -> [(Category, Detection); 3] {
        Category::PRIORITY.map(|category| (category, self.detection(category)))
    }
}

/// Per-second verdicts, index 0 covering the first second of the video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerdictSequence(Vec<Verdict>);

impl VerdictSequence {
    pub fn new(verdicts: Vec<Verdict>) -> Self {
        Self(verdicts)
    }

    pub fn get(&self, second: u64) -> Option<&Verdict> {
        usize::try_from(second).ok().and_then(|i| self.0.get(i))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Verdict> {
        self.0.iter()
    }
}

impl From<Vec<Verdict>> for VerdictSequence {
    fn from(verdicts: Vec<Verdict>) -> Self {
        Self::new(verdicts)
    }
}
