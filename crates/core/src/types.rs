//! Response payloads of the video moderation endpoint.

use serde::{Deserialize, Serialize};

use crate::verdict::{Detection, Verdict, VerdictSequence};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoAnalysis {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<ServiceError>,
    #[serde(default)]
    pub task_call: String,
    #[serde(default)]
    pub nb_images: u64,
    #[serde(default)]
    pub final_decision: Option<String>,
    #[serde(default)]
    pub confidence_score_decision: f64,
    #[serde(default)]
    pub nb_images_ok: u64,
    #[serde(default)]
    pub nb_images_ko: u64,
    #[serde(default)]
    pub media: Option<MediaInfo>,
    #[serde(default)]
    pub total_compute_time: f64,
    #[serde(default)]
    pub images_results: Vec<ImageResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub url_video: String,
    #[serde(default)]
    pub file_video: String,
    #[serde(default)]
    pub media_id: String,
    #[serde(default)]
    pub reference_id: String,
    #[serde(default)]
    pub origin_id: String,
}

/// One sampled second. The three detection objects are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub final_decision: Option<String>,
    pub porn_detection: PornDetection,
    pub gore_detection: GoreDetection,
    pub drug_detection: DrugDetection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PornDetection {
    pub porn_content: bool,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoreDetection {
    pub gore_content: bool,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugDetection {
    pub drug_content: bool,
    pub confidence_score: f64,
}

impl From<&ImageResult> for Verdict {
    fn from(result: &ImageResult) -> Self {
        Verdict {
            porn: Detection::new(
                result.porn_detection.porn_content,
                result.porn_detection.confidence_score,
            ),
            gore: Detection::new(
                result.gore_detection.gore_content,
                result.gore_detection.confidence_score,
            ),
            drug: Detection::new(
                result.drug_detection.drug_content,
                result.drug_detection.confidence_score,
            ),
        }
    }
}

impl VideoAnalysis {
    pub fn is_failure(&self) -> bool {
        self.status.as_deref() == Some("failure")
    }

    pub fn failure_reason(&self) -> String {
        self.error
            .as_ref()
            .and_then(|e| e.error_msg.clone())
            .unwrap_or_else(|| "no error message".to_string())
    }

    pub fn verdicts(&self) -> VerdictSequence {
        self.images_results.iter().map(Verdict::from).collect::<Vec<_>>().into()
    }
}
