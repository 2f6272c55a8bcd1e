use crate::{
    annotator::{Decision, evaluate},
    verdict::{Category, VerdictSequence},
};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Run of consecutive seconds blurred for the same category, `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedSegment {
    pub start: u64,
    pub end: u64,
    pub category: Category,
    pub peak_confidence: f64,
}

pub fn flagged_segments(verdicts: &VerdictSequence) -> Vec<FlaggedSegment> {
    let mut segments: Vec<FlaggedSegment> = Vec::new();

    for (second, verdict) in (0u64..).zip(verdicts.iter()) {
        let Decision::Blur {
            category,
            confidence,
        } = evaluate(verdict)
        else {
            continue;
        };

        match segments.last_mut() {
            Some(last) if last.end == second && last.category == category => {
                last.end = second + 1;
                last.peak_confidence = last.peak_confidence.max(confidence);
            }
            _ => segments.push(FlaggedSegment {
                start: second,
                end: second + 1,
                category,
                peak_confidence: confidence,
            }),
        }
    }

    segments
}

/// Format the analysis as human-readable markdown
pub fn format_analysis_readable(
    verdicts: &VerdictSequence,
    final_decision: Option<&str>,
) -> String {
    let segments = flagged_segments(verdicts);
    let flagged: u64 = segments.iter().map(|s| s.end - s.start).sum();

    let mut output = String::new();
    output.push_str("# Moderation report\n\n");
    output.push_str(&format!(
        "**Seconds analyzed:** {} | **Flagged:** {} | **Service decision:** {}\n\n",
        verdicts.len(),
        flagged,
        final_decision.unwrap_or("n/a")
    ));

    output.push_str("## Detections\n\n");
    for category in Category::PRIORITY {
        let seconds: u64 = segments
            .iter()
            .filter(|s| s.category == category)
            .map(|s| s.end - s.start)
            .sum();
        output.push_str(&format!("• {}: {}s\n", category, seconds));
    }
    output.push('\n');

    if !segments.is_empty() {
        output.push_str("## Flagged segments\n\n");
        for segment in &segments {
            let start = format_timestamp(segment.start as f64);
            let end = format_timestamp(segment.end as f64);
            output.push_str(&format!(
                "### [{}–{}] {} (peak {:.2})\n",
                start, end, segment.category, segment.peak_confidence
            ));
        }
        output.push('\n');
    }

    output
}
