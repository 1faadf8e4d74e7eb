use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stages::{DescriptionOutcome, DetectionOutcome, MatchOutcome};

pub const REPORT_SEPARATOR: &str = "--------------------";
pub const REPORT_COLUMNS: &str = "Image#; CarKP; Frame KP; tDet; tDesc; nMatches; tMatch;";

/// Measurements for one frame of one combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameMetrics {
    pub frame_index: usize,
    pub keypoint_count_raw: usize,
    pub keypoint_count_filtered: usize,
    pub detection_time_ms: f64,
    pub description_time_ms: f64,
    pub match_count: usize,
    pub match_time_ms: f64,
}

impl FrameMetrics {
    pub fn from_outcomes(
        frame_index: usize,
        detection: DetectionOutcome,
        description: DescriptionOutcome,
        matching: Option<MatchOutcome>,
    ) -> FrameMetrics {
        let matching = matching.unwrap_or(MatchOutcome::NONE);
        FrameMetrics {
            frame_index,
            keypoint_count_raw: detection.raw_count,
            keypoint_count_filtered: detection.filtered_count,
            detection_time_ms: detection.detection_time_ms,
            description_time_ms: description.description_time_ms,
            match_count: matching.match_count,
            match_time_ms: matching.match_time_ms,
        }
    }

    /// `index;filtered;raw;tDet;tDesc;matches;tMatch`
    pub fn report_row(&self) -> String {
        format!(
            "{};{:04};{:04};{:06.3};{:.3};{:04};{:06.3}",
            self.frame_index,
            self.keypoint_count_filtered,
            self.keypoint_count_raw,
            self.detection_time_ms,
            self.description_time_ms,
            self.match_count,
            self.match_time_ms
        )
    }
}

/// Per-frame metrics of one detector/descriptor pairing, in frame order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationResult {
    pub detector: String,
    pub descriptor: String,
    pub frames: Vec<FrameMetrics>,
}

impl CombinationResult {
    pub fn new(detector: &str, descriptor: &str) -> CombinationResult {
        CombinationResult {
            detector: detector.to_string(),
            descriptor: descriptor.to_string(),
            frames: Vec::new(),
        }
    }

    pub fn record(&mut self, metrics: FrameMetrics) {
        self.frames.push(metrics);
    }

    /// Table header, spelled exactly as downstream report parsers expect it.
    pub fn header(&self) -> String {
        format!("Detector: {}; Decriptor: {}", self.detector, self.descriptor)
    }

    pub fn summary(&self) -> CombinationSummary {
        let n = self.frames.len();
        let mean = |f: &dyn Fn(&FrameMetrics) -> f64| {
            if n == 0 {
                0.0
            } else {
                self.frames.iter().map(f).sum::<f64>() / n as f64
            }
        };
        // the first frame has nothing to match against
        let matched: Vec<&FrameMetrics> = self.frames.iter().skip(1).collect();
        let total_matches = matched.iter().map(|f| f.match_count).sum();
        let (mean_match_time_ms, mean_match_count, mean_match_ratio) = if matched.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let m = matched.len() as f64;
            let ratio = matched
                .iter()
                .map(|f| {
                    if f.keypoint_count_filtered == 0 {
                        0.0
                    } else {
                        f.match_count as f64 / f.keypoint_count_filtered as f64
                    }
                })
                .sum::<f64>()
                / m;
            (
                matched.iter().map(|f| f.match_time_ms).sum::<f64>() / m,
                total_matches as f64 / m,
                ratio,
            )
        };
        CombinationSummary {
            detector: self.detector.clone(),
            descriptor: self.descriptor.clone(),
            frames: n,
            mean_keypoints_filtered: mean(&|f| f.keypoint_count_filtered as f64),
            mean_detection_time_ms: mean(&|f| f.detection_time_ms),
            mean_description_time_ms: mean(&|f| f.description_time_ms),
            mean_match_time_ms,
            total_matches,
            mean_match_count,
            mean_match_ratio,
        }
    }
}

impl fmt::Display for CombinationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", REPORT_SEPARATOR)?;
        writeln!(f, "{}", self.header())?;
        writeln!(f, "{}", REPORT_COLUMNS)?;
        for frame in &self.frames {
            writeln!(f, "{}", frame.report_row())?;
        }
        Ok(())
    }
}

/// Aggregates of a [`CombinationResult`]. Match statistics only cover frames
/// that had a predecessor to match against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationSummary {
    pub detector: String,
    pub descriptor: String,
    pub frames: usize,
    pub mean_keypoints_filtered: f64,
    pub mean_detection_time_ms: f64,
    pub mean_description_time_ms: f64,
    pub mean_match_time_ms: f64,
    pub total_matches: usize,
    pub mean_match_count: f64,
    /// Matches per filtered keypoint of the current frame.
    pub mean_match_ratio: f64,
}

impl CombinationSummary {
    pub fn table_header() -> &'static str {
        "Detector; Descriptor; KP; tDet; tDesc; tMatch; nMatches; ratio;"
    }

    pub fn table_row(&self) -> String {
        format!(
            "{};{};{:.1};{:.3};{:.3};{:.3};{:.1};{:.3}",
            self.detector,
            self.descriptor,
            self.mean_keypoints_filtered,
            self.mean_detection_time_ms,
            self.mean_description_time_ms,
            self.mean_match_time_ms,
            self.mean_match_count,
            self.mean_match_ratio
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCombination {
    pub detector: String,
    pub descriptor: String,
}

/// Outcome of a full sweep. `results` follows the detector-major declaration
/// order with skipped pairings left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub generated_at: String,
    pub results: Vec<CombinationResult>,
    pub skipped: Vec<SkippedCombination>,
}

impl SweepReport {
    pub fn new(results: Vec<CombinationResult>, skipped: Vec<SkippedCombination>) -> SweepReport {
        let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
        SweepReport {
            generated_at: now.to_string(),
            results,
            skipped,
        }
    }

    pub fn summaries(&self) -> Vec<CombinationSummary> {
        self.results.iter().map(CombinationResult::summary).collect()
    }

    /// Summary table, one line per combination.
    pub fn summary_table(&self) -> String {
        let mut s = String::new();
        s += CombinationSummary::table_header();
        s.push('\n');
        for summary in self.summaries() {
            s += &summary.table_row();
            s.push('\n');
        }
        s
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            write!(f, "{}", result)?;
        }
        Ok(())
    }
}
