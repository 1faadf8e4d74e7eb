//! Per-frame processing steps. A frame always goes through detection, then
//! description, then (once a predecessor is buffered) matching.

pub mod description;
pub mod detection;
pub mod matching;

use std::time::Instant;

pub use description::{DescriptionOutcome, DescriptionStage};
pub use detection::{DetectionOutcome, DetectionStage};
pub use matching::{MatchOutcome, MatchingStage, select_matches};

/// Runs `f` and returns its output with the elapsed wall time in ms.
pub(crate) fn timed<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let now = Instant::now();
    let out = f();
    (out, now.elapsed().as_secs_f64() * 1000.0)
}
