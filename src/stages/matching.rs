use super::timed;
use crate::algorithms::{DescriptorMatcher, DistanceNorm, SelectionPolicy};
use crate::detected_points::Match;
use crate::error::Result;
use crate::frame_buffer::FrameBuffer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub match_count: usize,
    pub match_time_ms: f64,
}

impl MatchOutcome {
    /// Stand-in for frames without a predecessor.
    pub const NONE: MatchOutcome = MatchOutcome {
        match_count: 0,
        match_time_ms: 0.0,
    };
}

/// Applies the selection policy to per-query candidate lists.
///
/// With the ratio policy a query with a single candidate is kept only when
/// the train set has a single row; otherwise there is no second distance to
/// test against and the query is rejected. A query whose two best distances
/// are both zero is rejected.
pub fn select_matches(
    candidates: Vec<Vec<Match>>,
    policy: SelectionPolicy,
    train_rows: usize,
) -> Vec<Match> {
    candidates
        .into_iter()
        .filter_map(|c| match (policy, c.as_slice()) {
            (_, []) => None,
            (SelectionPolicy::NearestNeighbor, [best, ..]) => Some(*best),
            (SelectionPolicy::KnnRatio { .. }, [best]) => (train_rows < 2).then_some(*best),
            (SelectionPolicy::KnnRatio { threshold }, [best, second, ..]) => {
                (best.distance < threshold * second.distance).then_some(*best)
            }
        })
        .collect()
}

/// Matches the previous frame (query) against the current frame (train).
pub struct MatchingStage<'a> {
    matcher: &'a dyn DescriptorMatcher,
    norm: DistanceNorm,
    selection: SelectionPolicy,
}

impl<'a> MatchingStage<'a> {
    pub fn new(
        matcher: &'a dyn DescriptorMatcher,
        norm: DistanceNorm,
        selection: SelectionPolicy,
    ) -> MatchingStage<'a> {
        MatchingStage {
            matcher,
            norm,
            selection,
        }
    }

    /// Matches the two most recent frames and stores the result on the
    /// latest one. Returns `None` without touching the matcher while fewer
    /// than two frames are buffered.
    pub fn run(&self, buffer: &mut FrameBuffer) -> Result<Option<MatchOutcome>> {
        if buffer.len() < 2 {
            return Ok(None);
        }
        let (previous, current) = buffer.latest_pair()?;
        let query = previous.descriptors()?;
        let train = current.descriptors()?;
        let k = match self.selection {
            SelectionPolicy::NearestNeighbor => 1,
            SelectionPolicy::KnnRatio { .. } => 2,
        };
        let (matches, match_time_ms) = timed(|| -> Result<Vec<Match>> {
            let candidates = self.matcher.knn_match(query, train, k, self.norm)?;
            Ok(select_matches(candidates, self.selection, train.rows()))
        });
        let matches = matches?;
        log::debug!(
            "#4 : MATCH KEYPOINT DESCRIPTORS done, {} matches ({:.3} ms)",
            matches.len(),
            match_time_ms
        );
        let outcome = MatchOutcome {
            match_count: matches.len(),
            match_time_ms,
        };
        buffer.latest_mut()?.matches = Some(matches);
        Ok(Some(outcome))
    }
}
