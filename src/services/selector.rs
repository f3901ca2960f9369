//! Candidate selection
//!
//! Bounded selection over the filtered candidate list, either in list order
//! or uniformly at random without replacement (shuffle-then-take, so a pass
//! can never pick the same index twice).

use rand::seq::SliceRandom;

use crate::services::lidarr::Statistics;

/// An entity still has tracks Lidarr knows about but holds no file for
pub fn is_incomplete(stats: &Statistics) -> bool {
    stats.track_count > stats.track_file_count
}

/// Pick at most `limit` candidates from the list
///
/// Random mode shuffles first; sequential mode keeps list order. Returns
/// fewer than `limit` when candidates are exhausted, and nothing for a zero
/// limit.
pub fn select<T>(mut candidates: Vec<T>, limit: usize, random: bool) -> Vec<T> {
    let take = limit.min(candidates.len());
    if take == 0 {
        return Vec::new();
    }
    if random && candidates.len() > 1 {
        candidates.shuffle(&mut rand::thread_rng());
    }
    candidates.truncate(take);
    candidates
}
