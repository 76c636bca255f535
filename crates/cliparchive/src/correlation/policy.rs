use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::events::{EventRecord, TimeWindow};

/// How to pick one match when several overlap a clip.
///
/// Ties are always broken by earlier start, then lower id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Smallest distance between the match start and the clip window start.
    #[default]
    NearestStart,
    /// Largest intersection with the clip window.
    LongestOverlap,
}

impl MatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPolicy::NearestStart => "nearest_start",
            MatchPolicy::LongestOverlap => "longest_overlap",
        }
    }

    pub fn select<'a>(
        &self,
        window: &TimeWindow,
        candidates: &'a [EventRecord],
    ) -> Option<&'a EventRecord> {
        match self {
            MatchPolicy::NearestStart => candidates.iter().min_by_key(|e| {
                let distance = (e.start - window.start()).num_milliseconds().abs();
                (distance, e.start, e.id)
            }),
            MatchPolicy::LongestOverlap => candidates
                .iter()
                .filter_map(|e| window.overlap_duration(&e.window()).map(|d| (d, e)))
                .min_by_key(|(d, e)| (Reverse(*d), e.start, e.id))
                .map(|(_, e)| e),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest_start" => Ok(MatchPolicy::NearestStart),
            "longest_overlap" => Ok(MatchPolicy::LongestOverlap),
            other => Err(format!("unknown match policy '{}'", other)),
        }
    }
}
