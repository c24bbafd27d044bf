//! Narrative segments and the timeline that keeps audio and video aligned.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allowed drift between adjacent boundaries and the target duration.
pub const TIMELINE_TOLERANCE_SECS: f64 = 0.01;

/// One timed piece of the narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeSegment {
    pub id: u32,
    pub title: String,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl NarrativeSegment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// A segment as proposed by content generation, before timing is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDraft {
    pub id: u32,
    pub title: String,
    pub text: String,
    /// Relative weight of the segment; only the proportions matter.
    pub estimated_duration_secs: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("Narrative has no segments")]
    Empty,

    #[error("Target duration must be positive, got {0}")]
    InvalidTarget(f64),

    #[error("Segment ids must be strictly ascending (segment {id} follows {previous})")]
    OutOfOrder { previous: u32, id: u32 },

    #[error("Segment {id} has a non-finite boundary ({start}s to {end}s)")]
    NonFinite { id: u32, start: f64, end: f64 },

    #[error("First segment starts at {0}s instead of 0")]
    StartNotZero(f64),

    #[error("Segment {id} ends before it starts ({start}s > {end}s)")]
    NegativeDuration { id: u32, start: f64, end: f64 },

    #[error("Gap or overlap between segment {previous} (ends {end}s) and segment {id} (starts {start}s)")]
    NotContiguous {
        previous: u32,
        end: f64,
        id: u32,
        start: f64,
    },

    #[error("Last segment ends at {actual}s, expected {expected}s")]
    EndMismatch { expected: f64, actual: f64 },
}

fn round_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// Lays the drafts out on a contiguous timeline covering exactly `target_secs`.
///
/// Drafts are ordered by id, each gets a share of the target proportional to
/// its estimate, and the last segment is pinned to the target so rounding
/// never leaves a gap at the end. When every estimate is zero or negative the
/// target is split evenly.
pub fn build_timeline(
    mut drafts: Vec<SegmentDraft>,
    target_secs: f64,
) -> Result<Vec<NarrativeSegment>, TimelineError> {
    if drafts.is_empty() {
        return Err(TimelineError::Empty);
    }
    if !target_secs.is_finite() || target_secs <= 0.0 {
        return Err(TimelineError::InvalidTarget(target_secs));
    }

    drafts.sort_by_key(|d| d.id);
    for pair in drafts.windows(2) {
        if pair[0].id == pair[1].id {
            return Err(TimelineError::OutOfOrder {
                previous: pair[0].id,
                id: pair[1].id,
            });
        }
    }

    let weights: Vec<f64> = drafts
        .iter()
        .map(|d| {
            if d.estimated_duration_secs.is_finite() {
                d.estimated_duration_secs.max(0.0)
            } else {
                0.0
            }
        })
        .collect();
    let total: f64 = weights.iter().sum();
    let even = total <= 0.0;
    let count = drafts.len();

    let mut cursor = 0.0;
    let mut segments = Vec::with_capacity(count);
    for (index, (draft, weight)) in drafts.into_iter().zip(weights).enumerate() {
        let share = if even {
            target_secs / count as f64
        } else {
            target_secs * weight / total
        };
        let end = if index + 1 == count {
            target_secs
        } else {
            round_millis(cursor + share).clamp(cursor, target_secs)
        };
        segments.push(NarrativeSegment {
            id: draft.id,
            title: draft.title,
            text: draft.text,
            start_time: cursor,
            end_time: end,
        });
        cursor = end;
    }

    Ok(segments)
}

/// Checks the ordering and contiguity guarantees of a timeline.
pub fn validate_timeline(
    segments: &[NarrativeSegment],
    target_secs: f64,
) -> Result<(), TimelineError> {
    let first = segments.first().ok_or(TimelineError::Empty)?;
    if !target_secs.is_finite() || target_secs <= 0.0 {
        return Err(TimelineError::InvalidTarget(target_secs));
    }
    // NaN compares false everywhere below, so it has to be caught first
    if let Some(segment) = segments
        .iter()
        .find(|s| !s.start_time.is_finite() || !s.end_time.is_finite())
    {
        return Err(TimelineError::NonFinite {
            id: segment.id,
            start: segment.start_time,
            end: segment.end_time,
        });
    }
    if first.start_time.abs() > TIMELINE_TOLERANCE_SECS {
        return Err(TimelineError::StartNotZero(first.start_time));
    }

    for segment in segments {
        if segment.end_time < segment.start_time {
            return Err(TimelineError::NegativeDuration {
                id: segment.id,
                start: segment.start_time,
                end: segment.end_time,
            });
        }
    }

    for pair in segments.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.id <= prev.id {
            return Err(TimelineError::OutOfOrder {
                previous: prev.id,
                id: next.id,
            });
        }
        if (next.start_time - prev.end_time).abs() > TIMELINE_TOLERANCE_SECS {
            return Err(TimelineError::NotContiguous {
                previous: prev.id,
                end: prev.end_time,
                id: next.id,
                start: next.start_time,
            });
        }
    }

    let last_end = segments.last().map(|s| s.end_time).unwrap_or_default();
    if (last_end - target_secs).abs() > TIMELINE_TOLERANCE_SECS {
        return Err(TimelineError::EndMismatch {
            expected: target_secs,
            actual: last_end,
        });
    }

    Ok(())
}

/// Full narration script: segment texts joined in ascending id order.
pub fn narration_text(segments: &[NarrativeSegment]) -> String {
    let mut ordered: Vec<&NarrativeSegment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.id);
    ordered
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
