use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::BoundingBox;

/// Identity of one detected face, unique within a pipeline run.
///
/// Derived from the frame's sampling position and the detection's
/// index within that frame, so re-running a pipeline reproduces the
/// same IDs (no URI string concatenation, no global counters).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceId {
    pub frame_index: usize,
    pub detection_index: usize,
}

/// One located face within a frame.
///
/// Degenerate bounding boxes are discarded before detections are
/// built, so every `FaceDetection` has positive area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub face_id: FaceId,
    pub bounding_box: BoundingBox,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreStatus {
    Ok,
    Failed,
}

/// Result of classifying one detected face.
///
/// `score` is `Some` (in [0,1], higher = more real) iff `status` is
/// `Ok`. Failed scores stay in the per-frame results so a caller can
/// render them distinctly, but they never enter the mean.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceScore {
    pub face_id: FaceId,
    pub score: Option<f64>,
    pub status: ScoreStatus,
}

impl FaceScore {
    pub fn ok(face_id: FaceId, score: f64) -> Self {
        Self {
            face_id,
            score: Some(score),
            status: ScoreStatus::Ok,
        }
    }

    pub fn failed(face_id: FaceId) -> Self {
        Self {
            face_id,
            score: None,
            status: ScoreStatus::Failed,
        }
    }
}

/// Per-frame annotations, in sampling order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub sequence_index: usize,
    pub timestamp_millis: u64,
    pub detections: Vec<FaceDetection>,
    pub scores: Vec<FaceScore>,
}

/// Presentation-level reading of a verdict at a given threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaLabel {
    Real,
    Fake,
}

/// The pipeline's final aggregated output for one media item.
///
/// `mean_score` is the arithmetic mean over Ok face scores only;
/// `None` when no face was scored (never NaN, never a division by
/// zero). Owned by the caller once returned; runs share no state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub source_path: PathBuf,
    pub faces_considered: usize,
    pub mean_score: Option<f64>,
    pub frames_skipped: usize,
    pub per_frame_results: Vec<FrameResult>,
}

impl Verdict {
    /// Applies a caller-chosen threshold: mean at or above reads as
    /// real. `None` when no faces were scored.
    pub fn interpret(&self, threshold: f64) -> Option<MediaLabel> {
        self.mean_score.map(|score| {
            if score >= threshold {
                MediaLabel::Real
            } else {
                MediaLabel::Fake
            }
        })
    }
}
