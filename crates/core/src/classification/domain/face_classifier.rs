use crate::shared::frame::Frame;

/// Domain interface for face authenticity classification.
///
/// Takes a cropped face and returns a scalar in [0,1], higher = more
/// likely real. A failed call marks that face as
/// [`ScoreStatus::Failed`](crate::pipeline::verdict::ScoreStatus) and
/// excludes it from the mean; it never aborts the run. Implementations
/// may be stateful, hence `&mut self`; the pipeline issues at most one
/// call at a time per instance.
pub trait FaceClassifier: Send {
    fn classify(&mut self, face: &Frame) -> Result<f64, Box<dyn std::error::Error>>;
}
