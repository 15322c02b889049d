use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for face localization.
///
/// Returns zero or more face bounding boxes in original frame pixel
/// coordinates. Zero detections is a normal outcome, not an error.
/// Implementations may be stateful (e.g. a loaded model session),
/// hence `&mut self`; they are not assumed reentrant, and the
/// pipeline issues at most one call at a time per instance.
pub trait FaceLocalizer: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
