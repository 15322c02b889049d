use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Extracts the face region a bounding box covers, clamped to frame
/// bounds.
///
/// Returns `None` when the clamped region has zero width or height;
/// such detections are discarded entirely (not scored, not counted).
/// The crop keeps the parent frame's sequence index and timestamp so
/// downstream logging can attribute it.
pub fn crop_face(frame: &Frame, bbox: &BoundingBox) -> Option<Frame> {
    let clamped = bbox.clamped(frame.width(), frame.height());
    if clamped.is_degenerate() {
        return None;
    }

    let x1 = clamped.x1 as usize;
    let y1 = clamped.y1 as usize;
    let x2 = (clamped.x2.ceil() as usize).min(frame.width() as usize);
    let y2 = (clamped.y2.ceil() as usize).min(frame.height() as usize);

    let crop_w = x2.saturating_sub(x1);
    let crop_h = y2.saturating_sub(y1);
    if crop_w == 0 || crop_h == 0 {
        return None;
    }

    let channels = frame.channels() as usize;
    let src = frame.as_ndarray();
    let mut data = Vec::with_capacity(crop_w * crop_h * channels);

    for row in y1..y2 {
        for col in x1..x2 {
            for c in 0..channels {
                data.push(src[[row, col, c]]);
            }
        }
    }

    Some(Frame::new(
        data,
        crop_w as u32,
        crop_h as u32,
        frame.channels(),
        frame.sequence_index(),
        frame.timestamp_millis(),
    ))
}
