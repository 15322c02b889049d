use crate::error::AnalysisError;
use crate::shared::frame::Frame;
use crate::shared::media_item::MediaItem;

/// What a sampler intends to emit for an opened media item.
///
/// `frame_count` is the planned number of frames (not a promise:
/// individual timestamps may still fail to decode and be skipped).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplePlan {
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
}

/// Turns a media item into an ordered sequence of frames.
///
/// Implementations handle I/O details (container format, seeking,
/// decoding) while the pipeline works with the abstract [`Frame`].
/// A decode failure at one timestamp yields `Err` for that frame
/// only; the iterator continues with later timestamps.
pub trait FrameSampler: Send {
    /// Opens the media item and returns the sampling plan.
    ///
    /// Failure here is a run-level media access error, not a
    /// per-frame one.
    fn open(&mut self, media: &MediaItem) -> Result<SamplePlan, AnalysisError>;

    /// Returns an iterator over frames in sampling order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the sampler.
    fn close(&mut self);
}
