use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::classification::domain::face_classifier::FaceClassifier;
use crate::detection::domain::face_localizer::FaceLocalizer;
use crate::error::AnalysisError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::verdict::Verdict;
use crate::sampling::domain::frame_sampler::FrameSampler;
use crate::shared::media_item::MediaItem;

/// Per-run execution settings shared by executor implementations.
pub struct PipelineConfig {
    /// Callback `(frames_done, frames_planned) -> keep_going`.
    /// Returning `false` cancels the run.
    pub on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    /// Cooperative cancellation token checked between frames.
    pub cancelled: Arc<AtomicBool>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Strategy interface for driving one analysis run.
///
/// Implementations own the scheduling (sequential, threaded, ...)
/// but must preserve sampling order in the verdict, issue at most
/// one concurrent call per model-service instance, and never let one
/// failed frame or face cancel sibling work.
pub trait PipelineExecutor {
    fn execute(
        &self,
        sampler: Box<dyn FrameSampler>,
        localizer: Box<dyn FaceLocalizer>,
        classifier: Box<dyn FaceClassifier>,
        media: &MediaItem,
        logger: &mut dyn PipelineLogger,
        config: PipelineConfig,
    ) -> Result<Verdict, AnalysisError>;
}
