use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::classification::domain::face_classifier::FaceClassifier;
use crate::detection::domain::face_localizer::FaceLocalizer;
use crate::error::AnalysisError;
use crate::sampling::domain::frame_sampler::FrameSampler;
use crate::shared::media_item::MediaItem;

use super::pipeline_executor::{PipelineConfig, PipelineExecutor};
use super::pipeline_logger::PipelineLogger;
use super::verdict::Verdict;

/// Orchestrates the full frame-to-verdict analysis of one media item.
///
/// Wires domain components together and delegates execution to a
/// `PipelineExecutor`. This is a single-use struct: `execute` consumes
/// the owned components, so calling it twice will fail.
pub struct AnalyzeMediaUseCase {
    sampler: Option<Box<dyn FrameSampler>>,
    localizer: Option<Box<dyn FaceLocalizer>>,
    classifier: Option<Box<dyn FaceClassifier>>,
    executor: Box<dyn PipelineExecutor>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl AnalyzeMediaUseCase {
    pub fn new(
        sampler: Box<dyn FrameSampler>,
        localizer: Box<dyn FaceLocalizer>,
        classifier: Box<dyn FaceClassifier>,
        executor: Box<dyn PipelineExecutor>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            sampler: Some(sampler),
            localizer: Some(localizer),
            classifier: Some(classifier),
            executor,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(
        &mut self,
        media: &MediaItem,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Verdict, AnalysisError> {
        let config = PipelineConfig {
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
        };

        self.executor.execute(
            self.sampler.take().ok_or(AnalysisError::AlreadyExecuted)?,
            self.localizer.take().ok_or(AnalysisError::AlreadyExecuted)?,
            self.classifier
                .take()
                .ok_or(AnalysisError::AlreadyExecuted)?,
            media,
            logger,
            config,
        )
    }
}
