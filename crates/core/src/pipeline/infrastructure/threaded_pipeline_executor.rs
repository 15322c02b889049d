use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::classification::domain::face_classifier::FaceClassifier;
use crate::detection::domain::face_localizer::FaceLocalizer;
use crate::error::AnalysisError;
use crate::pipeline::aggregator::ScoreAccumulator;
use crate::pipeline::face_crop::crop_face;
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::verdict::{FaceDetection, FaceId, FaceScore, FrameResult, Verdict};
use crate::sampling::domain::frame_sampler::FrameSampler;
use crate::shared::frame::Frame;
use crate::shared::media_item::MediaItem;

const DEFAULT_CHANNEL_CAPACITY: usize = 4;

/// Executes an analysis run with a dedicated sampling thread.
///
/// Layout: `sampler → main [localize/classify/aggregate]`
///
/// Frame decoding overlaps with inference, while the localizer and
/// classifier stay on the calling thread: the model sessions are not
/// assumed reentrant, so each sees at most one in-flight call. The
/// bounded FIFO channel preserves sampling order, which makes
/// `per_frame_results` deterministic regardless of thread timing.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        mut sampler: Box<dyn FrameSampler>,
        mut localizer: Box<dyn FaceLocalizer>,
        mut classifier: Box<dyn FaceClassifier>,
        media: &MediaItem,
        logger: &mut dyn PipelineLogger,
        config: PipelineConfig,
    ) -> Result<Verdict, AnalysisError> {
        // Media access failures propagate before any thread spawns.
        let plan = sampler.open(media)?;
        let total_frames = plan.frame_count;

        let (frame_tx, frame_rx) =
            crossbeam_channel::bounded::<Result<Frame, String>>(self.channel_capacity);
        let sampler_handle = spawn_sampler(sampler, frame_tx, config.cancelled.clone());

        let mut accumulator = ScoreAccumulator::new();
        let mut per_frame_results: Vec<FrameResult> = Vec::new();
        let mut frames_skipped = 0usize;
        let mut frames_seen = 0usize;
        let mut run_error: Option<AnalysisError> = None;

        for frame_result in &frame_rx {
            if config.cancelled.load(Ordering::Relaxed) {
                run_error = Some(AnalysisError::Cancelled);
                break;
            }

            match frame_result {
                Ok(frame) => {
                    let result = process_frame(
                        &frame,
                        localizer.as_mut(),
                        classifier.as_mut(),
                        &mut accumulator,
                        logger,
                    );
                    per_frame_results.push(result);
                }
                Err(message) => {
                    // One corrupt frame never fails the media item.
                    log::warn!("skipping frame: {message}");
                    frames_skipped += 1;
                }
            }

            frames_seen += 1;
            logger.progress(frames_seen, total_frames);

            if let Some(ref callback) = config.on_progress {
                if !callback(frames_seen, total_frames) {
                    config.cancelled.store(true, Ordering::Relaxed);
                    run_error = Some(AnalysisError::Cancelled);
                    break;
                }
            }
        }

        // Unblock and reap the sampling thread before returning.
        drop(frame_rx);
        match sampler_handle.join() {
            Ok(mut s) => s.close(),
            Err(_) => {
                if run_error.is_none() {
                    run_error = Some(AnalysisError::Thread("sampler".to_string()));
                }
            }
        }

        if let Some(e) = run_error {
            return Err(e);
        }

        logger.summary();

        Ok(Verdict {
            source_path: media.source_path().to_path_buf(),
            faces_considered: accumulator.count(),
            mean_score: accumulator.mean(),
            frames_skipped,
            per_frame_results,
        })
    }
}

fn spawn_sampler(
    mut sampler: Box<dyn FrameSampler>,
    frame_tx: crossbeam_channel::Sender<Result<Frame, String>>,
    cancelled: Arc<AtomicBool>,
) -> std::thread::JoinHandle<Box<dyn FrameSampler>> {
    std::thread::spawn(move || {
        for frame_result in sampler.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let mapped = frame_result.map_err(|e| e.to_string());
            if frame_tx.send(mapped).is_err() {
                break;
            }
        }
        sampler.close();
        sampler
    })
}

/// Localizes and classifies a single frame, folding Ok scores into
/// the run's accumulator.
///
/// Every failure mode below the frame level degrades in place:
/// localization errors record zero detections, degenerate or
/// zero-area boxes are discarded unscored, and classifier errors are
/// tagged `Failed` but kept for display.
fn process_frame(
    frame: &Frame,
    localizer: &mut dyn FaceLocalizer,
    classifier: &mut dyn FaceClassifier,
    accumulator: &mut ScoreAccumulator,
    logger: &mut dyn PipelineLogger,
) -> FrameResult {
    let localize_start = Instant::now();
    let boxes = match localizer.detect(frame) {
        Ok(boxes) => boxes,
        Err(e) => {
            log::warn!(
                "face localization failed on frame {}: {e}",
                frame.sequence_index()
            );
            Vec::new()
        }
    };
    logger.timing("localize", localize_start.elapsed().as_secs_f64() * 1000.0);

    let mut detections = Vec::new();
    let mut scores = Vec::new();
    let mut detection_index = 0usize;

    let classify_start = Instant::now();
    for bbox in boxes {
        if bbox.is_degenerate() {
            log::debug!(
                "discarding degenerate box on frame {}",
                frame.sequence_index()
            );
            continue;
        }
        let Some(crop) = crop_face(frame, &bbox) else {
            continue;
        };

        let face_id = FaceId {
            frame_index: frame.sequence_index(),
            detection_index,
        };
        detection_index += 1;
        detections.push(FaceDetection {
            face_id,
            bounding_box: bbox,
        });

        match classifier.classify(&crop) {
            Ok(score) => {
                accumulator.add(score);
                scores.push(FaceScore::ok(face_id, score));
            }
            Err(e) => {
                log::warn!("classification failed for face {face_id:?}: {e}");
                scores.push(FaceScore::failed(face_id));
            }
        }
    }
    if !detections.is_empty() {
        logger.timing("classify", classify_start.elapsed().as_secs_f64() * 1000.0);
    }

    FrameResult {
        sequence_index: frame.sequence_index(),
        timestamp_millis: frame.timestamp_millis(),
        detections,
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::pipeline::verdict::ScoreStatus;
    use crate::sampling::domain::frame_sampler::SamplePlan;
    use crate::shared::bounding_box::BoundingBox;
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // --- Stubs ---

    struct StubSampler {
        frames: Vec<Result<Frame, String>>,
        plan: SamplePlan,
    }

    impl StubSampler {
        fn new(frames: Vec<Result<Frame, String>>) -> Self {
            let plan = SamplePlan {
                frame_count: frames.len(),
                width: 100,
                height: 100,
            };
            Self { frames, plan }
        }
    }

    impl FrameSampler for StubSampler {
        fn open(&mut self, _media: &MediaItem) -> Result<SamplePlan, AnalysisError> {
            Ok(self.plan)
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(
                self.frames
                    .drain(..)
                    .map(|r| r.map_err(|e| -> Box<dyn std::error::Error> { e.into() })),
            )
        }

        fn close(&mut self) {}
    }

    struct StubLocalizer {
        results: HashMap<usize, Vec<BoundingBox>>,
    }

    impl FaceLocalizer for StubLocalizer {
        fn detect(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            Ok(self
                .results
                .get(&frame.sequence_index())
                .cloned()
                .unwrap_or_default())
        }
    }

    struct FailingLocalizer {
        fail_on: usize,
        inner: StubLocalizer,
    }

    impl FaceLocalizer for FailingLocalizer {
        fn detect(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            if frame.sequence_index() == self.fail_on {
                Err("localizer error".into())
            } else {
                self.inner.detect(frame)
            }
        }
    }

    /// Returns scripted scores in call order; records how many calls
    /// it received.
    struct ScriptedClassifier {
        scores: Vec<Result<f64, String>>,
        calls: Arc<Mutex<usize>>,
    }

    impl ScriptedClassifier {
        fn new(scores: Vec<Result<f64, String>>) -> Self {
            Self {
                scores,
                calls: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl FaceClassifier for ScriptedClassifier {
        fn classify(&mut self, _face: &Frame) -> Result<f64, Box<dyn std::error::Error>> {
            let mut calls = self.calls.lock().unwrap();
            let result = self.scores.get(*calls).cloned().unwrap_or(Ok(0.5));
            *calls += 1;
            result.map_err(|e| -> Box<dyn std::error::Error> { e.into() })
        }
    }

    // --- Helpers ---

    fn make_frame(index: usize, timestamp: u64) -> Frame {
        Frame::new(vec![128; 100 * 100 * 3], 100, 100, 3, index, timestamp)
    }

    fn face_box(offset: f64) -> BoundingBox {
        BoundingBox::new(offset, offset, offset + 20.0, offset + 20.0)
    }

    fn media() -> MediaItem {
        MediaItem::image("/tmp/photo.jpg")
    }

    fn run(
        sampler: StubSampler,
        localizer: impl FaceLocalizer + 'static,
        classifier: impl FaceClassifier + 'static,
        config: PipelineConfig,
    ) -> Result<Verdict, AnalysisError> {
        ThreadedPipelineExecutor::new().execute(
            Box::new(sampler),
            Box::new(localizer),
            Box::new(classifier),
            &media(),
            &mut NullPipelineLogger,
            config,
        )
    }

    // --- Tests ---

    #[test]
    fn test_two_faces_mean_is_arithmetic_average() {
        // Reference scenario: scores 0.9 and 0.3 on a single image
        let mut results = HashMap::new();
        results.insert(0, vec![face_box(10.0), face_box(60.0)]);

        let verdict = run(
            StubSampler::new(vec![Ok(make_frame(0, 0))]),
            StubLocalizer { results },
            ScriptedClassifier::new(vec![Ok(0.9), Ok(0.3)]),
            PipelineConfig::default(),
        )
        .unwrap();

        assert_eq!(verdict.faces_considered, 2);
        assert_relative_eq!(verdict.mean_score.unwrap(), 0.6);
        assert_eq!(verdict.per_frame_results.len(), 1);
        assert_eq!(verdict.per_frame_results[0].detections.len(), 2);
    }

    #[test]
    fn test_zero_faces_yields_undefined_mean() {
        let verdict = run(
            StubSampler::new(vec![Ok(make_frame(0, 0))]),
            StubLocalizer {
                results: HashMap::new(),
            },
            ScriptedClassifier::new(vec![]),
            PipelineConfig::default(),
        )
        .unwrap();

        assert_eq!(verdict.faces_considered, 0);
        assert_eq!(verdict.mean_score, None);
        // The frame entry is still present, with an empty detection list
        assert_eq!(verdict.per_frame_results.len(), 1);
        assert!(verdict.per_frame_results[0].detections.is_empty());
    }

    #[test]
    fn test_decode_failure_skips_frame_but_scores_others() {
        let mut results = HashMap::new();
        results.insert(0, vec![face_box(10.0)]);
        results.insert(2, vec![face_box(10.0)]);

        let verdict = run(
            StubSampler::new(vec![
                Ok(make_frame(0, 0)),
                Err("decode error at 1000ms".to_string()),
                Ok(make_frame(2, 2000)),
            ]),
            StubLocalizer { results },
            ScriptedClassifier::new(vec![Ok(0.8), Ok(0.4)]),
            PipelineConfig::default(),
        )
        .unwrap();

        assert_eq!(verdict.frames_skipped, 1);
        assert_eq!(verdict.faces_considered, 2);
        assert_relative_eq!(verdict.mean_score.unwrap(), 0.6);
        assert_eq!(verdict.per_frame_results.len(), 2);
    }

    #[test]
    fn test_degenerate_boxes_never_reach_classifier() {
        let mut results = HashMap::new();
        results.insert(
            0,
            vec![
                BoundingBox::new(50.0, 50.0, 50.0, 70.0), // zero width
                BoundingBox::new(30.0, 40.0, 60.0, 40.0), // zero height
                face_box(10.0),                           // valid
            ],
        );

        let classifier = ScriptedClassifier::new(vec![Ok(0.7)]);
        let calls = classifier.calls.clone();

        let verdict = run(
            StubSampler::new(vec![Ok(make_frame(0, 0))]),
            StubLocalizer { results },
            classifier,
            PipelineConfig::default(),
        )
        .unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(verdict.faces_considered, 1);
        assert_eq!(verdict.per_frame_results[0].detections.len(), 1);
    }

    #[test]
    fn test_failed_classification_is_tagged_and_excluded() {
        let mut results = HashMap::new();
        results.insert(0, vec![face_box(10.0), face_box(60.0)]);

        let verdict = run(
            StubSampler::new(vec![Ok(make_frame(0, 0))]),
            StubLocalizer { results },
            ScriptedClassifier::new(vec![Ok(0.9), Err("model error".to_string())]),
            PipelineConfig::default(),
        )
        .unwrap();

        // Mean over Ok scores only
        assert_eq!(verdict.faces_considered, 1);
        assert_relative_eq!(verdict.mean_score.unwrap(), 0.9);

        // Both detections and both scores are kept for display
        let frame = &verdict.per_frame_results[0];
        assert_eq!(frame.detections.len(), 2);
        assert_eq!(frame.scores.len(), 2);
        assert_eq!(frame.scores[0].status, ScoreStatus::Ok);
        assert_eq!(frame.scores[1].status, ScoreStatus::Failed);
        assert_eq!(frame.scores[1].score, None);
    }

    #[test]
    fn test_localizer_failure_records_empty_frame_and_continues() {
        let mut results = HashMap::new();
        results.insert(1, vec![face_box(10.0)]);

        let verdict = run(
            StubSampler::new(vec![Ok(make_frame(0, 0)), Ok(make_frame(1, 1000))]),
            FailingLocalizer {
                fail_on: 0,
                inner: StubLocalizer { results },
            },
            ScriptedClassifier::new(vec![Ok(0.2)]),
            PipelineConfig::default(),
        )
        .unwrap();

        assert_eq!(verdict.per_frame_results.len(), 2);
        assert!(verdict.per_frame_results[0].detections.is_empty());
        assert_eq!(verdict.per_frame_results[1].detections.len(), 1);
        assert_eq!(verdict.faces_considered, 1);
    }

    #[test]
    fn test_results_preserve_sampling_order() {
        let frames: Vec<_> = (0..5).map(|i| Ok(make_frame(i, i as u64 * 1000))).collect();

        let verdict = run(
            StubSampler::new(frames),
            StubLocalizer {
                results: HashMap::new(),
            },
            ScriptedClassifier::new(vec![]),
            PipelineConfig::default(),
        )
        .unwrap();

        let indices: Vec<_> = verdict
            .per_frame_results
            .iter()
            .map(|r| r.sequence_index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        let timestamps: Vec<_> = verdict
            .per_frame_results
            .iter()
            .map(|r| r.timestamp_millis)
            .collect();
        assert_eq!(timestamps, vec![0, 1000, 2000, 3000, 4000]);
    }

    #[test]
    fn test_empty_sampling_is_a_valid_run() {
        let verdict = run(
            StubSampler::new(vec![]),
            StubLocalizer {
                results: HashMap::new(),
            },
            ScriptedClassifier::new(vec![]),
            PipelineConfig::default(),
        )
        .unwrap();

        assert_eq!(verdict.faces_considered, 0);
        assert_eq!(verdict.mean_score, None);
        assert!(verdict.per_frame_results.is_empty());
    }

    #[test]
    fn test_face_ids_are_deterministic() {
        let mut results = HashMap::new();
        results.insert(1, vec![face_box(10.0), face_box(60.0)]);

        let verdict = run(
            StubSampler::new(vec![Ok(make_frame(0, 0)), Ok(make_frame(1, 1000))]),
            StubLocalizer { results },
            ScriptedClassifier::new(vec![Ok(0.5), Ok(0.5)]),
            PipelineConfig::default(),
        )
        .unwrap();

        let dets = &verdict.per_frame_results[1].detections;
        assert_eq!(
            dets[0].face_id,
            FaceId {
                frame_index: 1,
                detection_index: 0
            }
        );
        assert_eq!(
            dets[1].face_id,
            FaceId {
                frame_index: 1,
                detection_index: 1
            }
        );
    }

    #[test]
    fn test_rerun_produces_identical_verdict() {
        let build = || {
            let mut results = HashMap::new();
            results.insert(0, vec![face_box(10.0)]);
            results.insert(1, vec![face_box(30.0)]);
            (
                StubSampler::new(vec![Ok(make_frame(0, 0)), Ok(make_frame(1, 1000))]),
                StubLocalizer { results },
                ScriptedClassifier::new(vec![Ok(0.9), Ok(0.1)]),
            )
        };

        let (s1, l1, c1) = build();
        let (s2, l2, c2) = build();
        let first = run(s1, l1, c1, PipelineConfig::default()).unwrap();
        let second = run(s2, l2, c2, PipelineConfig::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cancel_via_on_progress() {
        let frames: Vec<_> = (0..10).map(|i| Ok(make_frame(i, i as u64 * 1000))).collect();

        let result = run(
            StubSampler::new(frames),
            StubLocalizer {
                results: HashMap::new(),
            },
            ScriptedClassifier::new(vec![]),
            PipelineConfig {
                on_progress: Some(Box::new(|current, _total| current < 3)),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(AnalysisError::Cancelled)));
    }

    #[test]
    fn test_cancel_via_atomic_bool() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let frames: Vec<_> = (0..10).map(|i| Ok(make_frame(i, i as u64 * 1000))).collect();

        let result = run(
            StubSampler::new(frames),
            StubLocalizer {
                results: HashMap::new(),
            },
            ScriptedClassifier::new(vec![]),
            PipelineConfig {
                on_progress: Some(Box::new(move |current, _total| {
                    if current >= 2 {
                        flag.store(true, Ordering::Relaxed);
                    }
                    true
                })),
                cancelled,
            },
        );

        assert!(matches!(result, Err(AnalysisError::Cancelled)));
    }

    #[test]
    fn test_progress_reports_planned_total() {
        let progress: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let progress_clone = progress.clone();

        let frames: Vec<_> = (0..3).map(|i| Ok(make_frame(i, i as u64 * 1000))).collect();

        run(
            StubSampler::new(frames),
            StubLocalizer {
                results: HashMap::new(),
            },
            ScriptedClassifier::new(vec![]),
            PipelineConfig {
                on_progress: Some(Box::new(move |current, total| {
                    progress_clone.lock().unwrap().push((current, total));
                    true
                })),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(
            *progress.lock().unwrap(),
            vec![(1, 3), (2, 3), (3, 3)]
        );
    }
}
