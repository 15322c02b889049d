use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use deepcheck_core::classification::domain::face_classifier::FaceClassifier;
use deepcheck_core::classification::infrastructure::onnx_face_classifier::OnnxFaceClassifier;
use deepcheck_core::detection::domain::face_localizer::FaceLocalizer;
use deepcheck_core::detection::infrastructure::onnx_blazeface_localizer::OnnxBlazefaceLocalizer;
use deepcheck_core::pipeline::analyze_media_use_case::AnalyzeMediaUseCase;
use deepcheck_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use deepcheck_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use deepcheck_core::pipeline::verdict::{MediaLabel, Verdict};
use deepcheck_core::sampling::domain::frame_sampler::FrameSampler;
use deepcheck_core::sampling::infrastructure::ffmpeg_frame_sampler::{
    probe_duration_millis, FfmpegFrameSampler,
};
use deepcheck_core::sampling::infrastructure::image_frame_sampler::ImageFrameSampler;
use deepcheck_core::shared::constants::{
    CLASSIFIER_MODEL_NAME, CLASSIFIER_MODEL_URL, DEFAULT_REAL_THRESHOLD, DEFAULT_STRIDE_MILLIS,
    DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL, IMAGE_EXTENSIONS,
};
use deepcheck_core::shared::media_item::MediaItem;
use deepcheck_core::shared::model_resolver;

/// Deepfake detection for videos and images.
#[derive(Parser)]
#[command(name = "deepcheck")]
struct Cli {
    /// Input video or image file.
    input: PathBuf,

    /// Milliseconds between sampled video frames.
    #[arg(long, default_value_t = DEFAULT_STRIDE_MILLIS)]
    stride_ms: u64,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Mean score at or above this reads as real (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_REAL_THRESHOLD)]
    threshold: f64,

    /// Write the full verdict as JSON to this file.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Directory with pre-downloaded model files.
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let localizer = build_localizer(&cli)?;
    let classifier = build_classifier(&cli)?;

    let (sampler, media): (Box<dyn FrameSampler>, MediaItem) = if is_image(&cli.input) {
        (
            Box::new(ImageFrameSampler::new()),
            MediaItem::image(&cli.input),
        )
    } else {
        let duration = probe_duration_millis(&cli.input)?;
        (
            Box::new(FfmpegFrameSampler::new(cli.stride_ms)),
            MediaItem::video(&cli.input, duration),
        )
    };

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rAnalyzing frame {current}/{total}");
        true
    });

    let mut use_case = AnalyzeMediaUseCase::new(
        sampler,
        localizer,
        classifier,
        Box::new(ThreadedPipelineExecutor::new()),
        Some(progress),
        None,
    );

    let mut logger = StdoutPipelineLogger::default();
    let verdict = use_case.execute(&media, &mut logger)?;
    eprintln!();

    print_verdict(&verdict, cli.threshold);

    if let Some(json_path) = cli.json {
        let file = std::fs::File::create(&json_path)?;
        serde_json::to_writer_pretty(file, &verdict)?;
        log::info!("Verdict written to {}", json_path.display());
    }

    Ok(())
}

fn print_verdict(verdict: &Verdict, threshold: f64) {
    println!("Source: {}", verdict.source_path.display());
    println!("Frames analyzed: {}", verdict.per_frame_results.len());
    if verdict.frames_skipped > 0 {
        println!("Frames skipped (decode errors): {}", verdict.frames_skipped);
    }
    println!("Faces scored: {}", verdict.faces_considered);

    match (verdict.mean_score, verdict.interpret(threshold)) {
        (Some(mean), Some(label)) => {
            let label_text = match label {
                MediaLabel::Real => "REAL",
                MediaLabel::Fake => "FAKE",
            };
            println!("Authenticity score: {:.1}%", mean * 100.0);
            println!("Verdict: {label_text} (threshold {threshold})");
        }
        _ => {
            println!("Verdict: no faces found, nothing to score");
        }
    }
}

fn build_localizer(cli: &Cli) -> Result<Box<dyn FaceLocalizer>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {DETECTOR_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        DETECTOR_MODEL_NAME,
        DETECTOR_MODEL_URL,
        cli.model_dir.as_deref(),
        Some(Box::new(|d, t| download_progress("face detection", d, t))),
    )?;
    eprintln!();

    Ok(Box::new(OnnxBlazefaceLocalizer::new(
        &model_path,
        cli.confidence,
    )?))
}

fn build_classifier(cli: &Cli) -> Result<Box<dyn FaceClassifier>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {CLASSIFIER_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        CLASSIFIER_MODEL_NAME,
        CLASSIFIER_MODEL_URL,
        cli.model_dir.as_deref(),
        Some(Box::new(|d, t| download_progress("classifier", d, t))),
    )?;
    eprintln!();

    Ok(Box::new(OnnxFaceClassifier::new(&model_path)?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.stride_ms == 0 {
        return Err("Stride must be at least 1 millisecond".into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.threshold) {
        return Err(format!(
            "Threshold must be between 0.0 and 1.0, got {}",
            cli.threshold
        )
        .into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(what: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {what} model... {pct}%");
    } else {
        eprint!("\rDownloading {what} model... {downloaded} bytes");
    }
}
