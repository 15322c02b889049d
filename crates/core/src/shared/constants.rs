pub const DETECTOR_MODEL_NAME: &str = "blazeface_short_range.onnx";
pub const DETECTOR_MODEL_URL: &str =
    "https://github.com/deepcheck/deepcheck/releases/download/v0.1.0/blazeface_short_range.onnx";

pub const CLASSIFIER_MODEL_NAME: &str = "df_efficientnet_b0.onnx";
pub const CLASSIFIER_MODEL_URL: &str =
    "https://github.com/deepcheck/deepcheck/releases/download/v0.1.0/df_efficientnet_b0.onnx";

/// Temporal distance between sampled video frames.
pub const DEFAULT_STRIDE_MILLIS: u64 = 1000;

/// Fixed classifier input resolution. Face crops are resized to this
/// square size with pixel values normalized to [0, 1].
pub const CLASSIFIER_INPUT_SIZE: u32 = 256;

/// Presentation threshold: mean score at or above this reads as "real".
pub const DEFAULT_REAL_THRESHOLD: f64 = 0.5;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
