//! Binary authenticity classifier using ONNX Runtime via `ort`.
//!
//! Face crops are resized to a fixed square input with pixel values
//! normalized to [0,1] NCHW float32; this preprocessing contract is
//! fixed here rather than left to each caller.

use std::path::Path;

use crate::classification::domain::face_classifier::FaceClassifier;
use crate::shared::constants::CLASSIFIER_INPUT_SIZE;
use crate::shared::frame::Frame;

/// Binary face classifier backed by an ONNX Runtime session.
pub struct OnnxFaceClassifier {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxFaceClassifier {
    /// Load a classifier ONNX model.
    ///
    /// Failure here is a fatal configuration error: no pipeline run
    /// may start without a loaded classifier.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        Ok(Self {
            session,
            input_size: CLASSIFIER_INPUT_SIZE,
        })
    }
}

impl FaceClassifier for OnnxFaceClassifier {
    fn classify(&mut self, face: &Frame) -> Result<f64, Box<dyn std::error::Error>> {
        if face.width() == 0 || face.height() == 0 {
            return Err("cannot classify an empty crop".into());
        }

        let input_tensor = preprocess(face, self.input_size);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("classifier model produced no outputs".into());
        }

        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get output slice")?;

        interpret_output(data)
    }
}

/// Maps raw model output to an authenticity score in [0,1].
///
/// - one value: a probability is passed through, a raw logit gets a
///   sigmoid applied;
/// - two values: softmax, index 0 = real.
fn interpret_output(data: &[f32]) -> Result<f64, Box<dyn std::error::Error>> {
    match data.len() {
        0 => Err("classifier output is empty".into()),
        1 => {
            let v = data[0] as f64;
            if (0.0..=1.0).contains(&v) {
                Ok(v)
            } else {
                Ok(sigmoid(v))
            }
        }
        _ => {
            // [real, fake] logits
            let real = data[0] as f64;
            let fake = data[1] as f64;
            let max = real.max(fake);
            let e_real = (real - max).exp();
            let e_fake = (fake - max).exp();
            Ok(e_real / (e_real + e_fake))
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Resize crop to `size x size` and normalize to [0,1] NCHW float32.
fn preprocess(face: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = face.as_ndarray();
    let src_h = face.height() as usize;
    let src_w = face.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}
