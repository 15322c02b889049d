pub mod onnx_blazeface_localizer;
