pub mod bounding_box;
pub mod constants;
pub mod frame;
pub mod media_item;
pub mod model_resolver;
