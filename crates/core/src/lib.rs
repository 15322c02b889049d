pub mod classification;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod sampling;
pub mod shared;
