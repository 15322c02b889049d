pub mod aggregator;
pub mod analyze_media_use_case;
pub mod face_crop;
pub mod infrastructure;
pub mod pipeline_executor;
pub mod pipeline_logger;
pub mod verdict;
