pub mod ffmpeg_frame_sampler;
pub mod image_frame_sampler;
