pub mod frame_sampler;
