use crate::error::AnalysisError;
use crate::sampling::domain::frame_sampler::{FrameSampler, SamplePlan};
use crate::shared::frame::Frame;
use crate::shared::media_item::MediaItem;

/// Adapts a single image file to the [`FrameSampler`] interface.
///
/// Emits exactly one frame with timestamp 0 and sequence index 0,
/// letting the pipeline treat images and videos uniformly.
///
/// Uses ffmpeg for decoding, which handles every format the video
/// path does and is faster than pure-Rust decoders on large photos.
pub struct ImageFrameSampler {
    frame: Option<Frame>,
}

impl ImageFrameSampler {
    pub fn new() -> Self {
        Self { frame: None }
    }
}

impl Default for ImageFrameSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSampler for ImageFrameSampler {
    fn open(&mut self, media: &MediaItem) -> Result<SamplePlan, AnalysisError> {
        let path = media.source_path();
        let media_err = |message: String| AnalysisError::MediaAccess {
            path: path.to_path_buf(),
            message,
        };

        let frame = decode_image(path).map_err(|e| media_err(e.to_string()))?;
        let plan = SamplePlan {
            frame_count: 1,
            width: frame.width(),
            height: frame.height(),
        };
        self.frame = Some(frame);
        Ok(plan)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.frame.is_none() {
            return Box::new(std::iter::once(Err("ImageFrameSampler: not opened".into())));
        }
        Box::new(self.frame.take().into_iter().map(Ok))
    }

    fn close(&mut self) {
        self.frame = None;
    }
}

fn decode_image(path: &std::path::Path) -> Result<Frame, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;

    let mut ictx = ffmpeg_next::format::input(path)?;

    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or("no image data found")?;
    let video_stream_index = stream.index();

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
    let mut decoder = codec_ctx.decoder().video()?;

    let width = decoder.width();
    let height = decoder.height();

    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        width,
        height,
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )?;

    for (stream, packet) in ictx.packets() {
        if stream.index() != video_stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        if let Some(frame) = receive_rgb_frame(&mut decoder, &mut scaler, width, height)? {
            return Ok(frame);
        }
    }

    // Flush for formats that buffer the single frame
    let _ = decoder.send_eof();
    receive_rgb_frame(&mut decoder, &mut scaler, width, height)?
        .ok_or_else(|| "failed to decode image".into())
}

fn receive_rgb_frame(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    if decoder.receive_frame(&mut decoded).is_ok() {
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&decoded, &mut rgb_frame)?;

        let stride = rgb_frame.stride(0);
        let data = rgb_frame.data(0);
        let w = width as usize;
        let h = height as usize;
        let mut pixels = Vec::with_capacity(w * h * 3);
        for row in 0..h {
            let row_start = row * stride;
            pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
        }

        Ok(Some(Frame::new(pixels, width, height, 3, 0, 0)))
    } else {
        Ok(None)
    }
}
