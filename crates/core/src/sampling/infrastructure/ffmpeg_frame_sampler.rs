use std::path::Path;

use crate::error::AnalysisError;
use crate::sampling::domain::frame_sampler::{FrameSampler, SamplePlan};
use crate::shared::frame::Frame;
use crate::shared::media_item::MediaItem;

/// Samples video frames at a fixed temporal stride via ffmpeg-next.
///
/// One frame is emitted per full stride step `k * stride` for
/// `k in 0..duration/stride`; the trailing partial interval is not
/// sampled. Each target timestamp is seeked to independently, so a
/// corrupt region of the file fails only the frames inside it.
pub struct FfmpegFrameSampler {
    stride_millis: u64,
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    video_stream_index: usize,
    targets: Vec<u64>,
}

// Safety: FfmpegFrameSampler is only used from a single thread at a
// time. The raw pointers inside ffmpeg types are not shared across
// threads.
unsafe impl Send for FfmpegFrameSampler {}

impl FfmpegFrameSampler {
    pub fn new(stride_millis: u64) -> Self {
        Self {
            stride_millis,
            input_ctx: None,
            video_stream_index: 0,
            targets: Vec::new(),
        }
    }
}

impl FrameSampler for FfmpegFrameSampler {
    fn open(&mut self, media: &MediaItem) -> Result<SamplePlan, AnalysisError> {
        let path = media.source_path();
        let media_err = |message: String| AnalysisError::MediaAccess {
            path: path.to_path_buf(),
            message,
        };

        ffmpeg_next::init().map_err(|e| media_err(e.to_string()))?;

        let ictx = ffmpeg_next::format::input(path).map_err(|e| media_err(e.to_string()))?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| media_err("no video stream found".to_string()))?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| media_err(e.to_string()))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| media_err(e.to_string()))?;

        let frame_count = media.expected_frame_count(self.stride_millis);
        self.targets = (0..frame_count as u64)
            .map(|k| k * self.stride_millis)
            .collect();
        self.video_stream_index = video_stream_index;

        let plan = SamplePlan {
            frame_count,
            width: decoder.width(),
            height: decoder.height(),
        };
        self.input_ctx = Some(ictx);
        Ok(plan)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(ictx) = self.input_ctx.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegFrameSampler: not opened".into())));
        };

        match StridedFrameIter::new(ictx, self.video_stream_index, &self.targets) {
            Ok(iter) => Box::new(iter),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input_ctx = None;
        self.targets.clear();
    }
}

/// Reads the container duration in milliseconds.
///
/// Used by callers to build a [`MediaItem`] for a video file before
/// the pipeline run starts.
pub fn probe_duration_millis(path: &Path) -> Result<u64, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;
    let ictx = ffmpeg_next::format::input(path)?;

    // Container duration is in AV_TIME_BASE (microsecond) units.
    let duration = ictx.duration();
    if duration < 0 {
        return Err("media has no duration".into());
    }
    Ok(duration as u64 / 1000)
}

/// Seeks to each target timestamp in turn and decodes the first frame
/// at or after it.
///
/// Seeking lands on the keyframe at or before the target, so the
/// decoder has to run forward through intervening frames; anything
/// with a presentation timestamp below the target is dropped.
struct StridedFrameIter<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    time_base: ffmpeg_next::Rational,
    width: u32,
    height: u32,
    video_stream_index: usize,
    targets: &'a [u64],
    position: usize,
}

impl<'a> StridedFrameIter<'a> {
    fn new(
        ictx: &'a mut ffmpeg_next::format::context::Input,
        video_stream_index: usize,
        targets: &'a [u64],
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("no video stream found")?;
        let time_base = stream.time_base();
        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            time_base,
            width,
            height,
            video_stream_index,
            targets,
            position: 0,
        })
    }

    fn decode_at(&mut self, timestamp_millis: u64) -> Result<Frame, Box<dyn std::error::Error>> {
        // Seek positions are in AV_TIME_BASE (microsecond) units.
        let ts = (timestamp_millis * 1000) as i64;
        self.ictx.seek(ts, ..ts)?;
        self.decoder.flush();

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                if let Some(frame) = self.try_receive(timestamp_millis)? {
                    return Ok(frame);
                }
                return Err(format!("no frame decodable at {timestamp_millis}ms").into());
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }

            if let Some(frame) = self.try_receive(timestamp_millis)? {
                return Ok(frame);
            }
        }
    }

    /// Drains decoded frames, dropping those before `target_millis`,
    /// and converts the first one at or after it.
    fn try_receive(
        &mut self,
        target_millis: u64,
    ) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            if !reaches_target(decoded.timestamp(), self.time_base, target_millis) {
                continue;
            }
            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
            self.scaler.run(&decoded, &mut rgb_frame)?;
            let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
            return Ok(Some(Frame::new(
                pixels,
                self.width,
                self.height,
                3,
                self.position,
                self.targets[self.position],
            )));
        }
        Ok(None)
    }
}

/// Converts a stream-timebase pts to milliseconds.
fn pts_to_millis(pts: i64, time_base: ffmpeg_next::Rational) -> i64 {
    if time_base.denominator() == 0 {
        return 0;
    }
    let seconds = pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64;
    (seconds * 1000.0).round() as i64
}

/// Whether a decoded frame's timestamp has reached the seek target.
///
/// A frame without a timestamp cannot be placed relative to the
/// target and is emitted rather than dropped.
fn reaches_target(pts: Option<i64>, time_base: ffmpeg_next::Rational, target_millis: u64) -> bool {
    match pts {
        Some(pts) => pts_to_millis(pts, time_base) >= target_millis as i64,
        None => true,
    }
}

impl Iterator for StridedFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.targets.len() {
            return None;
        }
        let timestamp = self.targets[self.position];
        let result = self.decode_at(timestamp);
        self.position += 1;
        Some(result)
    }
}

/// Copies pixel rows out of an ffmpeg RGB frame, dropping the
/// per-row padding ffmpeg may add for alignment.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
