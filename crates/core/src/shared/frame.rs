use ndarray::ArrayView3;

/// One sampled frame: contiguous RGB bytes in row-major order.
///
/// Carries the temporal position the frame was sampled at so the
/// verdict can report results per timestamp. Format conversion
/// happens at I/O boundaries only; the pipeline treats pixel data
/// as opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    sequence_index: usize,
    timestamp_millis: u64,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        sequence_index: usize,
        timestamp_millis: u64,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            sequence_index,
            timestamp_millis,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// 0-based position in sampling order.
    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    /// Sampling timestamp; 0 for still images.
    pub fn timestamp_millis(&self) -> u64 {
        self.timestamp_millis
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
