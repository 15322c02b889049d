use std::path::{Path, PathBuf};

/// What kind of media the user selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video { duration_millis: u64 },
}

/// The user-selected input to a pipeline run.
///
/// Immutable; owned by the caller and passed by reference into the
/// pipeline. For videos the caller supplies the container duration
/// (see `probe_duration_millis` in the ffmpeg sampler).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaItem {
    kind: MediaKind,
    source_path: PathBuf,
}

impl MediaItem {
    pub fn image(source_path: impl Into<PathBuf>) -> Self {
        Self {
            kind: MediaKind::Image,
            source_path: source_path.into(),
        }
    }

    pub fn video(source_path: impl Into<PathBuf>, duration_millis: u64) -> Self {
        Self {
            kind: MediaKind::Video { duration_millis },
            source_path: source_path.into(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Number of frames a sampler will emit at the given stride.
    ///
    /// Videos yield one frame per full stride step; the trailing
    /// partial interval is not sampled, so a 2500 ms video at a
    /// 1000 ms stride yields 2 frames (t=0 and t=1000).
    pub fn expected_frame_count(&self, stride_millis: u64) -> usize {
        match self.kind {
            MediaKind::Image => 1,
            MediaKind::Video { duration_millis } => {
                if stride_millis == 0 {
                    0
                } else {
                    (duration_millis / stride_millis) as usize
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_image_ignores_stride() {
        let media = MediaItem::image("/tmp/photo.jpg");
        assert_eq!(media.expected_frame_count(1000), 1);
        assert_eq!(media.expected_frame_count(1), 1);
    }

    #[rstest]
    #[case::exact_multiple(3000, 1000, 3)]
    #[case::trailing_partial_omitted(2500, 1000, 2)]
    #[case::just_under_one_stride(999, 1000, 0)]
    #[case::exactly_one_stride(1000, 1000, 1)]
    #[case::zero_duration(0, 1000, 0)]
    fn test_video_frame_count(
        #[case] duration: u64,
        #[case] stride: u64,
        #[case] expected: usize,
    ) {
        let media = MediaItem::video("/tmp/clip.mp4", duration);
        assert_eq!(media.expected_frame_count(stride), expected);
    }

    #[test]
    fn test_zero_stride_yields_no_frames() {
        let media = MediaItem::video("/tmp/clip.mp4", 5000);
        assert_eq!(media.expected_frame_count(0), 0);
    }

    #[test]
    fn test_kind_and_path() {
        let media = MediaItem::video("/tmp/clip.mp4", 2000);
        assert_eq!(
            media.kind(),
            MediaKind::Video {
                duration_millis: 2000
            }
        );
        assert_eq!(media.source_path(), Path::new("/tmp/clip.mp4"));
    }
}
