//! Fixed-length temporal sampling.
//!
//! A clip of any length is reduced to exactly `count` frames spread evenly
//! from the first frame to the last. Frames that fail to decode are replaced
//! by the most recent good frame so the sequence length never changes.

use tracing::{debug, warn};

use crate::decode::FrameSource;
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::normalize::FrameNormalizer;

/// Frames chosen from a video, already normalized.
#[derive(Debug, Clone)]
pub struct SampledFrames {
    /// Exactly `count` frames, in index order
    pub frames: Vec<Frame>,
    /// Source frame index of each sampling slot
    pub indices: Vec<usize>,
    /// Number of slots filled by repeating an earlier frame after a read failure
    pub duplicated: usize,
}

/// Evenly spaced frame indices over `[0, total_frames - 1]`.
///
/// Slot `i` maps to the last frame that starts strictly before fraction
/// `i / (count - 1)` of the clip, slot 0 to the first frame. The result is
/// non-decreasing and always ends at `total_frames - 1`; short clips produce
/// repeated indices. Every index is within 1 of the exact interpolation
/// `i * (total_frames - 1) / (count - 1)`.
pub fn sample_indices(total_frames: usize, count: usize) -> Vec<usize> {
    if count == 0 || total_frames == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![0];
    }

    let span = count - 1;
    (0..count)
        .map(|i| if i == 0 { 0 } else { (i * total_frames - 1) / span })
        .collect()
}

/// Read and normalize `count` evenly spaced frames from `source`.
pub fn sample_frames<S>(source: &mut S, normalizer: &FrameNormalizer, count: usize) -> MediaResult<SampledFrames>
where
    S: FrameSource + ?Sized,
{
    let total_frames = source.total_frames();
    if total_frames == 0 {
        return Err(MediaError::EmptySource);
    }

    let indices = sample_indices(total_frames, count);
    let mut frames: Vec<Frame> = Vec::with_capacity(count);
    let mut duplicated = 0;

    for &index in &indices {
        match source.read_frame(index) {
            Ok(raw) => frames.push(normalizer.normalize(&raw)),
            Err(e) => {
                let Some(last) = frames.last().cloned() else {
                    debug!(index, error = %e, "First sampled frame unreadable");
                    return Err(MediaError::DecodeFailure { index });
                };
                warn!(index, error = %e, "Frame unreadable, repeating previous frame");
                frames.push(last);
                duplicated += 1;
            }
        }
    }

    // Only reachable when fewer indices than slots were produced.
    while frames.len() < count {
        match frames.last().cloned() {
            Some(last) => frames.push(last),
            None => return Err(MediaError::EmptySource),
        }
    }

    debug!(total_frames, sampled = frames.len(), duplicated, "Sampled video frames");

    Ok(SampledFrames {
        frames,
        indices,
        duplicated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ChannelOrder, RawFrame};
    use std::collections::HashSet;

    /// In-memory source whose frame `i` is a solid color derived from `i`.
    struct FakeSource {
        total: usize,
        failing: HashSet<usize>,
        reads: Vec<usize>,
    }

    impl FakeSource {
        fn new(total: usize) -> Self {
            Self {
                total,
                failing: HashSet::new(),
                reads: Vec::new(),
            }
        }

        fn failing(mut self, indices: &[usize]) -> Self {
            self.failing.extend(indices.iter().copied());
            self
        }
    }

    impl FrameSource for FakeSource {
        fn total_frames(&self) -> usize {
            self.total
        }

        fn read_frame(&mut self, index: usize) -> MediaResult<RawFrame> {
            self.reads.push(index);
            if self.failing.contains(&index) {
                return Err(MediaError::DecodeFailure { index });
            }
            let v = (index % 256) as u8;
            RawFrame::new(4, 4, ChannelOrder::Bgr, vec![v; 4 * 4 * 3])
        }
    }

    fn normalizer() -> FrameNormalizer {
        FrameNormalizer::new(4, 4)
    }

    fn level(frame: &Frame) -> u8 {
        (frame.as_array()[[0, 0, 0]] * 255.0).round() as u8
    }

    #[test]
    fn test_indices_for_300_frames() {
        assert_eq!(
            sample_indices(300, 10),
            vec![0, 33, 66, 99, 133, 166, 199, 233, 266, 299]
        );
    }

    #[test]
    fn test_indices_span_and_order() {
        for total in [10, 11, 17, 64, 299, 1000, 12345] {
            let idx = sample_indices(total, 10);
            assert_eq!(idx.len(), 10);
            assert_eq!(idx[0], 0);
            assert_eq!(idx[9], total - 1);
            assert!(idx.windows(2).all(|w| w[0] <= w[1]), "{total}: {idx:?}");
        }
    }

    #[test]
    fn test_indices_track_exact_interpolation() {
        for total in 1..2000usize {
            let idx = sample_indices(total, 10);
            assert_eq!(idx.len(), 10);
            assert_eq!(idx[0], 0);
            assert_eq!(idx[9], total - 1);
            assert!(idx.windows(2).all(|w| w[0] <= w[1]), "{total}: {idx:?}");
            for (i, &index) in idx.iter().enumerate() {
                let exact = (i * (total - 1)) as f64 / 9.0;
                assert!((index as f64 - exact).abs() <= 1.0, "{total}[{i}]: {index} vs {exact}");
            }
        }
    }

    #[test]
    fn test_indices_for_exact_length_are_identity() {
        assert_eq!(sample_indices(10, 10), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_indices_for_short_clips() {
        assert_eq!(sample_indices(1, 10), vec![0; 10]);

        let idx = sample_indices(3, 10);
        assert_eq!(idx.len(), 10);
        assert_eq!(idx.first(), Some(&0));
        assert_eq!(idx.last(), Some(&2));
        assert!(idx.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_indices_degenerate_counts() {
        assert_eq!(sample_indices(50, 1), vec![0]);
        assert!(sample_indices(50, 0).is_empty());
        assert!(sample_indices(0, 10).is_empty());
    }

    #[test]
    fn test_empty_source() {
        let mut source = FakeSource::new(0);
        let err = sample_frames(&mut source, &normalizer(), 10).unwrap_err();
        assert!(matches!(err, MediaError::EmptySource));
        assert!(source.reads.is_empty());
    }

    #[test]
    fn test_single_frame_clip() {
        let mut source = FakeSource::new(1);
        let sampled = sample_frames(&mut source, &normalizer(), 10).unwrap();

        assert_eq!(sampled.frames.len(), 10);
        assert_eq!(sampled.indices, vec![0; 10]);
        assert_eq!(sampled.duplicated, 0);
        assert!(sampled.frames.iter().all(|f| f == &sampled.frames[0]));
    }

    #[test]
    fn test_reads_sampled_indices() {
        let mut source = FakeSource::new(300);
        let sampled = sample_frames(&mut source, &normalizer(), 10).unwrap();

        assert_eq!(source.reads, sampled.indices);
        let levels: Vec<u8> = sampled.frames.iter().map(level).collect();
        assert_eq!(levels, vec![0, 33, 66, 99, 133, 166, 199, 233, 10, 43]);
    }

    #[test]
    fn test_failure_repeats_previous_frame() {
        let mut source = FakeSource::new(300).failing(&[133, 166]);
        let sampled = sample_frames(&mut source, &normalizer(), 10).unwrap();

        assert_eq!(sampled.frames.len(), 10);
        assert_eq!(sampled.duplicated, 2);
        assert_eq!(level(&sampled.frames[4]), 99);
        assert_eq!(level(&sampled.frames[5]), 99);
        assert_eq!(level(&sampled.frames[6]), 199);
    }

    #[test]
    fn test_failure_before_any_success() {
        let mut source = FakeSource::new(300).failing(&[0]);
        let err = sample_frames(&mut source, &normalizer(), 10).unwrap_err();
        assert!(matches!(err, MediaError::DecodeFailure { index: 0 }));
    }
}
