//! Component A: the frame summarizer.
//!
//! `viddup-core` never decodes video itself. It only defines the boundary
//! (`FrameSource`) at which an external decoder hands over decoded frames,
//! and reduces whatever it receives to a brightness sequence.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::CoreError;

/// One decoded frame, reduced to the flat list of sample values a decoder
/// exposes for it (e.g. all R/G/B or all luma samples). No colorimetric
/// weighting is applied here or anywhere downstream; the mean is taken over
/// whatever values the source provides, so two distinct decoders agree on
/// bit-exact brightness given the same decoded pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    pub samples: Vec<f64>,
}

impl Frame {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    /// Arithmetic mean over all pixel-channel values.
    fn brightness(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }
}

/// The decoder boundary. Implementations live outside this crate; callers
/// supply one (e.g. an ffmpeg- or gstreamer-backed adapter).
pub trait FrameSource {
    /// Declared frames per second of the underlying stream.
    fn fps(&self) -> f64;
    /// Declared total frame count, used only for diagnostics; the summarizer
    /// does not require it to be exact.
    fn declared_frame_count(&self) -> usize;
    /// Declared duration, in seconds.
    fn duration_secs(&self) -> f64;
    /// Pull the next decoded frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, CoreError>;
}

/// The dense per-frame brightness sequence produced by the summarizer,
/// paired with the timing metadata needed by every downstream component.
#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessSequence {
    pub values: Vec<f64>,
    pub fps: f64,
    pub duration_secs: f64,
}

/// Reduce a frame source to a brightness sequence.
///
/// A recoverable decode error mid-stream truncates the sequence to whatever
/// was collected so far rather than failing the whole file. Cancellation
/// aborts immediately and propagates.
pub fn summarize_brightness(
    source: &mut dyn FrameSource,
    cancelled: &AtomicBool,
) -> Result<BrightnessSequence, CoreError> {
    let fps = source.fps();
    let duration_secs = source.duration_secs();
    let mut values = Vec::with_capacity(source.declared_frame_count());

    loop {
        if cancelled.load(Ordering::Relaxed) {
            return Err(CoreError::Cancelled);
        }
        match source.next_frame() {
            Ok(Some(frame)) => values.push(frame.brightness()),
            Ok(None) => break,
            Err(err) => {
                log::warn!("frame source terminated early: {err}");
                break;
            }
        }
    }

    Ok(BrightnessSequence {
        values,
        fps,
        duration_secs,
    })
}

/// An in-memory `FrameSource` used throughout the test suite, and available
/// for any downstream crate's tests as well.
pub struct InMemoryFrameSource {
    fps: f64,
    duration_secs: f64,
    frames: std::vec::IntoIter<Frame>,
    declared_frame_count: usize,
    fail_after: Option<usize>,
    emitted: usize,
}

impl InMemoryFrameSource {
    pub fn from_brightness(values: &[f64], fps: f64) -> Self {
        let frames: Vec<Frame> = values.iter().map(|v| Frame::new(vec![*v])).collect();
        let declared_frame_count = frames.len();
        let duration_secs = declared_frame_count as f64 / fps;
        Self {
            fps,
            duration_secs,
            frames: frames.into_iter(),
            declared_frame_count,
            fail_after: None,
            emitted: 0,
        }
    }

    /// Simulate a recoverable decode failure after `n` frames.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl FrameSource for InMemoryFrameSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn declared_frame_count(&self) -> usize {
        self.declared_frame_count
    }

    fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CoreError> {
        if let Some(limit) = self.fail_after {
            if self.emitted >= limit {
                return Err(CoreError::FrameSource("simulated decode failure".into()));
            }
        }
        self.emitted += 1;
        Ok(self.frames.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_plain_brightness() {
        let mut src = InMemoryFrameSource::from_brightness(&[1.0, 2.0, 3.0], 25.0);
        let cancelled = AtomicBool::new(false);
        let seq = summarize_brightness(&mut src, &cancelled).unwrap();
        assert_eq!(seq.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(seq.fps, 25.0);
    }

    #[test]
    fn truncates_on_recoverable_decode_error() {
        let mut src = InMemoryFrameSource::from_brightness(&[1.0, 2.0, 3.0, 4.0], 25.0)
            .failing_after(2);
        let cancelled = AtomicBool::new(false);
        let seq = summarize_brightness(&mut src, &cancelled).unwrap();
        assert_eq!(seq.values, vec![1.0, 2.0]);
    }

    #[test]
    fn aborts_on_cancellation() {
        let mut src = InMemoryFrameSource::from_brightness(&[1.0, 2.0, 3.0], 25.0);
        let cancelled = AtomicBool::new(true);
        let result = summarize_brightness(&mut src, &cancelled);
        assert!(matches!(result, Err(CoreError::Cancelled)));
    }

    #[test]
    fn multi_channel_frame_mean_has_no_colorimetric_weighting() {
        let frame = Frame::new(vec![0.0, 255.0, 255.0]);
        assert!((frame.brightness() - 170.0).abs() < 1e-9);
    }
}
