//! The only "decoder" this binary ships. Real frame decoding is explicitly
//! out of scope for the pipeline (see the frame summarizer's contract in
//! `viddup_core::frame`): `FrameSource` is a trait boundary a real caller
//! implements against an actual decoder. This binary instead reads a small
//! JSON sidecar placed next to each video file, produced by whatever
//! external tool already decoded it, and feeds that through the same
//! `FrameSource`/`summarize_brightness` path the library defines -- so the
//! CLI exercises the real component A/B pipeline without this crate taking
//! on a video decoding dependency.

use std::path::Path;
use std::sync::atomic::AtomicBool;

use serde::Deserialize;
use viddup_core::frame::{summarize_brightness, BrightnessSequence, Frame, FrameSource};

#[derive(Debug, Deserialize)]
struct SidecarFile {
    fps: f64,
    duration_secs: f64,
    /// Already-reduced per-frame brightness. Mutually exclusive with
    /// `frames`; if both are present, `frames` takes precedence so that
    /// component A's averaging is genuinely exercised.
    #[serde(default)]
    brightness: Option<Vec<f64>>,
    /// Raw per-frame pixel-channel samples, reduced here the same way a
    /// live decoder's frames would be.
    #[serde(default)]
    frames: Option<Vec<Vec<f64>>>,
}

struct SidecarFrameSource {
    fps: f64,
    duration_secs: f64,
    frames: std::vec::IntoIter<Vec<f64>>,
    declared_frame_count: usize,
}

impl FrameSource for SidecarFrameSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn declared_frame_count(&self) -> usize {
        self.declared_frame_count
    }

    fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, viddup_core::CoreError> {
        Ok(self.frames.next().map(Frame::new))
    }
}

/// The sidecar path convention: `<video path>.viddup.json`.
pub fn sidecar_path(video_path: &Path) -> std::path::PathBuf {
    let mut s = video_path.as_os_str().to_owned();
    s.push(".viddup.json");
    std::path::PathBuf::from(s)
}

/// Load (and, if `frames` was supplied, run through the summarizer) the
/// brightness sequence for one video file's sidecar.
pub fn load_brightness_sequence(
    video_path: &Path,
    cancelled: &AtomicBool,
) -> anyhow::Result<BrightnessSequence> {
    let sidecar_path = sidecar_path(video_path);
    let content = std::fs::read_to_string(&sidecar_path).map_err(|e| {
        anyhow::anyhow!(
            "missing sidecar metadata {}: {e} (no decoder is bundled; ingest expects \
             pre-extracted frame data)",
            sidecar_path.display()
        )
    })?;
    let sidecar: SidecarFile = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("malformed sidecar {}: {e}", sidecar_path.display()))?;

    if let Some(frames) = sidecar.frames {
        let declared_frame_count = frames.len();
        let mut source = SidecarFrameSource {
            fps: sidecar.fps,
            duration_secs: sidecar.duration_secs,
            frames: frames.into_iter(),
            declared_frame_count,
        };
        Ok(summarize_brightness(&mut source, cancelled)?)
    } else if let Some(values) = sidecar.brightness {
        Ok(BrightnessSequence {
            values,
            fps: sidecar.fps,
            duration_secs: sidecar.duration_secs,
        })
    } else {
        Err(anyhow::anyhow!(
            "sidecar {} has neither `frames` nor `brightness`",
            sidecar_path.display()
        ))
    }
}
