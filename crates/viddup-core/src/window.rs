//! Component E: the window assembler.
//!
//! Projects a file's scene fingerprints into fixed-length windows suitable
//! as ANN query vectors, trimming the file's edges and enforcing the scene
//! cap within each window independently.

use crate::config::WindowConfig;
use crate::model::Fingerprint;

/// One assembled window: `L` scene-gap values plus the frame at which the
/// window begins, used to recover a playback offset later.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledWindow {
    pub first_frame: usize,
    pub values: Vec<f64>,
}

/// Assemble all windows for one file's fingerprints.
///
/// Returns an empty vector if fewer than 5 fingerprints survive trimming, or
/// if fewer than `L` survive (no full window can be built).
pub fn assemble_windows(
    fingerprints: &[Fingerprint],
    fps: f64,
    duration_secs: f64,
    config: &WindowConfig,
) -> Vec<AssembledWindow> {
    let min_frame = (config.trim_start_secs * fps).floor() as i64;
    let max_frame = ((duration_secs - config.trim_end_secs) * fps).floor();
    let max_frame = if max_frame < 0.0 { -1 } else { max_frame as i64 };

    let trimmed: Vec<Fingerprint> = fingerprints
        .iter()
        .copied()
        .filter(|fp| fp.frame as i64 >= min_frame && fp.frame as i64 <= max_frame)
        .collect();

    if trimmed.len() < 5 || trimmed.len() < config.window_len {
        return Vec::new();
    }

    let l = config.window_len;
    let mut windows = Vec::with_capacity(trimmed.len() - l + 1);

    for start in 0..=(trimmed.len() - l) {
        let mut values: Vec<f64> = trimmed[start..start + l].iter().map(|fp| fp.value).collect();
        apply_scene_cap(&mut values, config.scene_cap_secs);
        windows.push(AssembledWindow {
            first_frame: trimmed[start].frame,
            values,
        });
    }

    windows
}

/// Zero every entry after the running sum first exceeds `scene_cap_secs`.
/// The entry that crosses the cap is kept; only later entries are zeroed.
/// This is a test-before-increment loop on purpose: the comparison happens
/// against the sum accumulated *before* folding in the current entry.
fn apply_scene_cap(values: &mut [f64], scene_cap_secs: f64) {
    let mut running_sum = 0.0;
    let mut capped = false;
    for v in values.iter_mut() {
        if capped {
            *v = 0.0;
            continue;
        }
        if running_sum > scene_cap_secs {
            capped = true;
            *v = 0.0;
            continue;
        }
        running_sum += *v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(frame: usize, value: f64) -> Fingerprint {
        Fingerprint { frame, value }
    }

    fn fingerprints(n: usize) -> Vec<Fingerprint> {
        (0..n).map(|i| fp(i * 10, 1.0)).collect()
    }

    #[test]
    fn fewer_than_five_yields_no_windows() {
        let config = WindowConfig {
            window_len: 10,
            ..WindowConfig::default()
        };
        let windows = assemble_windows(&fingerprints(4), 25.0, 600.0, &config);
        assert!(windows.is_empty());
    }

    #[test]
    fn fewer_than_window_len_yields_no_windows() {
        let config = WindowConfig {
            window_len: 10,
            ..WindowConfig::default()
        };
        let windows = assemble_windows(&fingerprints(8), 25.0, 600.0, &config);
        assert!(windows.is_empty());
    }

    #[test]
    fn produces_sliding_windows_of_exact_length() {
        let config = WindowConfig {
            window_len: 5,
            scene_cap_secs: 1000.0,
            ..WindowConfig::default()
        };
        let fps = fingerprints(10);
        let windows = assemble_windows(&fps, 25.0, 600.0, &config);
        assert_eq!(windows.len(), 6); // 10 - 5 + 1
        assert!(windows.iter().all(|w| w.values.len() == 5));
        assert_eq!(windows[0].first_frame, 0);
        assert_eq!(windows[1].first_frame, 10);
    }

    #[test]
    fn trim_removes_out_of_range_fingerprints() {
        let config = WindowConfig {
            window_len: 5,
            scene_cap_secs: 1000.0,
            trim_start_secs: 5.0, // 5s * 25fps = 125 frames
            trim_end_secs: 0.0,
            ..WindowConfig::default()
        };
        let fps = fingerprints(20); // frames 0,10,...,190
        let windows = assemble_windows(&fps, 25.0, 800.0, &config);
        assert!(windows.iter().all(|w| w.first_frame >= 125));
    }

    #[test]
    fn scene_cap_zeroes_entries_after_crossing_but_keeps_the_crossing_entry() {
        let values = vec![2.0, 2.0, 2.0, 2.0, 2.0];
        let mut v = values.clone();
        apply_scene_cap(&mut v, 5.0);
        // running sum before each entry: 0, 2, 4, 6(>5 -> cap starting here)
        assert_eq!(v, vec![2.0, 2.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn scene_cap_no_op_when_never_exceeded() {
        let mut v = vec![1.0, 1.0, 1.0];
        apply_scene_cap(&mut v, 100.0);
        assert_eq!(v, vec![1.0, 1.0, 1.0]);
    }
}
