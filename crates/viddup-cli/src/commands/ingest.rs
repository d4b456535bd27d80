//! Component D: the ingest controller. Walks a directory of video files,
//! timing and logging each one (`Instant::elapsed`, `log::info!`/
//! `log::debug!`) as it is decoded, scene-detected, and stored.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use walkdir::WalkDir;

use viddup_core::model::Fingerprint;
use viddup_core::scene::extract_scenes;
use viddup_core::Config;
use viddup_store::Store;

use crate::sidecar;

pub fn run(db_path: &Path, config: &Config, dir: &Path, cancelled: &Arc<AtomicBool>) -> anyhow::Result<()> {
    let mut store = Store::open(db_path, config.store.busy_timeout_ms)
        .map_err(|e| anyhow::anyhow!("failed to open store at {}: {e}", db_path.display()))?;

    let extensions: Vec<String> = config
        .store
        .extensions
        .iter()
        .map(|e| e.to_lowercase())
        .collect();

    let mut ingested = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if cancelled.load(Ordering::Relaxed) {
            log::info!("ingest cancelled by user");
            break;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let has_wanted_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.contains(&e.to_lowercase()))
            .unwrap_or(false);
        if !has_wanted_ext {
            continue;
        }

        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let path_str = canonical.to_string_lossy().to_string();

        match store.is_ingested(&path_str) {
            Ok(true) => {
                log::debug!("already ingested: {path_str}");
                skipped += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                log::warn!("failed to check ingest status for {path_str}: {e}");
                failed += 1;
                continue;
            }
        }

        let start = Instant::now();
        let seq = match sidecar::load_brightness_sequence(&canonical, cancelled) {
            Ok(seq) => seq,
            Err(e) => {
                log::warn!("skipping {path_str}: {e}");
                failed += 1;
                continue;
            }
        };
        if cancelled.load(Ordering::Relaxed) {
            log::info!("ingest cancelled by user");
            break;
        }

        let peaks = extract_scenes(&seq.values, seq.fps, config.scene.min_peak_spacing_secs);
        let brightness: Vec<(usize, f64)> = seq.values.iter().copied().enumerate().collect();
        let fingerprints: Vec<Fingerprint> = peaks
            .iter()
            .map(|p| Fingerprint {
                frame: p.frame,
                value: p.gap_secs,
            })
            .collect();

        match store.ingest_file(&path_str, seq.fps, seq.duration_secs, &brightness, &fingerprints) {
            Ok(id) => {
                log::info!(
                    "ingested {path_str} (id={id}, {} frames, {} fingerprints) in {:?}",
                    seq.values.len(),
                    fingerprints.len(),
                    start.elapsed()
                );
                ingested += 1;
            }
            Err(e) => {
                log::warn!("failed to ingest {path_str}: {e}");
                failed += 1;
            }
        }
    }

    log::info!(
        "ingest complete at {}: {ingested} ingested, {skipped} already known, {failed} failed",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}
