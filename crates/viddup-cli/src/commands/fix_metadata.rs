//! Re-probe files whose stored fps/duration looks wrong or has drifted
//! from their current sidecar, and update the record. The sole sanctioned
//! mutation of an existing file record (`Store::update_file_metadata`).

use std::path::Path;

use viddup_core::Config;
use viddup_store::Store;

pub fn run(db_path: &Path, config: &Config) -> anyhow::Result<()> {
    let store = Store::open(db_path, config.store.busy_timeout_ms)
        .map_err(|e| anyhow::anyhow!("failed to open store at {}: {e}", db_path.display()))?;

    let files = store.iter_files()?;
    let mut fixed = 0usize;
    let mut unreadable = 0usize;

    for file in &files {
        let needs_check = file.fps <= 0.0 || file.duration_secs <= 0.0;
        let sidecar_path = crate::sidecar::sidecar_path(Path::new(&file.path));
        let content = match std::fs::read_to_string(&sidecar_path) {
            Ok(c) => c,
            Err(_) => {
                if needs_check {
                    log::warn!("cannot re-probe {}: sidecar missing", file.path);
                    unreadable += 1;
                }
                continue;
            }
        };
        #[derive(serde::Deserialize)]
        struct Probe {
            fps: f64,
            duration_secs: f64,
        }
        let probe: Probe = match serde_json::from_str(&content) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("malformed sidecar for {}: {e}", file.path);
                continue;
            }
        };

        if (probe.fps - file.fps).abs() > f64::EPSILON
            || (probe.duration_secs - file.duration_secs).abs() > f64::EPSILON
        {
            store.update_file_metadata(file.id, probe.fps, probe.duration_secs)?;
            log::info!(
                "updated metadata for {}: fps {} -> {}, duration {} -> {}",
                file.path,
                file.fps,
                probe.fps,
                file.duration_secs,
                probe.duration_secs
            );
            fixed += 1;
        }
    }

    log::info!("fix-metadata complete: {fixed} updated, {unreadable} unreadable");
    Ok(())
}
