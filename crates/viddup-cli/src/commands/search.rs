//! Components E, F, G wired together: assemble windows for every known
//! file, build the configured ANN backend over them, run the reducer, and
//! print clusters in a form suitable for `--ss <H:MM:SS>` playback.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use viddup_core::model::FileRecord;
use viddup_core::reduce::{reduce_duplicates, WindowTag};
use viddup_core::whitelist::Pair;
use viddup_core::window::assemble_windows;
use viddup_core::Config;
use viddup_store::Store;

pub fn run(db_path: &Path, config: &Config, cancelled: &Arc<AtomicBool>) -> anyhow::Result<()> {
    let store = Store::open(db_path, config.store.busy_timeout_ms)
        .map_err(|e| anyhow::anyhow!("failed to open store at {}: {e}", db_path.display()))?;

    let files = store.iter_files()?;
    log::info!("assembling windows for {} known files", files.len());

    // The Store holds a single, non-`Sync` connection, so fingerprint reads
    // happen sequentially; only the pure, CPU-bound window assembly below
    // is parallelized.
    let file_fingerprints: Vec<(FileRecord, Vec<_>)> = files
        .iter()
        .map(|file| {
            let fingerprints = store
                .fingerprints_for_file(file.id, 0, i64::MAX)
                .unwrap_or_default();
            (file.clone(), fingerprints)
        })
        .collect();

    let per_file: Vec<(FileRecord, Vec<_>)> = file_fingerprints
        .par_iter()
        .filter_map(|(file, fingerprints)| {
            let windows = assemble_windows(fingerprints, file.fps, file.duration_secs, &config.window);
            if windows.is_empty() {
                None
            } else {
                Some((file.clone(), windows))
            }
        })
        .collect();

    if cancelled.load(Ordering::Relaxed) {
        log::info!("search cancelled by user");
        return Ok(());
    }

    let mut vectors = Vec::new();
    let mut tags = Vec::new();
    let mut files_by_id: HashMap<i64, FileRecord> = HashMap::new();
    for (file, windows) in &per_file {
        files_by_id.insert(file.id, file.clone());
        for window in windows {
            vectors.push(window.values.clone());
            tags.push(WindowTag {
                file_id: file.id,
                first_frame: window.first_frame,
            });
        }
    }

    log::info!(
        "built {} windows across {} files, backend={}",
        vectors.len(),
        per_file.len(),
        config.search.backend
    );

    let mut backend = viddup_ann::by_name(&config.search.backend)?;
    backend.build(&vectors);

    if cancelled.load(Ordering::Relaxed) {
        log::info!("search cancelled by user");
        return Ok(());
    }

    let clusters = reduce_duplicates(
        backend.as_ref(),
        &tags,
        &files_by_id,
        config.search.step,
        config.search.radius,
        |pair: Pair| store.whitelist_contains(pair).unwrap_or(false),
    );

    log::info!(
        "search complete at {}: found {} duplicate cluster(s)",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        clusters.len()
    );
    print_clusters(&clusters);
    Ok(())
}

fn print_clusters(clusters: &[viddup_core::Cluster]) {
    for cluster in clusters {
        for entry in &cluster.entries {
            println!(
                "{}\t--ss {}",
                entry.file.path,
                format_timestamp(entry.offset_secs)
            );
        }
        println!();
    }
}

fn format_timestamp(total_secs: f64) -> String {
    let total = total_secs.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_sub_minute_offset() {
        assert_eq!(format_timestamp(5.0), "00:00:05");
    }

    #[test]
    fn formats_hour_scale_offset() {
        assert_eq!(format_timestamp(3723.0), "01:02:03");
    }
}
