//! Report or delete records for files that no longer exist on disk,
//! defaulting to a dry-run report and only deleting when `--delete` is
//! passed explicitly.

use std::path::Path;

use viddup_core::Config;
use viddup_store::Store;

pub fn run(db_path: &Path, config: &Config, delete: bool) -> anyhow::Result<()> {
    let mut store = Store::open(db_path, config.store.busy_timeout_ms)
        .map_err(|e| anyhow::anyhow!("failed to open store at {}: {e}", db_path.display()))?;

    let report = store.purge(!delete)?;

    if report.missing_files.is_empty() && report.orphan_fingerprint_rows == 0 {
        log::info!("nothing to purge");
        return Ok(());
    }

    for path in &report.missing_files {
        println!("missing: {path}");
    }
    println!(
        "{} missing file(s), {} orphan fingerprint/brightness row(s), {} orphan whitelist row(s)",
        report.missing_files.len(),
        report.orphan_fingerprint_rows,
        report.orphan_whitelist_rows,
    );
    if report.deleted {
        log::info!("purge applied");
    } else {
        log::info!("dry run only; re-run with --delete to apply");
    }
    Ok(())
}
