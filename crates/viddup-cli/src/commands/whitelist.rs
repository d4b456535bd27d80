//! Component H: record a whitelist clique over the files named on the
//! command line.

use std::path::{Path, PathBuf};

use viddup_core::whitelist::clique_pairs;
use viddup_core::Config;
use viddup_store::Store;

pub fn run(db_path: &Path, config: &Config, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut store = Store::open(db_path, config.store.busy_timeout_ms)
        .map_err(|e| anyhow::anyhow!("failed to open store at {}: {e}", db_path.display()))?;

    let mut ids = Vec::with_capacity(files.len());
    for path in files {
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let path_str = canonical.to_string_lossy().to_string();
        let id = store
            .file_id_by_path(&path_str)?
            .ok_or_else(|| anyhow::anyhow!("not ingested: {path_str}"))?;
        ids.push(id);
    }

    let pairs = clique_pairs(&ids)?;
    store.whitelist_add(&pairs)?;
    log::info!("whitelisted {} pair(s) across {} file(s)", pairs.len(), ids.len());
    Ok(())
}
