//! Component G: the duplicate reducer.
//!
//! Iterates an ANN index's rows, groups neighboring windows by file, and
//! emits deterministic clusters after filtering out pairs already reported
//! and fully-whitelisted cliques. Neighbor lists are always sorted by row
//! index (not distance) so output is stable regardless of which backend
//! produced the neighborhood.

use std::collections::HashSet;

use crate::ann::{squared_distance, AnnBackend, MAX_RADIUS_RESULTS};
use crate::model::{Cluster, ClusterEntry, FileRecord};
use crate::whitelist::{fully_whitelisted, Pair};

/// One assembled window's provenance, aligned 1:1 with ANN rows.
#[derive(Debug, Clone, Copy)]
pub struct WindowTag {
    pub file_id: i64,
    pub first_frame: usize,
}

/// Re-validate and cap a backend's radius-query result: keep only rows
/// genuinely within `radius` (by L2 distance against the query row's own
/// vector) and cap at [`MAX_RADIUS_RESULTS`], regardless of what the
/// backend already enforced internally.
fn validated_neighborhood(backend: &dyn AnnBackend, row: usize, radius: f64) -> Vec<usize> {
    let query_vec = backend.get_vector(row);
    let radius_sq = radius * radius;
    let mut candidates = backend.query_radius(row, radius);
    candidates.push(row);
    candidates.sort_unstable();
    candidates.dedup();
    candidates.retain(|&r| squared_distance(query_vec, backend.get_vector(r)) < radius_sq || r == row);
    candidates.truncate(MAX_RADIUS_RESULTS);
    candidates
}

/// Run the reducer over a built ANN index.
///
/// `tags[row]` must describe the window backing ANN row `row`; `files` must
/// contain every file id referenced by `tags`. `whitelisted` answers whether
/// a canonical pair has been recorded as a whitelist entry.
pub fn reduce_duplicates(
    backend: &dyn AnnBackend,
    tags: &[WindowTag],
    files: &std::collections::HashMap<i64, FileRecord>,
    step: usize,
    radius: f64,
    whitelisted: impl Fn(Pair) -> bool,
) -> Vec<Cluster> {
    assert_eq!(backend.len(), tags.len(), "tags must align 1:1 with ANN rows");

    let mut known_duplicates: HashSet<Pair> = HashSet::new();
    let mut clusters = Vec::new();
    let step = step.max(1);

    let mut i = 0;
    while i < backend.len() {
        let neighborhood = validated_neighborhood(backend, i, radius);
        if neighborhood.len() > 1 {
            let mut file_ids: Vec<i64> = neighborhood.iter().map(|&r| tags[r].file_id).collect();
            file_ids.sort_unstable();
            file_ids.dedup();

            if file_ids.len() > 1 {
                let mut pairs = Vec::new();
                for a in 0..file_ids.len() {
                    for b in (a + 1)..file_ids.len() {
                        if let Ok(pair) = Pair::canonicalize(file_ids[a], file_ids[b]) {
                            pairs.push(pair);
                        }
                    }
                }

                if fully_whitelisted(&file_ids, &whitelisted) {
                    pairs.clear();
                } else {
                    pairs.retain(|p| !known_duplicates.contains(p));
                }

                if !pairs.is_empty() {
                    for &p in &pairs {
                        known_duplicates.insert(p);
                    }

                    let mut surviving_ids: Vec<i64> =
                        pairs.iter().flat_map(|p| [p.0, p.1]).collect();
                    surviving_ids.sort_unstable();
                    surviving_ids.dedup();

                    let mut entries = Vec::new();
                    let mut represented: HashSet<i64> = HashSet::new();
                    for &row in &neighborhood {
                        let tag = tags[row];
                        if !surviving_ids.contains(&tag.file_id) {
                            continue;
                        }
                        if !represented.insert(tag.file_id) {
                            continue;
                        }
                        let file = files
                            .get(&tag.file_id)
                            .expect("tags must reference a known file")
                            .clone();
                        let offset_secs = tag.first_frame as f64 / file.fps;
                        entries.push(ClusterEntry { file, offset_secs });
                    }

                    if entries.len() >= 2 {
                        clusters.push(Cluster { entries });
                    }
                }
            }
        }
        i += step;
    }

    clusters
}
