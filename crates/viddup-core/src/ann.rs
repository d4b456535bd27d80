//! Component F: the ANN abstraction contract.
//!
//! The trait lives here, alongside the reducer that consumes it, so the
//! reducer (component G) has no dependency on any particular backend.
//! Concrete backends (`flat`, `grid`) and their by-name registry live in
//! `viddup-ann`, which depends on this crate for the trait definition --
//! a backend trait living next to its consumer, with concrete backend
//! structs implementing it elsewhere.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnnError {
    #[error("unknown ANN backend: {0}")]
    UnknownBackend(String),
    #[error("row index {0} out of bounds (index has {1} rows)")]
    RowOutOfBounds(usize, usize),
}

/// A built index over a fixed set of `L`-dimensional vectors, queryable by
/// row index with an L2 (Euclidean) radius.
pub trait AnnBackend: Send + Sync {
    /// Build the index from a set of vectors, all the same length.
    fn build(&mut self, items: &[Vec<f64>]);

    /// Number of indexed rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recover the vector stored at `row`. Must equal the input vector at
    /// build time, bit for bit.
    fn get_vector(&self, row: usize) -> &[f64];

    /// Row indices whose L2 distance to `get_vector(row)` is strictly less
    /// than `radius`, capped at at most 20 results. A backend may return an
    /// approximate or over-complete neighborhood; callers that need exact
    /// radius semantics re-check distance themselves (see the reducer).
    fn query_radius(&self, row: usize, radius: f64) -> Vec<usize>;
}

/// Maximum number of candidates any `query_radius` call may return.
pub const MAX_RADIUS_RESULTS: usize = 20;

/// Squared L2 distance between two equal-length vectors.
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
