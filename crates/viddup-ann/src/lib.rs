//! Concrete ANN backends and a by-name registry.
//!
//! The abstraction's trait (`AnnBackend`) lives in `viddup-core` alongside
//! the reducer that consumes it; this crate only supplies implementations,
//! selected by name from multiple concrete backends.

pub mod flat;
pub mod grid;

pub use flat::FlatIndex;
pub use grid::GridIndex;
pub use viddup_core::ann::{AnnBackend, AnnError};

/// Default grid cell size. Chosen to be the same order of magnitude as a
/// typical search radius; callers that need a different tradeoff should
/// construct `GridIndex` directly.
const DEFAULT_GRID_CELL_SIZE: f64 = 1.0;

/// Construct an empty backend by name. Names are matched case-sensitively;
/// an unrecognized name is the "backend unavailable" fail-fast case.
pub fn by_name(name: &str) -> Result<Box<dyn AnnBackend>, AnnError> {
    match name {
        "flat" => Ok(Box::new(FlatIndex::new())),
        "grid" => Ok(Box::new(GridIndex::new(DEFAULT_GRID_CELL_SIZE))),
        other => Err(AnnError::UnknownBackend(other.to_string())),
    }
}

/// Names of every backend this crate ships, in no particular order.
pub fn available_backends() -> &'static [&'static str] {
    &["flat", "grid"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_name_constructs_known_backends() {
        assert!(by_name("flat").is_ok());
        assert!(by_name("grid").is_ok());
    }

    #[test]
    fn by_name_rejects_unknown_backend() {
        assert!(by_name("nonexistent").is_err());
    }

    #[test]
    fn flat_and_grid_agree_on_an_easy_case() {
        let items = vec![vec![0.0, 0.0], vec![0.05, 0.05], vec![20.0, 20.0]];

        let mut flat = by_name("flat").unwrap();
        flat.build(&items);
        let mut grid = by_name("grid").unwrap();
        grid.build(&items);

        let mut flat_neighbors = flat.query_radius(0, 1.0);
        let mut grid_neighbors = grid.query_radius(0, 1.0);
        flat_neighbors.sort_unstable();
        grid_neighbors.sort_unstable();
        assert_eq!(flat_neighbors, grid_neighbors);
    }
}
