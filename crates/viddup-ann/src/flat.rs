//! The `flat` backend: exact brute-force L2 radius search, parallelized
//! with `rayon`. Always available; used as the default and as the
//! correctness oracle other backends are checked against in tests.

use rayon::prelude::*;
use viddup_core::ann::{squared_distance, AnnBackend, MAX_RADIUS_RESULTS};

#[derive(Debug, Default)]
pub struct FlatIndex {
    vectors: Vec<Vec<f64>>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self { vectors: Vec::new() }
    }
}

impl AnnBackend for FlatIndex {
    fn build(&mut self, items: &[Vec<f64>]) {
        self.vectors = items.to_vec();
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn get_vector(&self, row: usize) -> &[f64] {
        &self.vectors[row]
    }

    fn query_radius(&self, row: usize, radius: f64) -> Vec<usize> {
        let query = &self.vectors[row];
        let radius_sq = radius * radius;

        let mut hits: Vec<(usize, f64)> = self
            .vectors
            .par_iter()
            .enumerate()
            .filter_map(|(r, v)| {
                if r == row {
                    return None;
                }
                let d = squared_distance(query, v);
                if d < radius_sq {
                    Some((r, d))
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        hits.truncate(MAX_RADIUS_RESULTS);
        hits.into_iter().map(|(r, _)| r).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_close_vectors_within_radius() {
        let mut index = FlatIndex::new();
        index.build(&[vec![0.0, 0.0], vec![0.1, 0.1], vec![10.0, 10.0]]);
        let neighbors = index.query_radius(0, 1.0);
        assert_eq!(neighbors, vec![1]);
    }

    #[test]
    fn excludes_self_from_results() {
        let mut index = FlatIndex::new();
        index.build(&[vec![0.0], vec![0.0]]);
        let neighbors = index.query_radius(0, 0.5);
        assert_eq!(neighbors, vec![1]);
        assert!(!neighbors.contains(&0));
    }

    #[test]
    fn caps_at_max_results() {
        let mut index = FlatIndex::new();
        let items: Vec<Vec<f64>> = (0..50).map(|_| vec![0.0]).collect();
        index.build(&items);
        let neighbors = index.query_radius(0, 1.0);
        assert_eq!(neighbors.len(), 20);
    }

    #[test]
    fn get_vector_matches_build_input() {
        let mut index = FlatIndex::new();
        index.build(&[vec![1.0, 2.0, 3.0]]);
        assert_eq!(index.get_vector(0), &[1.0, 2.0, 3.0]);
    }
}
