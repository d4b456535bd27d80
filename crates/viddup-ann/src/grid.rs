//! The `grid` backend: an approximate index that buckets vectors by a
//! coarse per-dimension quantization and scans only the query's bucket plus
//! its axis-aligned neighbors. Trades completeness for speed on large
//! libraries; the reducer re-validates distance and the result cap
//! regardless (see `viddup_core::reduce`), so an incomplete or
//! over-complete neighborhood here is safe.

use std::collections::HashMap;

use viddup_core::ann::{squared_distance, AnnBackend, MAX_RADIUS_RESULTS};

type Cell = Vec<i64>;

#[derive(Debug)]
pub struct GridIndex {
    cell_size: f64,
    vectors: Vec<Vec<f64>>,
    buckets: HashMap<Cell, Vec<usize>>,
}

impl GridIndex {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            vectors: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    fn cell_of(&self, v: &[f64]) -> Cell {
        v.iter().map(|x| (x / self.cell_size).floor() as i64).collect()
    }

    /// Axis-aligned neighboring cells of `cell`: itself, plus one shift of
    /// +-1 along each dimension in turn (not the full 3^L cross product,
    /// which is intractable once `L` exceeds a handful of dimensions).
    fn neighbor_cells(cell: &Cell) -> Vec<Cell> {
        let mut cells = vec![cell.clone()];
        for (dim, _) in cell.iter().enumerate() {
            for delta in [-1i64, 1i64] {
                let mut shifted = cell.clone();
                shifted[dim] += delta;
                cells.push(shifted);
            }
        }
        cells
    }
}

impl AnnBackend for GridIndex {
    fn build(&mut self, items: &[Vec<f64>]) {
        self.vectors = items.to_vec();
        self.buckets.clear();
        for (row, v) in self.vectors.iter().enumerate() {
            let cell = self.cell_of(v);
            self.buckets.entry(cell).or_default().push(row);
        }
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
        let cell = self.cell_of(query);

        let mut hits: Vec<(usize, f64)> = Vec::new();
        for neighbor_cell in Self::neighbor_cells(&cell) {
            if let Some(rows) = self.buckets.get(&neighbor_cell) {
                for &r in rows {
                    if r == row {
                        continue;
                    }
                    let d = squared_distance(query, &self.vectors[r]);
                    if d < radius_sq {
                        hits.push((r, d));
                    }
                }
            }
        }

        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        hits.dedup_by_key(|(r, _)| *r);
        hits.truncate(MAX_RADIUS_RESULTS);
        hits.into_iter().map(|(r, _)| r).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_neighbor_in_same_cell() {
        let mut index = GridIndex::new(1.0);
        index.build(&[vec![0.1, 0.1], vec![0.2, 0.2], vec![50.0, 50.0]]);
        let neighbors = index.query_radius(0, 1.0);
        assert_eq!(neighbors, vec![1]);
    }

    #[test]
    fn finds_neighbor_across_adjacent_cell_boundary() {
        // 0.95 and 1.05 fall in different cells at cell_size=1.0 but are
        // within radius of each other.
        let mut index = GridIndex::new(1.0);
        index.build(&[vec![0.95], vec![1.05]]);
        let neighbors = index.query_radius(0, 0.2);
        assert_eq!(neighbors, vec![1]);
    }

    #[test]
    fn far_vectors_are_excluded() {
        let mut index = GridIndex::new(1.0);
        index.build(&[vec![0.0], vec![100.0]]);
        assert!(index.query_radius(0, 1.0).is_empty());
    }
}
