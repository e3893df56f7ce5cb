use std::collections::{BTreeMap, BTreeSet};

use meshpilot_geom::Aabb;

/// Integer grid coordinate of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell(pub i64, pub i64);

/// Uniform bucket grid over axis-aligned boxes.
///
/// An entry is registered in every cell its box overlaps; queries return each matching
/// entry once, in insertion order.
#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    cell_size: f64,
    cells: BTreeMap<Cell, Vec<usize>>,
    entries: Vec<T>,
}

impl<T> SpatialGrid<T> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(1e-6),
            cells: BTreeMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn coord(&self, v: f64) -> i64 {
        (v / self.cell_size).floor() as i64
    }

    /// Inclusive cell range `(min, max)` covered by `bbox`.
    pub fn cell_range(&self, bbox: &Aabb) -> (Cell, Cell) {
        (
            Cell(self.coord(bbox.xmin), self.coord(bbox.ymin)),
            Cell(self.coord(bbox.xmax), self.coord(bbox.ymax)),
        )
    }

    /// Stores `item` under every cell overlapped by `bbox` and returns its entry index.
    pub fn insert(&mut self, bbox: &Aabb, item: T) -> usize {
        let index = self.entries.len();
        self.entries.push(item);
        let (lo, hi) = self.cell_range(bbox);
        for x in lo.0..=hi.0 {
            for y in lo.1..=hi.1 {
                self.cells.entry(Cell(x, y)).or_default().push(index);
            }
        }
        index
    }

    /// Entries registered in any cell overlapped by `bbox`.
    ///
    /// Walks only occupied cells, so a huge query box over a sparse grid stays cheap.
    pub fn query(&self, bbox: &Aabb) -> Vec<&T> {
        let (lo, hi) = self.cell_range(bbox);
        let mut hits = BTreeSet::new();
        for (cell, indices) in self.cells.range(Cell(lo.0, i64::MIN)..=Cell(hi.0, i64::MAX)) {
            if (lo.1..=hi.1).contains(&cell.1) {
                hits.extend(indices.iter().copied());
            }
        }
        hits.into_iter().map(|i| &self.entries[i]).collect()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
    }
}
