//! Shared grid geometry for the reference games.
//!
//! Cells are addressed by `(col, row)` and stored row-major. Neighbourhoods
//! are given as direction tables so square and hex boards share one helper.

use serde::{Deserialize, Serialize};

/// Orthogonal neighbours on a square grid.
pub const ORTHOGONAL: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Neighbours on a hex rhombus stored as a square grid.
pub const HEX: [(i32, i32); 6] = [(0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1)];

/// A `width` x `height` grid of cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SquareGrid {
    width: usize,
    height: usize,
}

impl SquareGrid {
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid must have at least one cell");
        assert!(width <= 26, "columns are lettered A-Z");
        Self { width, height }
    }

    #[must_use]
    pub fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    #[must_use]
    pub fn index(&self, col: usize, row: usize) -> usize {
        debug_assert!(col < self.width && row < self.height);
        row * self.width + col
    }

    #[inline]
    #[must_use]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Index of `(col, row)` if it lies on the grid.
    #[must_use]
    pub fn checked_index(&self, col: i64, row: i64) -> Option<usize> {
        let inside = (0..self.width as i64).contains(&col) && (0..self.height as i64).contains(&row);
        inside.then(|| self.index(col as usize, row as usize))
    }

    /// On-grid neighbours of `index` in table order.
    pub fn neighbors<'a>(
        &'a self,
        index: usize,
        directions: &'a [(i32, i32)],
    ) -> impl Iterator<Item = usize> + 'a {
        let (col, row) = self.coords(index);
        directions.iter().filter_map(move |&(dc, dr)| {
            self.checked_index(col as i64 + i64::from(dc), row as i64 + i64::from(dr))
        })
    }

    #[must_use]
    pub fn is_adjacent(&self, a: usize, b: usize, directions: &[(i32, i32)]) -> bool {
        self.neighbors(a, directions).any(|n| n == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        let grid = SquareGrid::new(4, 3);
        assert_eq!(grid.len(), 12);
        for i in 0..grid.len() {
            let (c, r) = grid.coords(i);
            assert_eq!(grid.index(c, r), i);
        }
    }

    #[test]
    fn test_corner_neighbors() {
        let grid = SquareGrid::square(3);
        let corner: Vec<_> = grid.neighbors(0, &ORTHOGONAL).collect();
        assert_eq!(corner, vec![1, 3]);

        let centre: Vec<_> = grid.neighbors(4, &ORTHOGONAL).collect();
        assert_eq!(centre, vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_hex_neighbors() {
        let grid = SquareGrid::square(3);
        let centre: Vec<_> = grid.neighbors(4, &HEX).collect();
        assert_eq!(centre.len(), 6);
        assert!(grid.is_adjacent(4, 2, &HEX));
        assert!(!grid.is_adjacent(4, 0, &HEX));
    }

    #[test]
    fn test_checked_index() {
        let grid = SquareGrid::square(2);
        assert_eq!(grid.checked_index(1, 1), Some(3));
        assert_eq!(grid.checked_index(-1, 0), None);
        assert_eq!(grid.checked_index(0, 2), None);
    }
}
