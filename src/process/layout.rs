/// Canvas geometry and the square-grid auto-layout
///
/// All elements share a canonical 120x60 footprint on a 1200x800 canvas.

use crate::process::types::Position;
use rand::Rng;

pub const CANVAS_WIDTH: f64 = 1200.0;
pub const CANVAS_HEIGHT: f64 = 800.0;
pub const ELEMENT_WIDTH: f64 = 120.0;
pub const ELEMENT_HEIGHT: f64 = 60.0;
/// Gap added to the element footprint to get the grid pitch
pub const GRID_SPACING: f64 = 100.0;

/// Sub-rectangle used when an element is created without a position
const DEFAULT_REGION_ORIGIN: Position = Position { x: 100.0, y: 100.0 };
const DEFAULT_REGION_WIDTH: f64 = 400.0;
const DEFAULT_REGION_HEIGHT: f64 = 300.0;

/// Random placement inside the default creation region
pub fn default_position<R: Rng + ?Sized>(rng: &mut R) -> Position {
    Position::new(
        DEFAULT_REGION_ORIGIN.x + rng.random_range(0.0..DEFAULT_REGION_WIDTH),
        DEFAULT_REGION_ORIGIN.y + rng.random_range(0.0..DEFAULT_REGION_HEIGHT),
    )
}

/// Square grid sized for a given number of elements, centred on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
    /// Top-left corner of the first cell
    pub origin: Position,
}

impl GridLayout {
    /// Grid for `count` elements; `None` when there is nothing to place
    pub fn for_count(count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }

        let columns = (count as f64).sqrt().ceil() as usize;
        let rows = count.div_ceil(columns);

        let grid_width = columns as f64 * (ELEMENT_WIDTH + GRID_SPACING);
        let grid_height = rows as f64 * (ELEMENT_HEIGHT + GRID_SPACING);

        // Grids larger than the canvas start at the edge rather than off it
        let origin = Position::new(
            (CANVAS_WIDTH - grid_width) / 2.0,
            (CANVAS_HEIGHT - grid_height) / 2.0,
        )
        .clamped();

        Some(Self { columns, rows, origin })
    }

    /// (row, column) of the `index`-th element, row-major
    pub fn cell(&self, index: usize) -> (usize, usize) {
        (index / self.columns, index % self.columns)
    }

    pub fn position(&self, index: usize) -> Position {
        let (row, column) = self.cell(index);
        Position::new(
            self.origin.x + column as f64 * (ELEMENT_WIDTH + GRID_SPACING),
            self.origin.y + row as f64 * (ELEMENT_HEIGHT + GRID_SPACING),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn empty_diagram_has_no_grid() {
        assert!(GridLayout::for_count(0).is_none());
    }

    #[test]
    fn grid_dimensions_follow_square_root() {
        let expected = [
            (1, 1, 1),
            (2, 2, 1),
            (3, 2, 2),
            (4, 2, 2),
            (5, 3, 2),
            (9, 3, 3),
            (10, 4, 3),
            (17, 5, 4),
            (36, 6, 6),
        ];
        for (count, columns, rows) in expected {
            let grid = GridLayout::for_count(count).unwrap();
            assert_eq!((grid.columns, grid.rows), (columns, rows), "count = {}", count);
        }
    }

    #[test]
    fn cells_are_unique_and_non_negative() {
        for count in 1..=60 {
            let grid = GridLayout::for_count(count).unwrap();
            let mut cells = HashSet::new();
            for index in 0..count {
                assert!(cells.insert(grid.cell(index)));
                let position = grid.position(index);
                assert!(position.x >= 0.0 && position.y >= 0.0, "count = {}", count);
            }
        }
    }

    #[test]
    fn four_elements_are_centred() {
        let grid = GridLayout::for_count(4).unwrap();
        assert_eq!(grid.origin, Position::new(380.0, 240.0));
        assert_eq!(grid.position(3), Position::new(600.0, 400.0));
    }

    #[test]
    fn default_position_stays_in_region() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let p = default_position(&mut rng);
            assert!((100.0..500.0).contains(&p.x));
            assert!((100.0..400.0).contains(&p.y));
        }
    }
}
