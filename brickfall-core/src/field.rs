//! The playfield.

use crate::error::ConfigError;
use crate::geom::Point2;
use crate::shape::Shape;
use core::fmt;
use core::ops::Range;
use serde::{Deserialize, Serialize};
use std::convert::TryInto;

/// State of a single field cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Occupied,
}

impl Cell {
    pub fn is_occupied(self) -> bool {
        self == Cell::Occupied
    }
}

/// A bounded occupancy grid.
///
/// The field is surrounded by permanently occupied cells: `border` columns on each side and
/// the floor at row 0. Pieces collide with these the same way they collide with the stack, so
/// no other bounds logic is needed. Rows are numbered upwards from the floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayField {
    /// Total width in cells, including both walls.
    width: usize,
    /// Total height in cells, including the floor and the spawn area.
    height: usize,
    /// Width of each wall, which is also the height of the spawn area.
    border: usize,
    /// Row-major cells, row 0 is the floor.
    cells: Vec<Cell>,
}

/// Upper bound on the number of cells in a field, walls and floor included.
pub const MAX_CELLS: usize = 1 << 24;

impl PlayField {
    /// Creates an empty field with walls and floor.
    pub fn new(
        playable_width: usize,
        playable_height: usize,
        max_piece_size: usize,
    ) -> Result<PlayField, ConfigError> {
        if playable_width == 0 {
            return Err(ConfigError::ZeroDimension("playableWidth"));
        }
        if playable_height == 0 {
            return Err(ConfigError::ZeroDimension("playableHeight"));
        }
        if max_piece_size == 0 {
            return Err(ConfigError::ZeroDimension("maxPieceSize"));
        }

        let width = max_piece_size
            .checked_mul(2)
            .and_then(|walls| walls.checked_add(playable_width));
        let height = playable_height.checked_add(max_piece_size);
        let (width, height) = match (width, height) {
            (Some(width), Some(height))
                if width.checked_mul(height).map_or(false, |len| len <= MAX_CELLS) =>
            {
                (width, height)
            }
            _ => {
                return Err(ConfigError::FieldTooLarge {
                    width: playable_width,
                    height: playable_height,
                    border: max_piece_size,
                })
            }
        };
        let mut field = PlayField {
            width,
            height,
            border: max_piece_size,
            cells: vec![Cell::Empty; width * height],
        };

        for y in 0..height {
            for x in 0..width {
                if field.is_border(x, y) {
                    field.cells[y * width + x] = Cell::Occupied;
                }
            }
        }

        Ok(field)
    }

    /// Returns the total width, including walls.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the total height, including floor and spawn area.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the wall width.
    pub fn border(&self) -> usize {
        self.border
    }

    /// Returns the range of columns between the walls.
    pub fn playable_columns(&self) -> Range<usize> {
        self.border..self.width - self.border
    }

    /// Returns true if the cell is part of a wall or the floor.
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        y == 0 || !self.playable_columns().contains(&x)
    }

    /// Returns the cell at the specified coordinates.
    pub fn get_cell(&self, x: usize, y: usize) -> Option<Cell> {
        if x >= self.width {
            return None;
        }
        self.cells.get(y * self.width + x).copied()
    }

    /// Replaces the cell at the specified coordinates.
    ///
    /// Border cells cannot be changed. Returns success.
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) -> bool {
        if x >= self.width || y >= self.height || self.is_border(x, y) {
            return false;
        }
        self.cells[y * self.width + x] = cell;
        true
    }

    /// Returns true if the position is occupied or outside the field.
    pub fn is_blocked(&self, pos: Point2<isize>) -> bool {
        let x: Result<usize, _> = pos.x.try_into();
        let y: Result<usize, _> = pos.y.try_into();
        match (x, y) {
            (Ok(x), Ok(y)) => self.get_cell(x, y).map_or(true, Cell::is_occupied),
            _ => true,
        }
    }

    /// Returns true if the shape, anchored at `pos`, overlaps an occupied cell.
    ///
    /// Matrix row `sy` lands on field row `pos.y - sy`. Any cell outside the field counts as a
    /// collision.
    pub fn would_collide<T: Shape>(&self, shape: &T, pos: Point2<isize>) -> bool {
        shape
            .iter_cells()
            .any(|cell| self.is_blocked(pos.shape_cell(cell)))
    }

    /// Writes the shape into the field at `pos`.
    ///
    /// The caller is expected to have checked `would_collide` already. Cells that fall outside
    /// the field are skipped.
    pub fn commit<T: Shape>(&mut self, shape: &T, pos: Point2<isize>) {
        for cell in shape.iter_cells() {
            let target = pos.shape_cell(cell);
            let x = target.x.try_into();
            let y = target.y.try_into();

            if let (Ok(x), Ok(y)) = (x, y) {
                self.set_cell(x, y, Cell::Occupied);
            }
        }
    }

    /// Returns true if every cell between the walls in row `y` is occupied.
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= self.height {
            return false;
        }
        self.playable_columns()
            .all(|x| self.cells[y * self.width + x].is_occupied())
    }

    /// Deletes row `from_y` by moving everything above it down by one row.
    ///
    /// The top row is left empty. Walls and floor are never touched, so `from_y` of 0 does
    /// nothing.
    pub fn shift_rows_down(&mut self, from_y: usize) {
        if from_y == 0 || from_y >= self.height {
            return;
        }
        let columns = self.playable_columns();
        for y in from_y..self.height - 1 {
            let (below, above) = self.cells.split_at_mut((y + 1) * self.width);
            below[y * self.width + columns.start..y * self.width + columns.end]
                .copy_from_slice(&above[columns.start..columns.end]);
        }
        let top = (self.height - 1) * self.width;
        for cell in &mut self.cells[top + columns.start..top + columns.end] {
            *cell = Cell::Empty;
        }
    }

    /// Returns the number of occupied cells, walls and floor included.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_occupied()).count()
    }

    /// Returns the number of occupied cells between the walls and above the floor.
    pub fn stack_count(&self) -> usize {
        (1..self.height)
            .flat_map(|y| self.playable_columns().map(move |x| (x, y)))
            .filter(|(x, y)| self.cells[y * self.width + x].is_occupied())
            .count()
    }

    /// Returns a read-only copy of the occupancy grid.
    ///
    /// Without the border the snapshot starts at the first row above the floor and only
    /// contains the columns between the walls.
    pub fn snapshot(&self, include_border: bool) -> FieldSnapshot {
        let (columns, rows) = if include_border {
            (0..self.width, 0..self.height)
        } else {
            (self.playable_columns(), 1..self.height)
        };

        let mut cells = Vec::with_capacity(columns.len() * rows.len());
        for y in rows.clone() {
            for x in columns.clone() {
                cells.push(self.cells[y * self.width + x].is_occupied());
            }
        }

        FieldSnapshot {
            width: columns.len(),
            height: rows.len(),
            cells,
        }
    }
}

impl fmt::Display for PlayField {
    /// Writes the field top row first, one `1`/`0` per cell.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let c = if self.cells[y * self.width + x].is_occupied() {
                    '1'
                } else {
                    '0'
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Occupancy grid for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub width: usize,
    pub height: usize,
    /// Row-major, row 0 is the lowest row in the snapshot.
    pub cells: Vec<bool>,
}

impl FieldSnapshot {
    /// Returns the cell at snapshot coordinates.
    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        if x >= self.width {
            return None;
        }
        self.cells.get(y * self.width + x).copied()
    }
}

#[cfg(test)]
use crate::shape::ShapeMatrix;

#[cfg(test)]
fn o_piece() -> ShapeMatrix {
    ShapeMatrix::build(&["11", "11"], 2).unwrap()
}

#[test]
fn new_field_has_walls_and_floor() {
    let field = PlayField::new(4, 4, 2).unwrap();
    assert_eq!(field.width(), 8);
    assert_eq!(field.height(), 6);
    assert_eq!(field.playable_columns(), 2..6);

    for y in 0..field.height() {
        for x in 0..field.width() {
            let expected = y == 0 || x < 2 || x >= 6;
            assert_eq!(
                field.get_cell(x, y) == Some(Cell::Occupied),
                expected,
                "cell ({}, {})",
                x,
                y
            );
        }
    }
    assert_eq!(field.stack_count(), 0);
}

#[test]
fn new_field_rejects_zero_dimensions() {
    assert_eq!(
        PlayField::new(0, 4, 2),
        Err(ConfigError::ZeroDimension("playableWidth"))
    );
    assert_eq!(
        PlayField::new(4, 0, 2),
        Err(ConfigError::ZeroDimension("playableHeight"))
    );
    assert_eq!(
        PlayField::new(4, 4, 0),
        Err(ConfigError::ZeroDimension("maxPieceSize"))
    );
}

#[test]
fn new_field_rejects_oversized_dimensions() {
    let too_large = |width, height, border| {
        Err(ConfigError::FieldTooLarge {
            width,
            height,
            border,
        })
    };
    assert_eq!(PlayField::new(usize::MAX, 4, 2), too_large(usize::MAX, 4, 2));
    assert_eq!(PlayField::new(4, usize::MAX, 2), too_large(4, usize::MAX, 2));
    assert_eq!(
        PlayField::new(4, 4, usize::MAX / 2 + 1),
        too_large(4, 4, usize::MAX / 2 + 1)
    );
    // no overflow, but far too many cells
    assert_eq!(
        PlayField::new(1 << 20, 1 << 20, 2),
        too_large(1 << 20, 1 << 20, 2)
    );

    let field = PlayField::new(MAX_CELLS / 8 - 4, 6, 2).unwrap();
    assert_eq!(field.width() * field.height(), MAX_CELLS);
}

#[test]
fn collide_against_walls_floor_and_outside() {
    let field = PlayField::new(4, 4, 2).unwrap();
    let o = o_piece();

    assert!(!field.would_collide(&o, Point2::new(2, 2)));
    assert!(!field.would_collide(&o, Point2::new(4, 5)));
    assert!(field.would_collide(&o, Point2::new(1, 2)), "left wall");
    assert!(field.would_collide(&o, Point2::new(5, 2)), "right wall");
    assert!(field.would_collide(&o, Point2::new(2, 1)), "floor");

    assert!(field.would_collide(&o, Point2::new(-5, 3)));
    assert!(field.would_collide(&o, Point2::new(3, 6)), "above the top");
    assert!(field.would_collide(&o, Point2::new(100, 3)));
}

#[test]
fn empty_matrix_cells_do_not_collide() {
    let field = PlayField::new(4, 4, 2).unwrap();
    let corner = ShapeMatrix::build(&["10", "00"], 2).unwrap();
    // lower row and right column of the matrix hang over the floor and wall
    assert!(!field.would_collide(&corner, Point2::new(5, 1)));
}

#[test]
fn commit_marks_shape_cells() {
    let mut field = PlayField::new(4, 4, 2).unwrap();
    let before = field.occupied_count();
    let o = o_piece();
    field.commit(&o, Point2::new(3, 2));

    assert_eq!(field.occupied_count(), before + 4);
    assert_eq!(field.get_cell(3, 2), Some(Cell::Occupied));
    assert_eq!(field.get_cell(4, 2), Some(Cell::Occupied));
    assert_eq!(field.get_cell(3, 1), Some(Cell::Occupied));
    assert_eq!(field.get_cell(4, 1), Some(Cell::Occupied));
    assert!(field.would_collide(&o, Point2::new(3, 3)));
    assert!(!field.would_collide(&o, Point2::new(3, 4)));
}

#[test]
fn border_cells_cannot_be_cleared() {
    let mut field = PlayField::new(4, 4, 2).unwrap();
    assert!(!field.set_cell(0, 3, Cell::Empty));
    assert!(!field.set_cell(3, 0, Cell::Empty));
    assert!(!field.set_cell(30, 3, Cell::Occupied));
    assert!(field.set_cell(3, 3, Cell::Occupied));
    assert_eq!(field.get_cell(0, 3), Some(Cell::Occupied));
}

#[test]
fn row_full_ignores_walls() {
    let mut field = PlayField::new(4, 4, 2).unwrap();
    assert!(!field.is_row_full(1));
    for x in 2..5 {
        field.set_cell(x, 1, Cell::Occupied);
    }
    assert!(!field.is_row_full(1));
    field.set_cell(5, 1, Cell::Occupied);
    assert!(field.is_row_full(1));
    assert!(!field.is_row_full(field.height()));
}

#[test]
fn shift_rows_down_deletes_row() {
    let mut field = PlayField::new(4, 4, 2).unwrap();
    // row 1: full, row 2: one cell at x=3, row 5 (top): one cell at x=2
    for x in 2..6 {
        field.set_cell(x, 1, Cell::Occupied);
    }
    field.set_cell(3, 2, Cell::Occupied);
    field.set_cell(2, 5, Cell::Occupied);

    field.shift_rows_down(1);

    assert!(!field.is_row_full(1));
    assert_eq!(field.get_cell(3, 1), Some(Cell::Occupied));
    assert_eq!(field.get_cell(2, 1), Some(Cell::Empty));
    assert_eq!(field.get_cell(2, 4), Some(Cell::Occupied));
    for x in field.playable_columns() {
        assert_eq!(field.get_cell(x, 5), Some(Cell::Empty));
    }
    // walls stay
    assert_eq!(field.get_cell(0, 5), Some(Cell::Occupied));
    assert_eq!(field.get_cell(7, 5), Some(Cell::Occupied));
    assert_eq!(field.stack_count(), 2);
}

#[test]
fn shift_rows_down_never_touches_floor() {
    let mut field = PlayField::new(4, 4, 2).unwrap();
    let before = field.clone();
    field.shift_rows_down(0);
    field.shift_rows_down(field.height());
    assert_eq!(field, before);
}

#[test]
fn snapshots_with_and_without_border() {
    let mut field = PlayField::new(4, 4, 2).unwrap();
    field.set_cell(2, 1, Cell::Occupied);

    let full = field.snapshot(true);
    assert_eq!((full.width, full.height), (8, 6));
    assert_eq!(full.get(0, 3), Some(true));
    assert_eq!(full.get(2, 1), Some(true));
    assert_eq!(full.get(3, 1), Some(false));

    let inner = field.snapshot(false);
    assert_eq!((inner.width, inner.height), (4, 5));
    assert_eq!(inner.get(0, 0), Some(true));
    assert_eq!(inner.cells.iter().filter(|c| **c).count(), 1);
    assert_eq!(inner.get(4, 0), None);
}

#[test]
fn display_prints_top_row_first() {
    let mut field = PlayField::new(2, 2, 2).unwrap();
    field.set_cell(2, 1, Cell::Occupied);
    let printed = field.to_string();
    let lines: Vec<_> = printed.lines().collect();
    assert_eq!(
        lines,
        vec!["110011", "110011", "111011", "111111"]
    );
}
