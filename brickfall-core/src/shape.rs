//! Piece shapes.

use crate::error::ShapeError;
use crate::geom::Point2;
use core::convert::TryFrom;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Something that occupies cells relative to an anchor.
pub trait Shape {
    /// Iterates over all occupied cells in matrix coordinates, where row 0 is the top row.
    fn iter_cells<'a>(&'a self) -> Box<dyn Iterator<Item = Point2<usize>> + 'a>;
}

/// One orientation of a piece: an immutable square grid of cells.
///
/// Serialized as its rows; deserializing goes through [`ShapeMatrix::build`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ShapeMatrix {
    size: usize,
    /// Row-major, row 0 at the top.
    cells: Vec<bool>,
}

impl ShapeMatrix {
    /// Builds a shape from rows of `'0'`/`'1'` characters.
    ///
    /// Any character other than `'1'` is an empty cell.
    pub fn build<S: AsRef<str>>(rows: &[S], max_size: usize) -> Result<ShapeMatrix, ShapeError> {
        let size = rows.len();
        if size < 2 {
            return Err(ShapeError::TooFewRows(size));
        }
        for (row, line) in rows.iter().enumerate() {
            let len = line.as_ref().chars().count();
            if len != size {
                return Err(ShapeError::NotSquare { row, len, size });
            }
        }
        if size > max_size {
            return Err(ShapeError::TooLarge {
                size,
                max: max_size,
            });
        }

        let cells: Vec<bool> = rows
            .iter()
            .flat_map(|line| line.as_ref().chars().map(|c| c == '1'))
            .collect();
        // a shape without cells would fall through the floor forever
        if !cells.iter().any(|cell| *cell) {
            return Err(ShapeError::Empty);
        }

        Ok(ShapeMatrix { size, cells })
    }

    /// Returns the edge length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if the cell at column `x`, row `y` is occupied.
    ///
    /// Cells outside the matrix are empty.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size && self.cells[y * self.size + x]
    }

    /// Returns the number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell).count()
    }

    /// Returns this shape rotated by 90° clockwise.
    pub fn rotated_cw(&self) -> ShapeMatrix {
        let n = self.size;
        let mut cells = Vec::with_capacity(n * n);
        for y in 0..n {
            for x in 0..n {
                // new (x, y) comes from old (y, n - 1 - x)
                cells.push(self.get(y, n - 1 - x));
            }
        }
        ShapeMatrix { size: n, cells }
    }

    /// Returns the shape as rows of `'0'`/`'1'`, the same format it was built from.
    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.size)
            .map(|row| row.iter().map(|c| if *c { '1' } else { '0' }).collect())
            .collect()
    }
}

impl TryFrom<Vec<String>> for ShapeMatrix {
    type Error = ShapeError;

    fn try_from(rows: Vec<String>) -> Result<Self, Self::Error> {
        ShapeMatrix::build(&rows[..], usize::MAX)
    }
}

impl From<ShapeMatrix> for Vec<String> {
    fn from(this: ShapeMatrix) -> Self {
        this.to_rows()
    }
}

impl Shape for ShapeMatrix {
    fn iter_cells<'a>(&'a self) -> Box<dyn Iterator<Item = Point2<usize>> + 'a> {
        let size = self.size;
        Box::new(
            self.cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| **cell)
                .map(move |(i, _)| Point2::new(i % size, i / size)),
        )
    }
}

impl fmt::Display for ShapeMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.to_rows() {
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
fn t_shape() -> ShapeMatrix {
    ShapeMatrix::build(&["010", "111", "000"], 5).unwrap()
}

#[test]
fn build_reads_ones_as_cells() {
    let shape = t_shape();
    assert_eq!(shape.size(), 3);
    assert_eq!(shape.cell_count(), 4);
    assert!(shape.get(1, 0));
    assert!(!shape.get(0, 0));
    assert!(shape.get(0, 1) && shape.get(1, 1) && shape.get(2, 1));
    assert!(!shape.get(3, 1), "outside the matrix");

    let odd = ShapeMatrix::build(&["1x", "01"], 2).unwrap();
    assert_eq!(odd.cell_count(), 2);
}

#[test]
fn build_rejects_bad_definitions() {
    assert_eq!(
        ShapeMatrix::build(&["1"], 5),
        Err(ShapeError::TooFewRows(1))
    );
    assert_eq!(
        ShapeMatrix::build::<&str>(&[], 5),
        Err(ShapeError::TooFewRows(0))
    );
    assert_eq!(
        ShapeMatrix::build(&["110", "011"], 5),
        Err(ShapeError::NotSquare {
            row: 0,
            len: 3,
            size: 2
        })
    );
    assert_eq!(
        ShapeMatrix::build(&["010", "11", "000"], 5),
        Err(ShapeError::NotSquare {
            row: 1,
            len: 2,
            size: 3
        })
    );
    assert_eq!(
        ShapeMatrix::build(&["0000", "1111", "0000", "0000"], 3),
        Err(ShapeError::TooLarge { size: 4, max: 3 })
    );
    assert_eq!(ShapeMatrix::build(&["00", "00"], 5), Err(ShapeError::Empty));
    assert_eq!(ShapeMatrix::build(&["0x", "-0"], 5), Err(ShapeError::Empty));
}

#[test]
fn serialized_shapes_are_rows() {
    let shape = t_shape();
    let json = serde_json::to_string(&shape).unwrap();
    assert_eq!(json, r#"["010","111","000"]"#);
    let back: ShapeMatrix = serde_json::from_str(&json).unwrap();
    assert_eq!(back, shape);
}

#[test]
fn malformed_serialized_shapes_are_rejected() {
    assert!(serde_json::from_str::<ShapeMatrix>(r#"{"size":3,"cells":[true]}"#).is_err());
    assert!(serde_json::from_str::<ShapeMatrix>(r#"["010","11","000"]"#).is_err());
    assert!(serde_json::from_str::<ShapeMatrix>(r#"["1"]"#).is_err());
    assert!(serde_json::from_str::<ShapeMatrix>(r#"["00","00"]"#).is_err());
}

#[test]
fn rotation_is_clockwise() {
    let shape = t_shape();
    assert_eq!(shape.rotated_cw().to_rows(), vec!["010", "011", "010"]);
    assert_eq!(
        shape.rotated_cw().rotated_cw().to_rows(),
        vec!["000", "111", "010"]
    );

    let j = ShapeMatrix::build(&["100", "111", "000"], 3).unwrap();
    assert_eq!(j.rotated_cw().to_rows(), vec!["011", "010", "010"]);

    let i = ShapeMatrix::build(&["0000", "1111", "0000", "0000"], 4).unwrap();
    assert_eq!(
        i.rotated_cw().to_rows(),
        vec!["0010", "0010", "0010", "0010"]
    );
}

#[test]
fn rotation_leaves_receiver_alone() {
    let shape = t_shape();
    let before = shape.clone();
    let _ = shape.rotated_cw();
    assert_eq!(shape, before);
}

#[test]
fn iter_cells_matches_get() {
    let shape = t_shape();
    let cells: Vec<_> = shape.iter_cells().collect();
    assert_eq!(
        cells,
        vec![
            Point2::new(1, 0),
            Point2::new(0, 1),
            Point2::new(1, 1),
            Point2::new(2, 1)
        ]
    );
}
