//! Geometric primitives.

use core::ops::Add;
use serde::{Deserialize, Serialize};

/// A point on the field grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point2<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point2<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> Add<Self> for Point2<T>
where
    T: Add<T, Output = T>,
{
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl<T> From<(T, T)> for Point2<T> {
    fn from(this: (T, T)) -> Self {
        Self::new(this.0, this.1)
    }
}

impl<T> Into<(T, T)> for Point2<T> {
    fn into(self) -> (T, T) {
        (self.x, self.y)
    }
}

impl Point2<isize> {
    /// Maps a cell of a shape matrix (row 0 at the top) to field coordinates
    /// (row 0 at the floor), taking `self` as the matrix anchor.
    pub fn shape_cell(self, cell: Point2<usize>) -> Point2<isize> {
        Point2::new(self.x + cell.x as isize, self.y - cell.y as isize)
    }
}

#[test]
fn point_arithmetic() {
    let a: Point2<isize> = (3, -2).into();
    let b: Point2<isize> = (-1, 5).into();
    assert_eq!(a + b, Point2::new(2, 3));
    let t: (isize, isize) = a.into();
    assert_eq!(t, (3, -2));
}

#[test]
fn shape_cells_map_downwards() {
    let anchor = Point2::new(4isize, 10);
    assert_eq!(anchor.shape_cell(Point2::new(0, 0)), Point2::new(4, 10));
    assert_eq!(anchor.shape_cell(Point2::new(2, 1)), Point2::new(6, 9));
    assert_eq!(anchor.shape_cell(Point2::new(1, 3)), Point2::new(5, 7));
}
