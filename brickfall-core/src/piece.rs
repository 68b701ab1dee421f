//! Falling pieces.

use crate::clear::RowSpan;
use crate::error::SpawnBlocked;
use crate::field::PlayField;
use crate::geom::Point2;
use crate::shape::{Shape, ShapeMatrix};
use core::ops::Add;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::sync::Arc;

/// Possible rotations, relative to the registered orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Rotation {
    None = 0,
    CW = 1,
    Flip = 2,
    CCW = 3,
}

impl Rotation {
    /// Number of clockwise rotations needed to achieve this rotation.
    pub fn cw_steps(&self) -> usize {
        match self {
            Rotation::None => 0,
            Rotation::CW => 1,
            Rotation::Flip => 2,
            Rotation::CCW => 3,
        }
    }
}

impl From<usize> for Rotation {
    fn from(this: usize) -> Self {
        match this % 4 {
            0 => Rotation::None,
            1 => Rotation::CW,
            2 => Rotation::Flip,
            3 => Rotation::CCW,
            _ => unreachable!(),
        }
    }
}

impl Into<usize> for Rotation {
    fn into(self) -> usize {
        self.cw_steps()
    }
}

impl Add<isize> for Rotation {
    type Output = Rotation;
    fn add(self, rhs: isize) -> Self {
        let c: usize = self.into();
        let c = ((c as isize + rhs % 4) + 4) as usize;
        c.into()
    }
}

/// Horizontal movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn dx(self) -> isize {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

/// Result of trying to move a piece down by one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallOutcome {
    /// The piece moved down.
    Fell,
    /// The piece is resting on something and has to be locked where it is.
    Locked,
}

/// A registered piece type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceType {
    name: String,
    shape: Arc<ShapeMatrix>,
}

impl PieceType {
    pub fn new(name: impl Into<String>, shape: ShapeMatrix) -> PieceType {
        PieceType {
            name: name.into(),
            shape: Arc::new(shape),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the shape in its registered orientation.
    pub fn shape(&self) -> &Arc<ShapeMatrix> {
        &self.shape
    }
}

/// The falling piece.
///
/// The anchor is the field position of the matrix's top-left cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePiece {
    name: String,
    shape: Arc<ShapeMatrix>,
    pos: Point2<isize>,
    rotation: Rotation,
    dropped: bool,
}

impl ActivePiece {
    /// Returns the spawn anchor for a shape: centered between the walls, top row at the top
    /// of the field.
    pub fn spawn_pos(shape: &ShapeMatrix, field: &PlayField) -> Point2<isize> {
        let x = field.width() / 2 - shape.size() / 2;
        let y = field.height() - 1;
        Point2::new(x as isize, y as isize)
    }

    /// Places a new piece of the given type at its spawn position.
    ///
    /// Fails if the spawn position is already occupied, which means the game is over.
    pub fn try_spawn(piece_type: &PieceType, field: &PlayField) -> Result<ActivePiece, SpawnBlocked> {
        let pos = Self::spawn_pos(&piece_type.shape, field);
        if field.would_collide(&*piece_type.shape, pos) {
            return Err(SpawnBlocked { pos });
        }
        Ok(ActivePiece {
            name: piece_type.name.clone(),
            shape: Arc::clone(&piece_type.shape),
            pos,
            rotation: Rotation::None,
            dropped: false,
        })
    }

    /// Returns the name of the piece type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current orientation.
    pub fn shape(&self) -> &ShapeMatrix {
        &self.shape
    }

    /// Returns the position.
    pub fn pos(&self) -> Point2<isize> {
        self.pos
    }

    /// Returns the rotation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Returns true if the piece has been dropped.
    pub fn is_dropped(&self) -> bool {
        self.dropped
    }

    pub(crate) fn set_dropped(&mut self) {
        self.dropped = true;
    }

    /// Attempts to move this piece one column. Returns true if it moved.
    pub fn try_move(&mut self, field: &PlayField, dir: Direction) -> bool {
        let pos = self.pos + Point2::new(dir.dx(), 0);
        if field.would_collide(self, pos) {
            return false;
        }
        self.pos = pos;
        true
    }

    /// Attempts to rotate this piece clockwise in place. Returns true if it rotated.
    pub fn try_rotate_cw(&mut self, field: &PlayField) -> bool {
        let rotated = self.shape.rotated_cw();
        if field.would_collide(&rotated, self.pos) {
            return false;
        }
        self.shape = Arc::new(rotated);
        self.rotation = self.rotation + 1;
        true
    }

    /// Attempts to move this piece down by one row.
    pub fn try_fall(&mut self, field: &PlayField) -> FallOutcome {
        let pos = self.pos + Point2::new(0, -1);
        if field.would_collide(self, pos) {
            FallOutcome::Locked
        } else {
            self.pos = pos;
            FallOutcome::Fell
        }
    }

    /// Writes this piece into the field and returns the rows it may have completed.
    pub fn lock(self, field: &mut PlayField) -> RowSpan {
        field.commit(&self, self.pos);
        RowSpan::for_piece(self.pos.y, self.shape.size())
    }
}

impl Shape for ActivePiece {
    fn iter_cells<'a>(&'a self) -> Box<dyn Iterator<Item = Point2<usize>> + 'a> {
        self.shape.iter_cells()
    }
}

/// What a renderer needs to draw the falling piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceSnapshot {
    pub name: String,
    pub x: isize,
    pub y: isize,
    pub rotation: Rotation,
    pub rows: Vec<String>,
}

impl From<&ActivePiece> for PieceSnapshot {
    fn from(this: &ActivePiece) -> Self {
        PieceSnapshot {
            name: this.name.clone(),
            x: this.pos.x,
            y: this.pos.y,
            rotation: this.rotation,
            rows: this.shape.to_rows(),
        }
    }
}

#[cfg(test)]
fn piece_type(name: &str, rows: &[&str]) -> PieceType {
    PieceType::new(name, ShapeMatrix::build(rows, 4).unwrap())
}

#[test]
fn rotation_to_from_usize() {
    assert_eq!(Rotation::from(0), Rotation::None);
    assert_eq!(Rotation::from(4), Rotation::from(0));
    let i: usize = Rotation::CW.into();
    assert_eq!(i, 1);
    assert_eq!(Rotation::CCW + 1, Rotation::None);
    assert_eq!(Rotation::None + -1, Rotation::CCW);
}

#[test]
fn spawn_is_centered() {
    // width 4 + 2 * 4 = 12
    let field = PlayField::new(4, 6, 4).unwrap();
    let o = piece_type("O", &["11", "11"]);
    let t = piece_type("T", &["010", "111", "000"]);
    let i = piece_type("I", &["0000", "1111", "0000", "0000"]);

    let o = ActivePiece::try_spawn(&o, &field).unwrap();
    assert_eq!(o.pos(), Point2::new(5, 9));
    let t = ActivePiece::try_spawn(&t, &field).unwrap();
    assert_eq!(t.pos(), Point2::new(5, 9));
    let i = ActivePiece::try_spawn(&i, &field).unwrap();
    assert_eq!(i.pos(), Point2::new(4, 9));
    assert_eq!(i.rotation(), Rotation::None);
    assert!(!i.is_dropped());
}

#[test]
fn spawn_blocked_by_stack() {
    let mut field = PlayField::new(4, 2, 2).unwrap();
    let o = piece_type("O", &["11", "11"]);
    let pos = ActivePiece::spawn_pos(o.shape(), &field);
    field.commit(&**o.shape(), pos);

    assert_eq!(
        ActivePiece::try_spawn(&o, &field),
        Err(SpawnBlocked { pos })
    );
}

#[test]
fn move_stops_at_walls() {
    let field = PlayField::new(4, 6, 2).unwrap();
    let o = piece_type("O", &["11", "11"]);
    let mut piece = ActivePiece::try_spawn(&o, &field).unwrap();
    assert_eq!(piece.pos().x, 3);

    assert!(piece.try_move(&field, Direction::Left));
    assert_eq!(piece.pos().x, 2);
    assert!(!piece.try_move(&field, Direction::Left));
    assert_eq!(piece.pos().x, 2);

    assert!(piece.try_move(&field, Direction::Right));
    assert!(piece.try_move(&field, Direction::Right));
    assert!(!piece.try_move(&field, Direction::Right));
    assert_eq!(piece.pos().x, 4);
}

#[test]
fn rotation_blocked_by_wall_keeps_orientation() {
    let field = PlayField::new(4, 6, 4).unwrap();
    // vertical bar in the rightmost matrix column
    let bar = piece_type("I", &["0001", "0001", "0001", "0001"]);
    let mut piece = ActivePiece::try_spawn(&bar, &field).unwrap();
    while piece.try_move(&field, Direction::Left) {}
    // matrix column 3 is against the left wall at x = 4, so the matrix starts at x = 1
    assert_eq!(piece.pos().x, 1);

    let before = piece.shape().clone();
    assert!(!piece.try_rotate_cw(&field));
    assert_eq!(piece.shape(), &before);
    assert_eq!(piece.rotation(), Rotation::None);
}

#[test]
fn rotation_applies_when_free() {
    let field = PlayField::new(6, 6, 3).unwrap();
    let t = piece_type("T", &["010", "111", "000"]);
    let mut piece = ActivePiece::try_spawn(&t, &field).unwrap();
    piece.try_fall(&field);

    assert!(piece.try_rotate_cw(&field));
    assert_eq!(piece.rotation(), Rotation::CW);
    assert_eq!(piece.shape().to_rows(), vec!["010", "011", "010"]);
    // the registered shape is shared and stays as it was
    assert_eq!(t.shape().to_rows(), vec!["010", "111", "000"]);
}

#[test]
fn fall_until_locked() {
    let mut field = PlayField::new(4, 4, 2).unwrap();
    let o = piece_type("O", &["11", "11"]);
    let mut piece = ActivePiece::try_spawn(&o, &field).unwrap();
    assert_eq!(piece.pos().y, 5);

    let mut falls = 0;
    while piece.try_fall(&field) == FallOutcome::Fell {
        falls += 1;
    }
    assert_eq!(falls, 3);
    assert_eq!(piece.pos().y, 2);
    // resting pieces stay put
    assert_eq!(piece.try_fall(&field), FallOutcome::Locked);
    assert_eq!(piece.pos().y, 2);

    let span = piece.lock(&mut field);
    assert_eq!((span.start(), span.end()), (1, 3));
    assert_eq!(field.stack_count(), 4);
}

#[test]
fn snapshot_carries_orientation() {
    let field = PlayField::new(6, 6, 3).unwrap();
    let s = piece_type("S", &["011", "110", "000"]);
    let piece = ActivePiece::try_spawn(&s, &field).unwrap();
    let snapshot = PieceSnapshot::from(&piece);
    assert_eq!(snapshot.name, "S");
    assert_eq!((snapshot.x, snapshot.y), (piece.pos().x, piece.pos().y));
    assert_eq!(snapshot.rows, vec!["011", "110", "000"]);
}
