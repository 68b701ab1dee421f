//! Construction errors.
//!
//! Only definitions and configuration can fail. Blocked moves, rotations and falls are
//! ordinary outcomes and never show up here.

use crate::geom::Point2;
use thiserror::Error;

/// A shape definition that cannot be turned into a [`ShapeMatrix`](crate::shape::ShapeMatrix).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("shapes must have at least two rows, got {0}")]
    TooFewRows(usize),

    #[error("row {row} has length {len} but the shape has {size} rows (shapes must be square)")]
    NotSquare { row: usize, len: usize, size: usize },

    #[error("shape size {size} exceeds the maximum piece size {max}")]
    TooLarge { size: usize, max: usize },

    #[error("shapes must have at least one filled cell")]
    Empty,
}

/// An invalid session configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDimension(&'static str),

    #[error("a {width} x {height} field with maxPieceSize {border} is too large")]
    FieldTooLarge {
        width: usize,
        height: usize,
        border: usize,
    },

    #[error("maxPieceSize must be at least 2, got {0}")]
    PieceSizeTooSmall(usize),

    #[error("{name} must be a positive finite number, got {value}")]
    InvalidSpeed { name: &'static str, value: f64 },

    #[error("{name} must be a finite number that is not negative, got {value}")]
    InvalidAmount { name: &'static str, value: f64 },

    #[error("rowsClearedToSpeedup must be at least 1")]
    ZeroSpeedupThreshold,

    #[error("at least one shape must be registered")]
    NoShapes,

    #[error("shape {index} ({name:?}) is invalid: {source}")]
    Shape {
        index: usize,
        name: String,
        #[source]
        source: ShapeError,
    },

    #[error("shape {index} ({name:?}) has size {size} but the playable width is only {width}")]
    ShapeWiderThanField {
        index: usize,
        name: String,
        size: usize,
        width: usize,
    },
}

/// A new piece overlaps the stack at its spawn position. This ends the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("spawn blocked at ({}, {})", .pos.x, .pos.y)]
pub struct SpawnBlocked {
    pub pos: Point2<isize>,
}
