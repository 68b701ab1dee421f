//! Game logic for a falling-block puzzle.
//!
//! A [`GameSession`] owns a [`PlayField`] and the falling piece, and is driven by discrete
//! commands from a host. Rendering, input and timing stay with the host; see [`pacing`] for
//! helpers that turn elapsed time into commands.

#[macro_use]
extern crate log;

pub mod clear;
pub mod config;
pub mod error;
pub mod field;
pub mod geom;
pub mod pacing;
pub mod piece;
pub mod session;
pub mod shape;

pub use config::{Config, ShapeDef};
pub use error::{ConfigError, ShapeError, SpawnBlocked};
pub use field::{Cell, FieldSnapshot, PlayField};
pub use piece::{ActivePiece, Direction, FallOutcome, PieceSnapshot, PieceType, Rotation};
pub use session::{CommandOutcome, GameSession, LockReport, SpawnOutcome, TickOutcome};
pub use shape::{Shape, ShapeMatrix};
