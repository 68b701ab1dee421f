//! A running game.

use crate::clear::{self, ClearReport};
use crate::config::Config;
use crate::error::ConfigError;
use crate::field::{FieldSnapshot, PlayField};
use crate::piece::{ActivePiece, Direction, FallOutcome, PieceSnapshot, PieceType};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Result of a move, rotate or drop command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    /// The command changed the active piece.
    Applied,
    /// The command was blocked, or there is nothing to apply it to.
    Rejected,
    /// The game is over; nothing changed.
    SessionOver,
}

impl CommandOutcome {
    pub fn is_applied(self) -> bool {
        self == CommandOutcome::Applied
    }
}

/// Result of asking for a new piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnOutcome {
    Spawned,
    /// A piece is already falling; it was left alone.
    AlreadyActive,
    /// The new piece did not fit. The game has just ended.
    GameOver,
    SessionOver,
}

/// What happened when a piece locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockReport {
    pub cleared: ClearReport,
    /// How many times the fall speed went up because of this lock.
    pub speedups: u32,
    /// True if the next piece could not spawn.
    pub game_over: bool,
}

impl LockReport {
    pub fn rows_cleared(&self) -> usize {
        self.cleared.count()
    }
}

/// Result of one gravity step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TickOutcome {
    Fell,
    Locked(LockReport),
    /// No piece is falling.
    Idle,
    SessionOver,
}

/// A game session: the field, the falling piece and the speed progression.
///
/// Sessions are not synchronized. A host that shares one between threads has to put it behind
/// a lock.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: Config,
    piece_types: Vec<PieceType>,
    field: PlayField,
    active: Option<ActivePiece>,
    fall_speed: f64,
    rows_cleared_since_speedup: u32,
    total_rows_cleared: usize,
    pieces_locked: usize,
    is_game_over: bool,
    rng: StdRng,
}

impl GameSession {
    /// Creates a session with a randomly seeded piece generator.
    pub fn new(config: Config) -> Result<GameSession, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Creates a session whose piece sequence is determined by `seed`.
    pub fn with_seed(config: Config, seed: u64) -> Result<GameSession, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Creates a session drawing pieces from `rng`.
    ///
    /// Every constructor leaves the session idle with an empty field. The host starts the
    /// game by calling [`spawn_next`](GameSession::spawn_next); until then gravity steps
    /// return [`TickOutcome::Idle`].
    pub fn with_rng(config: Config, rng: StdRng) -> Result<GameSession, ConfigError> {
        let (field, piece_types) = config.build()?;
        Ok(GameSession {
            fall_speed: config.base_fall_speed,
            config,
            piece_types,
            field,
            active: None,
            rows_cleared_since_speedup: 0,
            total_rows_cleared: 0,
            pieces_locked: 0,
            is_game_over: false,
            rng,
        })
    }

    /// Spawns a randomly chosen piece if none is falling.
    pub fn spawn_next(&mut self) -> SpawnOutcome {
        if self.is_game_over {
            return SpawnOutcome::SessionOver;
        }
        if self.active.is_some() {
            return SpawnOutcome::AlreadyActive;
        }

        let piece_type = match self.piece_types.choose(&mut self.rng) {
            Some(piece_type) => piece_type,
            None => return SpawnOutcome::GameOver,
        };
        match ActivePiece::try_spawn(piece_type, &self.field) {
            Ok(piece) => {
                debug!("spawned {} at {:?}", piece.name(), piece.pos());
                self.active = Some(piece);
                SpawnOutcome::Spawned
            }
            Err(err) => {
                info!("game over: {} (piece {})", err, piece_type.name());
                self.is_game_over = true;
                SpawnOutcome::GameOver
            }
        }
    }

    fn steer<F>(&mut self, f: F) -> CommandOutcome
    where
        F: FnOnce(&mut ActivePiece, &PlayField) -> bool,
    {
        if self.is_game_over {
            return CommandOutcome::SessionOver;
        }
        match &mut self.active {
            // a dropped piece no longer takes input
            Some(piece) if !piece.is_dropped() => {
                if f(piece, &self.field) {
                    CommandOutcome::Applied
                } else {
                    CommandOutcome::Rejected
                }
            }
            _ => CommandOutcome::Rejected,
        }
    }

    /// Attempts to move the active piece left.
    pub fn move_left(&mut self) -> CommandOutcome {
        self.steer(|piece, field| piece.try_move(field, Direction::Left))
    }

    /// Attempts to move the active piece right.
    pub fn move_right(&mut self) -> CommandOutcome {
        self.steer(|piece, field| piece.try_move(field, Direction::Right))
    }

    /// Attempts to rotate the active piece clockwise.
    pub fn rotate(&mut self) -> CommandOutcome {
        self.steer(|piece, field| piece.try_rotate_cw(field))
    }

    /// Switches the active piece to the drop speed.
    ///
    /// From here on the piece only falls; moves and rotations are rejected.
    pub fn drop_piece(&mut self) -> CommandOutcome {
        self.steer(|piece, _| {
            piece.set_dropped();
            true
        })
    }

    /// Moves the active piece down one row, locking it if it cannot fall.
    ///
    /// A lock writes the piece into the field, clears completed rows, updates the speed and
    /// spawns the next piece.
    pub fn advance_fall(&mut self) -> TickOutcome {
        if self.is_game_over {
            return TickOutcome::SessionOver;
        }
        let outcome = match &mut self.active {
            Some(piece) => piece.try_fall(&self.field),
            None => return TickOutcome::Idle,
        };

        match outcome {
            FallOutcome::Fell => TickOutcome::Fell,
            FallOutcome::Locked => TickOutcome::Locked(self.lock_active()),
        }
    }

    fn lock_active(&mut self) -> LockReport {
        let mut report = LockReport {
            cleared: ClearReport::default(),
            speedups: 0,
            game_over: false,
        };

        if let Some(piece) = self.active.take() {
            debug!("locking {} at {:?}", piece.name(), piece.pos());
            let span = piece.lock(&mut self.field);
            self.pieces_locked += 1;

            report.cleared = clear::clear_lines(&mut self.field, span);
            report.speedups = self.count_cleared_rows(report.cleared.count());
            if !report.cleared.is_empty() {
                info!(
                    "cleared {} row(s), {} total",
                    report.cleared.count(),
                    self.total_rows_cleared
                );
            }
        }

        report.game_over = self.spawn_next() == SpawnOutcome::GameOver;
        report
    }

    /// Adds cleared rows to the counters and applies the speedups they earn.
    fn count_cleared_rows(&mut self, rows: usize) -> u32 {
        let mut speedups = 0;
        for _ in 0..rows {
            self.total_rows_cleared += 1;
            self.rows_cleared_since_speedup += 1;
            if self.rows_cleared_since_speedup == self.config.rows_cleared_to_speedup {
                self.rows_cleared_since_speedup = 0;
                self.fall_speed += self.config.speedup_increment;
                speedups += 1;
                info!("fall speed is now {} rows/s", self.fall_speed);
            }
        }
        speedups
    }

    /// Returns true once a piece has failed to spawn.
    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    /// Returns the regular fall speed in rows per second.
    pub fn fall_speed(&self) -> f64 {
        self.fall_speed
    }

    /// Returns the speed the active piece is falling at right now.
    pub fn effective_fall_speed(&self) -> f64 {
        match &self.active {
            Some(piece) if piece.is_dropped() => self.config.drop_fall_speed,
            _ => self.fall_speed,
        }
    }

    pub fn rows_cleared_since_speedup(&self) -> u32 {
        self.rows_cleared_since_speedup
    }

    pub fn total_rows_cleared(&self) -> usize {
        self.total_rows_cleared
    }

    pub fn pieces_locked(&self) -> usize {
        self.pieces_locked
    }

    /// Returns the field.
    pub fn field(&self) -> &PlayField {
        &self.field
    }

    /// Returns the active piece.
    pub fn active_piece(&self) -> Option<&ActivePiece> {
        self.active.as_ref()
    }

    /// Returns the registered piece types.
    pub fn piece_types(&self) -> &[PieceType] {
        &self.piece_types
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the occupancy grid, with or without walls and floor.
    pub fn field_snapshot(&self, include_border: bool) -> FieldSnapshot {
        self.field.snapshot(include_border)
    }

    /// Returns the active piece for drawing.
    pub fn piece_snapshot(&self) -> Option<PieceSnapshot> {
        self.active.as_ref().map(PieceSnapshot::from)
    }
}

#[cfg(test)]
use crate::config::ShapeDef;

#[cfg(test)]
fn single_shape_config(rows: &[&str]) -> Config {
    Config {
        playable_width: 4,
        playable_height: 4,
        max_piece_size: 2,
        shapes: vec![ShapeDef::new("P", rows)],
        ..Config::default()
    }
}

#[test]
fn session_starts_idle() {
    let mut session = GameSession::with_seed(single_shape_config(&["11", "11"]), 1).unwrap();
    assert!(session.active_piece().is_none());
    assert_eq!(session.advance_fall(), TickOutcome::Idle);
    assert_eq!(session.move_left(), CommandOutcome::Rejected);
    assert_eq!(session.spawn_next(), SpawnOutcome::Spawned);
    assert_eq!(session.spawn_next(), SpawnOutcome::AlreadyActive);
    assert_eq!(session.fall_speed(), 2.);
}

#[test]
fn oversized_json_config_is_rejected() {
    let config: Config =
        serde_json::from_str(r#"{ "playableWidth": 18446744073709551615 }"#).unwrap();
    assert_eq!(
        GameSession::new(config).err(),
        Some(ConfigError::FieldTooLarge {
            width: usize::MAX,
            height: 13,
            border: 5,
        })
    );
}

#[test]
fn stacking_until_game_over() {
    // a 2-wide column in the middle of a 4-wide field fills up after a few pieces
    let mut session = GameSession::with_seed(single_shape_config(&["11", "11"]), 7).unwrap();
    session.spawn_next();

    let mut locks = 0;
    let game_over = loop {
        match session.advance_fall() {
            TickOutcome::Fell => (),
            TickOutcome::Locked(report) => {
                locks += 1;
                assert_eq!(report.rows_cleared(), 0);
                if report.game_over {
                    break true;
                }
            }
            TickOutcome::Idle | TickOutcome::SessionOver => break false,
        }
        assert!(locks < 10, "should have ended by now");
    };

    assert!(game_over);
    assert!(session.is_game_over());
    // rows 1..=4 hold two pieces and the third overlaps the second at spawn
    assert_eq!(locks, 2);
    assert_eq!(session.pieces_locked(), 2);
    assert!(session.active_piece().is_none());

    let before = session.field().clone();
    assert_eq!(session.move_left(), CommandOutcome::SessionOver);
    assert_eq!(session.rotate(), CommandOutcome::SessionOver);
    assert_eq!(session.drop_piece(), CommandOutcome::SessionOver);
    assert_eq!(session.advance_fall(), TickOutcome::SessionOver);
    assert_eq!(session.spawn_next(), SpawnOutcome::SessionOver);
    assert_eq!(session.field(), &before);
}

#[test]
fn dropped_piece_ignores_steering() {
    let mut session = GameSession::with_seed(single_shape_config(&["11", "11"]), 3).unwrap();
    session.spawn_next();
    assert_eq!(session.effective_fall_speed(), 2.);

    assert_eq!(session.drop_piece(), CommandOutcome::Applied);
    assert_eq!(session.effective_fall_speed(), 30.);
    assert_eq!(session.move_left(), CommandOutcome::Rejected);
    assert_eq!(session.drop_piece(), CommandOutcome::Rejected);

    while let TickOutcome::Fell = session.advance_fall() {}
    // the next piece falls at the regular speed again
    assert_eq!(session.effective_fall_speed(), 2.);
    assert_eq!(session.move_left(), CommandOutcome::Applied);
}

#[test]
fn clearing_rows_speeds_up() {
    let config = Config {
        rows_cleared_to_speedup: 2,
        speedup_increment: 0.25,
        ..single_shape_config(&["00", "11"])
    };
    let mut session = GameSession::with_seed(config, 11).unwrap();
    session.spawn_next();

    fn fill_row(session: &mut GameSession) -> LockReport {
        // left half, then right half of the bottom row
        assert!(session.move_left().is_applied());
        let mut first = None;
        while first.is_none() {
            if let TickOutcome::Locked(report) = session.advance_fall() {
                first = Some(report);
            }
        }
        assert_eq!(first.map(|r| r.rows_cleared()), Some(0));

        assert!(session.move_right().is_applied());
        loop {
            if let TickOutcome::Locked(report) = session.advance_fall() {
                return report;
            }
        }
    }

    let report = fill_row(&mut session);
    assert_eq!(report.rows_cleared(), 1);
    assert_eq!(report.speedups, 0);
    assert_eq!(session.rows_cleared_since_speedup(), 1);
    assert_eq!(session.fall_speed(), 2.);

    let report = fill_row(&mut session);
    assert_eq!(report.rows_cleared(), 1);
    assert_eq!(report.speedups, 1);
    assert_eq!(session.rows_cleared_since_speedup(), 0);
    assert_eq!(session.fall_speed(), 2.25);
    assert_eq!(session.total_rows_cleared(), 2);
    assert_eq!(session.field().stack_count(), 0);
}
