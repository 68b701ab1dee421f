//! Drives a session on a simulated clock.

use brickfall_core::pacing::{GravityClock, MoveRepeat};
use brickfall_core::{CommandOutcome, GameSession, LockReport, SpawnOutcome, TickOutcome};
use core::fmt;
use serde::Serialize;
use std::collections::VecDeque;
use std::str::FromStr;
use thiserror::Error;

/// A single scripted input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptCommand {
    Left,
    Right,
    Rotate,
    Drop,
    /// Do nothing for this many seconds.
    Wait(f64),
    /// Hold the remaining commands until the current piece has locked.
    Next,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("bad wait time in {0:?}")]
    BadWait(String),
    #[error("bad repeat count in {0:?}")]
    BadRepeat(String),
}

impl FromStr for ScriptCommand {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("wait:") {
            let secs: f64 = s["wait:".len()..]
                .parse()
                .map_err(|_| ScriptError::BadWait(s.to_string()))?;
            if !(secs.is_finite() && secs >= 0.) {
                return Err(ScriptError::BadWait(s.to_string()));
            }
            return Ok(ScriptCommand::Wait(secs));
        }

        match s {
            "left" | "l" => Ok(ScriptCommand::Left),
            "right" | "r" => Ok(ScriptCommand::Right),
            "rotate" | "cw" => Ok(ScriptCommand::Rotate),
            "drop" | "d" => Ok(ScriptCommand::Drop),
            "next" | "n" => Ok(ScriptCommand::Next),
            _ => Err(ScriptError::Unknown(s.to_string())),
        }
    }
}

/// Parses a script such as `left*2 rotate drop next right, drop`.
///
/// Commands are separated by whitespace or commas; `*N` repeats a command.
pub fn parse_script(s: &str) -> Result<Vec<ScriptCommand>, ScriptError> {
    let mut commands = Vec::new();
    for token in s.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        let (name, count) = match token.find('*') {
            Some(i) => {
                let count = token[i + 1..]
                    .parse::<usize>()
                    .map_err(|_| ScriptError::BadRepeat(token.to_string()))?;
                (&token[..i], count)
            }
            None => (token, 1),
        };
        let command: ScriptCommand = name.parse()?;
        commands.extend(std::iter::repeat(command).take(count));
    }
    Ok(commands)
}

/// When to stop a run that has not ended on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct Limits {
    pub max_ticks: Option<u64>,
    pub max_pieces: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub ticks: u64,
    pub pieces_locked: usize,
    pub rows_cleared: usize,
    pub fall_speed: f64,
    pub game_over: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ticks, {} pieces, {} rows, speed {} rows/s{}",
            self.ticks,
            self.pieces_locked,
            self.rows_cleared,
            self.fall_speed,
            if self.game_over { ", game over" } else { "" }
        )
    }
}

pub struct Runner {
    session: GameSession,
    script: VecDeque<ScriptCommand>,
    gravity: GravityClock,
    repeat: MoveRepeat,
    dt: f64,
    wait: f64,
    /// Pieces locked when a `next` command was reached.
    awaiting_lock: Option<usize>,
    ticks: u64,
}

impl Runner {
    /// Creates a runner that advances `tick_rate` frames per simulated second.
    pub fn new(session: GameSession, script: Vec<ScriptCommand>, tick_rate: f64) -> Runner {
        let gravity = GravityClock::for_spawn(session.fall_speed());
        let repeat = MoveRepeat::new(session.config().move_repeat_delay);
        Runner {
            session,
            script: script.into(),
            gravity,
            repeat,
            dt: 1. / tick_rate,
            wait: 0.,
            awaiting_lock: None,
            ticks: 0,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Runs one frame. Returns false once the game is over.
    pub fn step(&mut self) -> bool {
        if self.session.is_game_over() {
            return false;
        }
        if self.session.active_piece().is_none() {
            match self.session.spawn_next() {
                SpawnOutcome::Spawned => self.reset_gravity(),
                SpawnOutcome::AlreadyActive => (),
                SpawnOutcome::GameOver | SpawnOutcome::SessionOver => return false,
            }
        }

        self.ticks += 1;
        self.repeat.advance(self.dt);
        self.run_script();

        let steps = self
            .gravity
            .advance(self.dt, self.session.effective_fall_speed());
        for _ in 0..steps {
            match self.session.advance_fall() {
                TickOutcome::Fell => (),
                TickOutcome::Locked(report) => {
                    self.log_lock(&report);
                    if report.game_over {
                        return false;
                    }
                    // leftover steps belonged to the piece that just locked
                    self.reset_gravity();
                    break;
                }
                TickOutcome::Idle => break,
                TickOutcome::SessionOver => return false,
            }
        }
        true
    }

    /// Steps until the game ends or a limit is hit.
    pub fn run(&mut self, limits: &Limits) -> RunSummary {
        loop {
            if limits.max_ticks.map_or(false, |max| self.ticks >= max) {
                info!("stopping after {} ticks", self.ticks);
                break;
            }
            if limits
                .max_pieces
                .map_or(false, |max| self.session.pieces_locked() >= max)
            {
                info!("stopping after {} pieces", self.session.pieces_locked());
                break;
            }
            if !self.step() {
                break;
            }
        }
        self.summary()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.ticks,
            pieces_locked: self.session.pieces_locked(),
            rows_cleared: self.session.total_rows_cleared(),
            fall_speed: self.session.fall_speed(),
            game_over: self.session.is_game_over(),
        }
    }

    fn reset_gravity(&mut self) {
        self.gravity = GravityClock::for_spawn(self.session.fall_speed());
    }

    fn run_script(&mut self) {
        if self.wait > 0. {
            self.wait -= self.dt;
            return;
        }
        if let Some(locked) = self.awaiting_lock {
            if self.session.pieces_locked() <= locked {
                return;
            }
            self.awaiting_lock = None;
        }

        let command = match self.script.front() {
            Some(command) => *command,
            None => return,
        };
        let outcome = match command {
            ScriptCommand::Left | ScriptCommand::Right => {
                // held until the repeat delay runs out
                if !self.repeat.is_ready() {
                    return;
                }
                let outcome = if command == ScriptCommand::Left {
                    self.session.move_left()
                } else {
                    self.session.move_right()
                };
                if outcome.is_applied() {
                    self.repeat.trigger();
                }
                outcome
            }
            ScriptCommand::Rotate => self.session.rotate(),
            ScriptCommand::Drop => {
                let outcome = self.session.drop_piece();
                if outcome.is_applied() {
                    self.gravity.skip_delay();
                }
                outcome
            }
            ScriptCommand::Wait(secs) => {
                self.wait = secs;
                CommandOutcome::Applied
            }
            ScriptCommand::Next => {
                self.awaiting_lock = Some(self.session.pieces_locked());
                CommandOutcome::Applied
            }
        };
        self.script.pop_front();

        match outcome {
            CommandOutcome::Applied => trace!("tick {}: {:?}", self.ticks, command),
            CommandOutcome::Rejected => debug!("tick {}: {:?} rejected", self.ticks, command),
            CommandOutcome::SessionOver => warn!("{:?} ignored, the game is over", command),
        }
    }

    fn log_lock(&self, report: &LockReport) {
        debug!(
            "tick {}: piece {} locked",
            self.ticks,
            self.session.pieces_locked()
        );
        if !report.cleared.is_empty() {
            info!("tick {}: cleared rows {:?}", self.ticks, report.cleared.rows);
        }
        if report.speedups > 0 {
            info!("fall speed up to {} rows/s", self.session.fall_speed());
        }
        if report.game_over {
            info!(
                "game over after {} pieces and {} rows",
                self.session.pieces_locked(),
                self.session.total_rows_cleared()
            );
        }
    }
}

#[cfg(test)]
use brickfall_core::{Config, ShapeDef};

#[cfg(test)]
fn o_session() -> GameSession {
    let config = Config {
        playable_width: 4,
        playable_height: 4,
        max_piece_size: 2,
        shapes: vec![ShapeDef::new("O", &["11", "11"])],
        ..Config::default()
    };
    GameSession::with_seed(config, 1).unwrap()
}

#[test]
fn parse_script_commands() {
    let script = parse_script("left*2, rotate  drop\nnext wait:0.5 r").unwrap();
    assert_eq!(
        script,
        vec![
            ScriptCommand::Left,
            ScriptCommand::Left,
            ScriptCommand::Rotate,
            ScriptCommand::Drop,
            ScriptCommand::Next,
            ScriptCommand::Wait(0.5),
            ScriptCommand::Right,
        ]
    );
    assert_eq!(parse_script("").unwrap(), vec![]);
}

#[test]
fn parse_script_errors() {
    assert_eq!(
        parse_script("left jump"),
        Err(ScriptError::Unknown("jump".to_string()))
    );
    assert_eq!(
        parse_script("wait:-1"),
        Err(ScriptError::BadWait("wait:-1".to_string()))
    );
    assert_eq!(
        parse_script("drop*x"),
        Err(ScriptError::BadRepeat("drop*x".to_string()))
    );
}

#[test]
fn unattended_game_stacks_up() {
    let mut runner = Runner::new(o_session(), Vec::new(), 60.);
    let summary = runner.run(&Limits::default());
    assert!(summary.game_over);
    assert_eq!(summary.pieces_locked, 2);
    assert_eq!(summary.rows_cleared, 0);
    assert!(!runner.step());
}

#[test]
fn scripted_game_clears_rows() {
    let script = parse_script("left drop next right drop").unwrap();
    let mut runner = Runner::new(o_session(), script, 60.);
    let summary = runner.run(&Limits::default());
    // two pieces fill the bottom two rows, two more stack up in the middle
    assert_eq!(summary.rows_cleared, 2);
    assert_eq!(summary.pieces_locked, 4);
    assert!(summary.game_over);
}

#[test]
fn limits_stop_the_run() {
    let mut runner = Runner::new(o_session(), Vec::new(), 60.);
    let summary = runner.run(&Limits {
        max_ticks: Some(10),
        max_pieces: None,
    });
    assert_eq!(summary.ticks, 10);
    assert!(!summary.game_over);
    // still hanging at the spawn position
    assert_eq!(
        runner.session().active_piece().map(|p| p.pos().y),
        Some(5)
    );

    let mut runner = Runner::new(o_session(), Vec::new(), 60.);
    let summary = runner.run(&Limits {
        max_ticks: None,
        max_pieces: Some(1),
    });
    assert_eq!(summary.pieces_locked, 1);
    assert!(!summary.game_over);
}

#[test]
fn drop_cuts_the_spawn_wait() {
    let mut runner = Runner::new(o_session(), vec![ScriptCommand::Drop], 60.);
    // at 30 rows/s the piece needs a handful of frames to reach the floor, well under the
    // one second a regular spawn hangs
    let summary = runner.run(&Limits {
        max_ticks: None,
        max_pieces: Some(1),
    });
    assert!(summary.ticks < 30);
}
