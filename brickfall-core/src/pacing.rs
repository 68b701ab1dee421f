//! Timing helpers for hosts.
//!
//! The session itself has no notion of time. Hosts feed elapsed seconds into these and issue
//! the resulting commands.

/// Turns elapsed time into gravity steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityClock {
    /// Time since the last step, in seconds.
    elapsed: f64,
    /// Time left before the piece starts falling, in seconds.
    delay: f64,
}

impl GravityClock {
    /// Creates a clock that waits `delay` seconds before the first step.
    pub fn new(delay: f64) -> GravityClock {
        GravityClock {
            elapsed: 0.,
            delay: delay.max(0.),
        }
    }

    /// Creates a clock for a freshly spawned piece, which hangs for two rows' worth of time.
    pub fn for_spawn(fall_speed: f64) -> GravityClock {
        GravityClock::new(2. / fall_speed)
    }

    /// Ends the spawn delay early.
    pub fn skip_delay(&mut self) {
        self.delay = 0.;
    }

    /// Returns true while the spawn delay is running.
    pub fn is_waiting(&self) -> bool {
        self.delay > 0.
    }

    /// Advances the clock by `dt` seconds and returns how many rows the piece should fall at
    /// `speed` rows per second.
    pub fn advance(&mut self, dt: f64, speed: f64) -> usize {
        if !(dt > 0. && speed > 0.) {
            return 0;
        }

        let mut dt = dt;
        if self.delay > 0. {
            if dt < self.delay {
                self.delay -= dt;
                return 0;
            }
            dt -= self.delay;
            self.delay = 0.;
        }

        self.elapsed += dt;
        let interval = 1. / speed;
        let steps = (self.elapsed / interval).floor();
        self.elapsed -= steps * interval;
        steps as usize
    }
}

/// Rate limit for horizontal moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRepeat {
    delay: f64,
    cooldown: f64,
}

impl MoveRepeat {
    pub fn new(delay: f64) -> MoveRepeat {
        MoveRepeat {
            delay: delay.max(0.),
            cooldown: 0.,
        }
    }

    /// Returns true if a move may be attempted now.
    pub fn is_ready(&self) -> bool {
        self.cooldown <= 0.
    }

    /// Starts the cooldown. Call this after a move was applied; blocked moves do not count.
    pub fn trigger(&mut self) {
        self.cooldown = self.delay;
    }

    pub fn advance(&mut self, dt: f64) {
        if dt > 0. {
            self.cooldown = (self.cooldown - dt).max(0.);
        }
    }
}

#[test]
fn gravity_waits_for_spawn_delay() {
    let mut clock = GravityClock::for_spawn(2.);
    assert!(clock.is_waiting());
    assert_eq!(clock.advance(0.5, 2.), 0);
    assert_eq!(clock.advance(0.25, 2.), 0);
    // 0.25 s left of the delay, then 0.5 s of falling
    assert_eq!(clock.advance(0.75, 2.), 1);
    assert!(!clock.is_waiting());
    assert_eq!(clock.advance(0.25, 2.), 0);
    assert_eq!(clock.advance(0.25, 2.), 1);
}

#[test]
fn gravity_catches_up_after_long_frames() {
    let mut clock = GravityClock::new(0.);
    assert_eq!(clock.advance(1.0, 4.), 4);
    assert_eq!(clock.advance(0.5, 8.), 4);
    assert_eq!(clock.advance(0., 8.), 0);
    assert_eq!(clock.advance(1., 0.), 0);
}

#[test]
fn drop_skips_spawn_delay() {
    let mut clock = GravityClock::for_spawn(2.);
    clock.skip_delay();
    assert_eq!(clock.advance(0.25, 16.), 4);
}

#[test]
fn move_repeat_cooldown() {
    let mut repeat = MoveRepeat::new(0.125);
    assert!(repeat.is_ready());
    repeat.trigger();
    assert!(!repeat.is_ready());
    repeat.advance(0.0625);
    assert!(!repeat.is_ready());
    repeat.advance(0.0625);
    assert!(repeat.is_ready());
}
