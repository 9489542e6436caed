use anyhow::{bail, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Slowest and fastest global playback speeds accepted by [`scaled`].
pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 4.0;

/// Longest delay a catalog may ask for, in milliseconds.
pub const MAX_INTERVAL_MS: u64 = 60_000;

/// Timing between two script steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cadence {
    /// A step every `interval_ms`.
    Fixed { interval_ms: u64 },
    /// A step every `base_ms` plus a uniform random `0..=jitter_ms`.
    Jittered { base_ms: u64, jitter_ms: u64 },
}

impl Default for Cadence {
    fn default() -> Self {
        Cadence::Fixed { interval_ms: 800 }
    }
}

impl Cadence {
    /// Next delay at normal speed.
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            Cadence::Fixed { interval_ms } => Duration::from_millis(interval_ms),
            Cadence::Jittered { base_ms, jitter_ms } => {
                let jitter = if jitter_ms == 0 {
                    0
                } else {
                    rng.gen_range(0..=jitter_ms)
                };
                Duration::from_millis(base_ms.saturating_add(jitter))
            }
        }
    }

    /// Reject zero and out-of-range delays.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Cadence::Fixed { interval_ms } => check_interval("interval_ms", interval_ms),
            Cadence::Jittered { base_ms, jitter_ms } => {
                check_interval("base_ms", base_ms)?;
                if jitter_ms > MAX_INTERVAL_MS {
                    bail!("jitter_ms must be at most {MAX_INTERVAL_MS}, got {jitter_ms}");
                }
                Ok(())
            }
        }
    }

    /// Shortest delay this cadence can produce.
    pub fn min_delay(&self) -> Duration {
        match *self {
            Cadence::Fixed { interval_ms } => Duration::from_millis(interval_ms),
            Cadence::Jittered { base_ms, .. } => Duration::from_millis(base_ms),
        }
    }
}

/// A delay must be at least 1 ms and at most [`MAX_INTERVAL_MS`].
pub(crate) fn check_interval(name: &str, value_ms: u64) -> Result<()> {
    if value_ms == 0 || value_ms > MAX_INTERVAL_MS {
        bail!("{name} must be between 1 and {MAX_INTERVAL_MS} ms, got {value_ms}");
    }
    Ok(())
}

/// Scale a delay by a playback speed factor (2.0 = twice as fast).
///
/// The factor is clamped to `MIN_SPEED..=MAX_SPEED`.
pub fn scaled(delay: Duration, speed: f64) -> Duration {
    let speed = clamp_speed(speed);
    let micros = (delay.as_micros() as f64 / speed).round();
    Duration::from_micros(micros as u64)
}

pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        return 1.0;
    }
    speed.clamp(MIN_SPEED, MAX_SPEED)
}
