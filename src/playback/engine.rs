//! # Scripted Playback Engine
//!
//! A [`Playback`] reveals a fixed script one step at a time. It is a plain
//! state machine: it never schedules anything itself. A cadence source (see
//! [`super::driver`]) calls [`Playback::advance`] and, for two-phase panels,
//! [`Playback::commit`].
//!
//! ## States
//!
//! ```text
//!            start()            advance() at end
//!   Idle ─────────────▶ Running ─────────────────▶ Finished
//!    ▲                   │   ▲                        │
//!    │ reset()   pause() │   │ resume()/start()       │ start()
//!    │                   ▼   │                        │ (restarts at 0)
//!    └──────────────── Paused                         │
//!    ◀────────────────────────────────────────────────┘
//! ```
//!
//! The emitted items are always `script[..cursor]`, so they are borrowed
//! straight from the script rather than copied into a second buffer.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Named lifecycle states of a playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
    Paused,
    Finished,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Running => "running",
            PlaybackState::Paused => "paused",
            PlaybackState::Finished => "finished",
        }
    }
}

/// How a single script step is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepMode {
    /// Each `advance()` commits one step immediately.
    #[default]
    Single,
    /// Each step is first shown as pending (a draft) and committed by a
    /// later `commit()` call, `settle_ms` after the pending emission.
    TwoPhase { settle_ms: u64 },
}

/// Outcome of an `advance()`, `step()` or `commit()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Step `index` was committed and the cursor moved past it.
    Emitted { index: usize },
    /// Step `index` is now pending; the cursor has not moved.
    Pending { index: usize },
    /// A pending step exists, nothing happened.
    Blocked,
    /// The script is exhausted; the playback is now finished and the
    /// cadence source should stop.
    Finished,
    /// The call had no effect (not running, or already finished).
    Idle,
}

/// Playback of a fixed script of `T` steps.
#[derive(Debug, Clone)]
pub struct Playback<T> {
    script: Vec<T>,
    mode: StepMode,
    cursor: usize,
    state: PlaybackState,
    pending: Option<usize>,
    generation: u64,
}

impl<T> Playback<T> {
    pub fn new(script: Vec<T>, mode: StepMode) -> Self {
        Self {
            script,
            mode,
            cursor: 0,
            state: PlaybackState::Idle,
            pending: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    pub fn script(&self) -> &[T] {
        &self.script
    }

    /// Items revealed so far, always exactly `script[..cursor]`.
    pub fn emitted(&self) -> &[T] {
        &self.script[..self.cursor]
    }

    /// The step currently shown as a draft, if any.
    pub fn pending(&self) -> Option<(usize, &T)> {
        self.pending
            .and_then(|index| self.script.get(index).map(|item| (index, item)))
    }

    /// Identifies one continuous run of this playback. Bumped whenever the
    /// cursor goes back to zero, so ticks scheduled before that are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn is_finished(&self) -> bool {
        self.state == PlaybackState::Finished
    }

    /// Fraction of the script committed so far, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.script.is_empty() {
            return if self.is_finished() { 1.0 } else { 0.0 };
        }
        self.cursor as f64 / self.script.len() as f64
    }

    /// Start or resume playback.
    ///
    /// A finished playback restarts from the first step. Starting an empty
    /// script finishes immediately.
    pub fn start(&mut self) {
        match self.state {
            PlaybackState::Running => {}
            PlaybackState::Paused => self.state = PlaybackState::Running,
            PlaybackState::Idle | PlaybackState::Finished => {
                if self.state == PlaybackState::Finished {
                    self.rewind();
                }
                self.state = if self.script.is_empty() {
                    PlaybackState::Finished
                } else {
                    PlaybackState::Running
                };
            }
        }
        debug!(
            state = self.state.label(),
            cursor = self.cursor,
            generation = self.generation,
            "playback started"
        );
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Running {
            self.state = PlaybackState::Paused;
            debug!(cursor = self.cursor, "playback paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Running;
            debug!(cursor = self.cursor, "playback resumed");
        }
    }

    /// Flip between running and paused, starting when idle or finished.
    pub fn toggle(&mut self) {
        if self.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Back to the initial state. Any pending step is discarded.
    pub fn reset(&mut self) {
        self.rewind();
        self.state = PlaybackState::Idle;
        debug!(generation = self.generation, "playback reset");
    }

    /// Cadence entry point. Only has an effect while running.
    pub fn advance(&mut self) -> Advance {
        if self.state != PlaybackState::Running {
            return Advance::Idle;
        }
        self.advance_unchecked()
    }

    /// Manual single step while idle or paused.
    ///
    /// An idle playback becomes paused so the user can keep stepping or
    /// resume the cadence from there.
    pub fn step(&mut self) -> Advance {
        match self.state {
            PlaybackState::Finished => Advance::Idle,
            PlaybackState::Idle | PlaybackState::Paused => {
                if self.state == PlaybackState::Idle {
                    self.state = PlaybackState::Paused;
                }
                if self.pending.is_some() {
                    return self.commit();
                }
                let outcome = self.advance_unchecked();
                // A manual step never leaves a draft behind.
                if let Advance::Pending { .. } = outcome {
                    return self.commit();
                }
                outcome
            }
            PlaybackState::Running => self.advance_unchecked(),
        }
    }

    /// Finalise the pending step of a two-phase playback.
    pub fn commit(&mut self) -> Advance {
        let Some(index) = self.pending.take() else {
            return Advance::Idle;
        };
        debug_assert_eq!(index, self.cursor, "pending step must sit at the cursor");
        self.cursor += 1;
        trace!(index, "step committed");
        Advance::Emitted { index }
    }

    fn advance_unchecked(&mut self) -> Advance {
        if self.pending.is_some() {
            return Advance::Blocked;
        }
        if self.cursor >= self.script.len() {
            self.state = PlaybackState::Finished;
            debug!(len = self.script.len(), "playback finished");
            return Advance::Finished;
        }

        let index = self.cursor;
        match self.mode {
            StepMode::Single => {
                self.cursor += 1;
                trace!(index, "step emitted");
                Advance::Emitted { index }
            }
            StepMode::TwoPhase { .. } => {
                self.pending = Some(index);
                trace!(index, "step pending");
                Advance::Pending { index }
            }
        }
    }

    fn rewind(&mut self) {
        self.cursor = 0;
        self.pending = None;
        self.generation += 1;
    }
}
