//! # Playback Module
//!
//! The one reusable engine behind every simulation panel: reveal a fixed,
//! ordered script one step at a time on a cadence, with start, pause,
//! resume, reset and manual stepping.
//!
//! ## Pieces
//!
//! | Piece | Role |
//! |-------|------|
//! | [`Playback`] | Pure state machine over a script (no timers, no I/O) |
//! | [`Cadence`] | Fixed or jittered delay between steps |
//! | [`CadenceDriver`] | Tokio tasks that emit [`CadenceTick`]s on a channel |
//! | [`CadenceHandle`] | Cancels its task on drop |
//!
//! Two-phase panels (draft then verify, prefill then decode) use
//! [`StepMode::TwoPhase`]: every step is shown as pending first and
//! committed after a short settle delay.

pub mod cadence;
pub mod driver;
pub mod engine;

pub use cadence::Cadence;
pub use driver::{CadenceDriver, CadenceHandle, CadenceRequest, CadenceTick, TickKind};
pub use engine::{Advance, Playback, PlaybackState, StepMode};
