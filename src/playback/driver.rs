//! # Cadence Driver
//!
//! Turns a [`Cadence`] into a stream of [`CadenceTick`] messages. Each active
//! panel gets one tokio task that only sleeps and sends; the shell drains
//! the channel from its event loop and applies the ticks to the playback it
//! owns, so panel state keeps a single writer.
//!
//! A [`CadenceHandle`] aborts its task when stopped or dropped. Ticks carry
//! the run id of their task plus the panel and playback generation they were
//! scheduled for, which lets the receiver discard anything still queued from
//! a task that has since been stopped.

use super::cadence::{self, Cadence};
use super::engine::StepMode;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// What the receiver should do with a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Advance,
    Commit,
}

/// One message from a running cadence task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadenceTick {
    /// Which spawned task sent this tick
    pub run: u64,
    pub panel: String,
    pub generation: u64,
    pub kind: TickKind,
}

/// Parameters for one cadence task.
#[derive(Debug, Clone)]
pub struct CadenceRequest {
    pub panel: String,
    pub generation: u64,
    pub cadence: Cadence,
    pub mode: StepMode,
    /// Send a `Commit` (after the settle delay) before the first `Advance`.
    /// Used when resuming a two-phase playback that was paused mid-step.
    pub commit_first: bool,
}

/// Owns a running cadence task. Dropping it cancels the task.
#[derive(Debug)]
pub struct CadenceHandle {
    run: u64,
    panel: String,
    generation: u64,
    task: JoinHandle<()>,
}

impl CadenceHandle {
    /// Unique id of the task, echoed in every tick it sends.
    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn panel(&self) -> &str {
        &self.panel
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancel the task now.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for CadenceHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!(run = self.run, panel = %self.panel, "cadence stopped");
    }
}

/// Spawns cadence tasks and receives their ticks.
#[derive(Debug)]
pub struct CadenceDriver {
    sender: UnboundedSender<CadenceTick>,
    receiver: UnboundedReceiver<CadenceTick>,
    speed: f64,
    next_run: u64,
}

impl Default for CadenceDriver {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl CadenceDriver {
    pub fn new(speed: f64) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            speed: cadence::clamp_speed(speed),
            next_run: 0,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Change the speed for tasks spawned from now on.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = cadence::clamp_speed(speed);
    }

    /// Start a cadence task. Must be called from within a tokio runtime.
    pub fn spawn(&mut self, request: CadenceRequest) -> CadenceHandle {
        self.next_run += 1;
        let run = self.next_run;
        let sender = self.sender.clone();
        let speed = self.speed;
        let panel = request.panel.clone();
        let generation = request.generation;

        debug!(
            run,
            panel = %panel,
            generation,
            speed,
            commit_first = request.commit_first,
            "cadence spawned"
        );

        let task = tokio::spawn(run_cadence(run, request, sender, speed));

        CadenceHandle {
            run,
            panel,
            generation,
            task,
        }
    }

    /// Next queued tick without waiting.
    pub fn try_recv(&mut self) -> Option<CadenceTick> {
        match self.receiver.try_recv() {
            Ok(tick) => Some(tick),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next tick.
    pub async fn recv(&mut self) -> Option<CadenceTick> {
        self.receiver.recv().await
    }

    /// Discard everything already queued.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.try_recv().is_some() {
            dropped += 1;
        }
        dropped
    }
}

async fn run_cadence(
    run: u64,
    request: CadenceRequest,
    sender: UnboundedSender<CadenceTick>,
    speed: f64,
) {
    let mut rng = StdRng::from_entropy();
    let settle = match request.mode {
        StepMode::Single => None,
        StepMode::TwoPhase { settle_ms } => {
            Some(cadence::scaled(Duration::from_millis(settle_ms), speed))
        }
    };
    let send = |kind: TickKind| {
        trace!(run, panel = %request.panel, ?kind, "cadence tick");
        sender
            .send(CadenceTick {
                run,
                panel: request.panel.clone(),
                generation: request.generation,
                kind,
            })
            .is_ok()
    };

    if request.commit_first {
        if let Some(settle) = settle {
            tokio::time::sleep(settle).await;
            if !send(TickKind::Commit) {
                return;
            }
        }
    }

    loop {
        let delay = cadence::scaled(request.cadence.next_delay(&mut rng), speed);
        tokio::time::sleep(delay).await;
        if !send(TickKind::Advance) {
            return;
        }

        if let Some(settle) = settle {
            tokio::time::sleep(settle).await;
            if !send(TickKind::Commit) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn assert_elapsed(started: Instant, expected_ms: u64) {
        let elapsed = started.elapsed();
        assert!(
            elapsed >= Duration::from_millis(expected_ms)
                && elapsed < Duration::from_millis(expected_ms + 5),
            "expected ~{expected_ms}ms, got {elapsed:?}"
        );
    }

    fn request(mode: StepMode) -> CadenceRequest {
        CadenceRequest {
            panel: "kv-cache".to_string(),
            generation: 3,
            cadence: Cadence::Fixed { interval_ms: 500 },
            mode,
            commit_first: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_mode_ticks_on_interval() {
        let mut driver = CadenceDriver::default();
        let handle = driver.spawn(request(StepMode::Single));
        let started = Instant::now();

        let tick = driver.recv().await.expect("tick");
        assert_eq!(tick.kind, TickKind::Advance);
        assert_eq!(tick.run, handle.run());
        assert_eq!(tick.panel, "kv-cache");
        assert_eq!(tick.generation, 3);
        assert_elapsed(started, 500);

        let tick = driver.recv().await.expect("tick");
        assert_eq!(tick.kind, TickKind::Advance);
        assert_elapsed(started, 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_phase_sends_commit_after_settle() {
        let mut driver = CadenceDriver::default();
        let _handle = driver.spawn(request(StepMode::TwoPhase { settle_ms: 100 }));
        let started = Instant::now();

        assert_eq!(driver.recv().await.expect("tick").kind, TickKind::Advance);
        assert_eq!(driver.recv().await.expect("tick").kind, TickKind::Commit);
        assert_elapsed(started, 600);
        assert_eq!(driver.recv().await.expect("tick").kind, TickKind::Advance);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_first_on_resume() {
        let mut driver = CadenceDriver::default();
        let mut req = request(StepMode::TwoPhase { settle_ms: 100 });
        req.commit_first = true;
        let _handle = driver.spawn(req);

        assert_eq!(driver.recv().await.expect("tick").kind, TickKind::Commit);
        assert_eq!(driver.recv().await.expect("tick").kind, TickKind::Advance);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_ticks() {
        let mut driver = CadenceDriver::default();
        let handle = driver.spawn(request(StepMode::Single));
        assert!(driver.recv().await.is_some());

        handle.stop();
        let waited = tokio::time::timeout(Duration::from_secs(10), driver.recv()).await;
        assert!(waited.is_err(), "no tick should arrive after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_scales_interval() {
        let mut driver = CadenceDriver::new(2.0);
        let _handle = driver.spawn(request(StepMode::Single));
        let started = Instant::now();

        driver.recv().await.expect("tick");
        assert_elapsed(started, 250);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_spawn_gets_a_new_run_id() {
        let mut driver = CadenceDriver::default();
        let first = driver.spawn(request(StepMode::Single));
        let second = driver.spawn(request(StepMode::Single));
        assert_ne!(first.run(), second.run());
        assert_eq!(second.panel(), "kv-cache");
        assert_eq!(second.generation(), 3);
    }

    #[tokio::test]
    async fn test_drain_on_empty_channel() {
        let mut driver = CadenceDriver::default();
        assert_eq!(driver.drain(), 0);
        assert!(driver.try_recv().is_none());
    }
}
