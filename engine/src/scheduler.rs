//! Periodic tick driver.
//!
//! One task owns the [`CaptureEngine`]. It waits on either the next tick
//! deadline or an inbound command, so a tick always runs to completion before
//! any command is applied, and commands land strictly between ticks. The next
//! deadline is one interval after the previous tick finished.

use std::sync::Arc;

use region_watch_common::frame::Frame;
use region_watch_common::region::Region;
use region_watch_common::settings::Settings;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::engine::{CaptureEngine, EngineStatus, HistoryObserver, TickStep};

/// Read-only copy of the history, newest first.
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    pub frames: Vec<Arc<Frame>>,
}

impl HistoryObserver for watch::Sender<HistorySnapshot> {
    fn on_history_changed(&self, frames: &[Arc<Frame>]) {
        self.send_replace(HistorySnapshot {
            frames: frames.to_vec(),
        });
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine task has stopped")]
    Stopped,
}

enum Command {
    SetRegion(Region),
    Start,
    Stop,
    Reset,
    CommitSettings(Settings),
    Status,
}

struct Request {
    command: Command,
    reply: oneshot::Sender<EngineStatus>,
}

/// Cloneable control handle for an engine running on its own task.
///
/// The task exits once every handle has been dropped.
#[derive(Clone)]
pub struct EngineHandle {
    requests: mpsc::Sender<Request>,
    history: watch::Receiver<HistorySnapshot>,
}

impl EngineHandle {
    /// Move `engine` onto a new task and start serving commands.
    ///
    /// An engine that is already running gets its first tick one interval
    /// from now.
    pub fn spawn(mut engine: CaptureEngine) -> (Self, JoinHandle<()>) {
        let (history_tx, history_rx) = watch::channel(HistorySnapshot {
            frames: engine.history().snapshot(),
        });
        engine.add_observer(Box::new(history_tx));

        let (requests_tx, requests_rx) = mpsc::channel(32);
        let task = tokio::spawn(run_engine_loop(engine, requests_rx));
        (
            Self {
                requests: requests_tx,
                history: history_rx,
            },
            task,
        )
    }

    async fn request(&self, command: Command) -> Result<EngineStatus, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request { command, reply })
            .await
            .map_err(|_| EngineError::Stopped)?;
        rx.await.map_err(|_| EngineError::Stopped)
    }

    pub async fn set_region(&self, region: Region) -> Result<EngineStatus, EngineError> {
        self.request(Command::SetRegion(region)).await
    }

    pub async fn start_capture(&self) -> Result<EngineStatus, EngineError> {
        self.request(Command::Start).await
    }

    pub async fn stop_capture(&self) -> Result<EngineStatus, EngineError> {
        self.request(Command::Stop).await
    }

    pub async fn reset_all(&self) -> Result<EngineStatus, EngineError> {
        self.request(Command::Reset).await
    }

    pub async fn commit_settings(&self, settings: Settings) -> Result<EngineStatus, EngineError> {
        self.request(Command::CommitSettings(settings)).await
    }

    pub async fn status(&self) -> Result<EngineStatus, EngineError> {
        self.request(Command::Status).await
    }

    /// Current history contents.
    pub fn history(&self) -> HistorySnapshot {
        self.history.borrow().clone()
    }

    /// A receiver that wakes on every history change.
    pub fn subscribe(&self) -> watch::Receiver<HistorySnapshot> {
        self.history.clone()
    }
}

async fn run_engine_loop(mut engine: CaptureEngine, mut requests: mpsc::Receiver<Request>) {
    info!("engine task started");
    let mut next_tick = engine
        .is_running()
        .then(|| Instant::now() + engine.settings().interval());

    loop {
        tokio::select! {
            request = requests.recv() => {
                let Some(Request { command, reply }) = request else {
                    info!("all engine handles dropped, stopping engine task");
                    break;
                };
                next_tick = apply_command(&mut engine, command, next_tick);
                // The caller may have given up waiting; the command still applied.
                let _ = reply.send(engine.status());
            }
            _ = wait_until(next_tick) => {
                run_tick(&mut engine).await;
                next_tick = engine
                    .is_running()
                    .then(|| Instant::now() + engine.settings().interval());
            }
        }
    }
}

/// Apply one command and return the new tick deadline.
fn apply_command(
    engine: &mut CaptureEngine,
    command: Command,
    next_tick: Option<Instant>,
) -> Option<Instant> {
    let reschedule = match command {
        Command::SetRegion(region) => {
            engine.set_region(region);
            false
        }
        Command::Start => engine.start_capture(),
        Command::Stop => {
            engine.stop_capture();
            false
        }
        Command::Reset => {
            engine.reset_all();
            false
        }
        Command::CommitSettings(settings) => {
            engine.commit_settings(settings);
            true
        }
        Command::Status => false,
    };

    if !engine.is_running() {
        None
    } else if reschedule || next_tick.is_none() {
        let interval = engine.settings().interval();
        debug!(interval_ms = interval.as_millis() as u64, "tick rescheduled");
        Some(Instant::now() + interval)
    } else {
        next_tick
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn run_tick(engine: &mut CaptureEngine) {
    let pending = match engine.begin_tick() {
        TickStep::Idle => return,
        TickStep::NoRegion => {
            debug!("no region selected, skipping tick");
            return;
        }
        TickStep::Capture(pending) => pending,
    };

    let capture = match tokio::task::spawn_blocking(move || pending.run()).await {
        Ok(capture) => capture,
        Err(e) => {
            error!(error = %e, "capture task panicked, skipping tick");
            return;
        }
    };

    match engine.finish_tick(capture) {
        Ok(outcome) => debug!(?outcome, "tick complete"),
        Err(e) => warn!(error = %e, "capture failed, will retry next tick"),
    }
}
