use std::sync::Arc;

use image::RgbImage;
use region_watch_common::frame::Frame;
use region_watch_common::region::Region;
use region_watch_common::settings::Settings;
use serde::Serialize;
use tracing::{debug, info};

use crate::capture::{CaptureError, FrameSource};
use crate::filter::{DifferencePolicy, MeanAbsoluteDifference};
use crate::history::HistoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Running,
}

/// Receives the full, newest-first history whenever it changes.
pub trait HistoryObserver: Send + Sync {
    fn on_history_changed(&self, frames: &[Arc<Frame>]);
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The engine is not running.
    Idle,
    /// Running, but no region has been committed yet.
    NoRegion,
    /// The capture differed enough and is now the newest frame.
    Retained { seq: u64, evicted: usize },
    /// The capture was too similar to the newest stored frame.
    Unchanged { seq: u64 },
}

/// Point-in-time view of the engine for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub state: EngineState,
    pub region: Option<Region>,
    pub settings: Settings,
    pub history_len: usize,
}

/// First half of a tick: what the engine wants done before it can ingest.
pub enum TickStep {
    Idle,
    NoRegion,
    Capture(PendingCapture),
}

/// A capture that has been decided on but not yet performed.
///
/// Holds its own handle to the source so it can run off the engine's task.
pub struct PendingCapture {
    source: Arc<dyn FrameSource>,
    region: Region,
}

impl PendingCapture {
    /// Blocking.
    pub fn run(self) -> CaptureResult {
        let captured_at_ms = chrono::Utc::now().timestamp_millis();
        let pixels = self.source.capture(&self.region);
        CaptureResult {
            region: self.region,
            captured_at_ms,
            pixels,
        }
    }
}

pub struct CaptureResult {
    pub region: Region,
    pub captured_at_ms: i64,
    pub pixels: Result<RgbImage, CaptureError>,
}

/// Capture/diff engine: owns the region, the settings and the history.
///
/// All mutation goes through `&mut self`, so callers that share an engine
/// must serialize access; [`crate::scheduler`] does this with a single task.
pub struct CaptureEngine {
    state: EngineState,
    region: Option<Region>,
    settings: Settings,
    history: HistoryStore,
    source: Arc<dyn FrameSource>,
    policy: Box<dyn DifferencePolicy>,
    observers: Vec<Box<dyn HistoryObserver>>,
    next_seq: u64,
}

impl CaptureEngine {
    pub fn new(source: Arc<dyn FrameSource>, settings: Settings) -> Self {
        Self {
            state: EngineState::Idle,
            region: None,
            settings,
            history: HistoryStore::new(settings.capacity()),
            source,
            policy: Box::new(MeanAbsoluteDifference),
            observers: Vec::new(),
            next_seq: 1,
        }
    }

    pub fn with_policy(mut self, policy: Box<dyn DifferencePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn HistoryObserver>) {
        self.observers.push(observer);
    }

    // -- Accessors ----------------------------------------------------------------

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state,
            region: self.region,
            settings: self.settings,
            history_len: self.history.len(),
        }
    }

    // -- Commands -----------------------------------------------------------------

    /// Commit a new region. Capture stops first if it was running; stored
    /// history is kept.
    pub fn set_region(&mut self, region: Region) {
        if self.is_running() {
            info!("RUNNING→IDLE: region replaced, stopping capture");
            self.state = EngineState::Idle;
        }
        info!(
            left = region.left(),
            top = region.top(),
            right = region.right(),
            bottom = region.bottom(),
            "region committed"
        );
        self.region = Some(region);
    }

    /// Returns `true` if the engine was idle.
    pub fn start_capture(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        info!(
            interval_ms = self.settings.interval_ms(),
            has_region = self.region.is_some(),
            "IDLE→RUNNING: capture started"
        );
        self.state = EngineState::Running;
        true
    }

    /// Returns `true` if the engine was running.
    pub fn stop_capture(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        info!("RUNNING→IDLE: capture stopped");
        self.state = EngineState::Idle;
        true
    }

    /// Stop, forget the region and drop all stored frames. Settings are kept.
    pub fn reset_all(&mut self) {
        let dropped = self.history.clear();
        self.region = None;
        self.state = EngineState::Idle;
        info!(dropped, "engine reset");
        self.notify();
    }

    /// Replace capacity, threshold and interval together. Returns how many
    /// frames were evicted by a capacity shrink.
    pub fn commit_settings(&mut self, settings: Settings) -> usize {
        let evicted = self.history.set_capacity(settings.capacity()).len();
        info!(
            capacity = settings.capacity(),
            threshold = settings.threshold(),
            interval_ms = settings.interval_ms(),
            evicted,
            "settings committed"
        );
        self.settings = settings;
        if evicted > 0 {
            self.notify();
        }
        evicted
    }

    // -- Tick ---------------------------------------------------------------------

    /// Decide what this tick needs. Does not touch the screen.
    pub fn begin_tick(&self) -> TickStep {
        if !self.is_running() {
            return TickStep::Idle;
        }
        match self.region {
            None => TickStep::NoRegion,
            Some(region) => TickStep::Capture(PendingCapture {
                source: Arc::clone(&self.source),
                region,
            }),
        }
    }

    /// Compare a finished capture with the newest stored frame and keep it if
    /// it differs enough.
    pub fn finish_tick(&mut self, capture: CaptureResult) -> Result<TickOutcome, CaptureError> {
        let pixels = capture.pixels?;
        let seq = self.next_seq;
        self.next_seq += 1;
        let candidate = Frame::new(pixels, capture.captured_at_ms, seq);

        let retain = self.policy.should_retain(
            &candidate,
            self.history.front().map(|f| &**f),
            self.settings.threshold(),
        );

        if !retain {
            debug!(seq, policy = self.policy.name(), "frame unchanged, discarding");
            return Ok(TickOutcome::Unchanged { seq });
        }

        let evicted = self.history.push_front(Arc::new(candidate)).len();
        debug!(
            seq,
            width = capture.region.width(),
            height = capture.region.height(),
            history_len = self.history.len(),
            evicted,
            "frame retained"
        );
        self.notify();
        Ok(TickOutcome::Retained { seq, evicted })
    }

    /// Run a whole tick on the current thread, blocking on the capture.
    pub fn tick(&mut self) -> Result<TickOutcome, CaptureError> {
        match self.begin_tick() {
            TickStep::Idle => Ok(TickOutcome::Idle),
            TickStep::NoRegion => Ok(TickOutcome::NoRegion),
            TickStep::Capture(pending) => self.finish_tick(pending.run()),
        }
    }

    fn notify(&self) {
        if self.observers.is_empty() {
            return;
        }
        let frames = self.history.snapshot();
        for observer in &self.observers {
            observer.on_history_changed(&frames);
        }
    }
}
