pub mod capture;
pub mod engine;
pub mod filter;
pub mod history;
pub mod scheduler;

pub use engine::{CaptureEngine, EngineState, EngineStatus, HistoryObserver, TickOutcome};
pub use scheduler::{EngineError, EngineHandle, HistorySnapshot};
