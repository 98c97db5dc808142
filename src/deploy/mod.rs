// ABOUTME: Deployment orchestration: sequencer, throttle, aggregator, coordinator.
// ABOUTME: Exports the typestate install machine and the batch entry points.

mod batch;
mod error;
mod event;
mod lock;
mod progress;
mod sequencer;
mod state;
mod throttle;

pub use batch::{Coordinator, SkipFlag};
pub use error::InstallError;
pub use event::{
    DeviceUpdateResult, EventSink, MSG_ALL_UPDATED, MSG_SOME_FAILED, Stage, StageEvent,
    UpdateResult,
};
pub use lock::{DeviceLock, LockInfo};
pub use progress::OverallProgress;
pub use sequencer::{Install, InstallOutcome, run_install, run_therapy};
pub use state::{Configured, Copied, Idle, RenamedVolume, Wiped};
pub use throttle::ProgressThrottle;
