// ABOUTME: Backend boundary: capability traits plus the mass-storage realization.
// ABOUTME: The orchestrator only ever sees the traits; implementations are injected.

mod error;
mod msc;
mod traits;

pub use error::{BackendError, BackendErrorKind};
pub use msc::MscBackend;
pub use traits::{
    ConfigOps, ConfigWriteError, StorageError, StorageOps, TherapyError, TherapyOps,
    TherapyPhase, TherapyProgress, TherapyStream, TransferProgress, TransferStream, VolumeError,
    VolumeOps,
};
