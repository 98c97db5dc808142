// ABOUTME: Composable capability traits for device backends.
// ABOUTME: Defines StorageOps, ConfigOps, VolumeOps, and TherapyOps.

mod device_config;
mod shared_types;
mod storage;
mod therapy;
mod volume;

pub use device_config::{ConfigOps, ConfigWriteError};
pub use shared_types::*;
pub use storage::{StorageError, StorageOps};
pub use therapy::{TherapyError, TherapyOps};
pub use volume::{VolumeError, VolumeOps};
