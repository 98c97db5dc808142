// ABOUTME: Progress notification types shared across backend capability traits.
// ABOUTME: Streams are boxed so implementations can synthesize them any way they like.

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use super::{StorageError, TherapyError};

/// One transfer progress notification: which file, how far along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProgress {
    pub current_file: String,
    pub total_files: u32,
    pub completed_files: u32,
}

/// Stream of transfer progress; the transfer is done when the stream ends
/// without having yielded an error.
pub type TransferStream = Pin<Box<dyn Stream<Item = Result<TransferProgress, StorageError>> + Send>>;

/// Coarse phase reported by the profile-apply operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TherapyPhase {
    Connecting,
    Sending,
    Rebooting,
}

/// One therapy-apply progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TherapyProgress {
    pub phase: TherapyPhase,
    pub percent: u8,
    pub message: String,
}

/// Stream of therapy-apply progress; the apply is done when the stream ends
/// without having yielded an error.
pub type TherapyStream = Pin<Box<dyn Stream<Item = Result<TherapyProgress, TherapyError>> + Send>>;
