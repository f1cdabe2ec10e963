use alloc::string::String;

use listwindow::LayoutError;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum RecoveryError {
    #[error("recovery action failed: {reason}")]
    Failed { reason: String },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("failed to mount item {index}: {reason}")]
    Mount { index: usize, reason: String },

    #[error("recovery action panicked")]
    Panicked,
}

impl RecoveryError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}
