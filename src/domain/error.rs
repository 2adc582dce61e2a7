//! Error taxonomy shared by the whole crate.

use crate::domain::resolution::Resolution;

/// Top-level error type for tapedeck.
///
/// Nothing in the engine recovers from these locally; they propagate out of
/// `start_*` to the caller. The only bounded wait in the system (live order
/// polling) resolves to an [`Execution`](crate::domain::order::Execution)
/// value rather than an error.
#[derive(Debug, thiserror::Error)]
pub enum TapedeckError {
    #[error("insufficient history for {symbol}: requested {requested} bars, {available} available")]
    InsufficientHistory {
        symbol: String,
        requested: usize,
        available: usize,
    },

    #[error("incompatible resolutions: {left} vs {right}")]
    IncompatibleResolution { left: Resolution, right: Resolution },

    #[error("usage error: {reason}")]
    Usage { reason: String },

    #[error("upstream error: {reason}")]
    Upstream { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TapedeckError> for std::process::ExitCode {
    fn from(err: &TapedeckError) -> Self {
        let code: u8 = match err {
            TapedeckError::Io(_) => 1,
            TapedeckError::Usage { .. } => 2,
            TapedeckError::Data { .. } => 3,
            TapedeckError::InsufficientHistory { .. } => 4,
            TapedeckError::IncompatibleResolution { .. } => 5,
            TapedeckError::Upstream { .. } => 6,
            TapedeckError::ConfigParse { .. } | TapedeckError::ConfigInvalid { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}
