//! Errors raised while driving an exchange through the translator.

use thiserror::Error;

use crate::testing::ContractViolation;

/// Failure of a single exchange. Never retried.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The outbound sink went away (client disconnected, channel dropped).
    #[error("event sink closed")]
    SinkClosed,

    /// A body or trailer event arrived before the response start.
    #[error("response body sent before response start")]
    BodyBeforeStart,

    /// The application sent a second response start.
    #[error("response start sent twice")]
    DuplicateStart,

    /// An encoded response broke the Fn contract (inverse transform only).
    #[error("Fn contract violated: {0}")]
    Contract(#[from] ContractViolation),
}

/// Result type for translator operations.
pub type TranslateResult<T> = Result<T, TranslateError>;
