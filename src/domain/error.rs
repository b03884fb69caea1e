//! Domain error types.
//!
//! Numeric undefined-ness is never an error: it is carried by
//! [`Num::NaN`](crate::domain::num::Num::NaN). Everything here is a contract
//! violation or an ambient failure (config, data source, I/O).

use crate::domain::num::NumBackend;
use crate::domain::trade::{OrderKind, TradeState};

/// Top-level error type for barledger.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("numeric backend mismatch in {op}: {left} vs {right}")]
    TypeMismatch {
        op: &'static str,
        left: NumBackend,
        right: NumBackend,
    },

    #[error("index {index} is outside the retained window (begin {begin}, {bar_count} bars)")]
    IndexUnavailable {
        index: usize,
        begin: usize,
        bar_count: usize,
    },

    #[error("cannot record {attempted} order while the current trade is {state}")]
    OrderSequence {
        attempted: OrderKind,
        state: TradeState,
    },

    #[error("exit at index {exit} precedes entry at index {entry}")]
    ExitBeforeEntry { entry: usize, exit: usize },

    #[error("bar {index} rejected: {reason}")]
    NonChronologicalBar { index: usize, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        EngineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
