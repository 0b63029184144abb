//! The core's error type. A single enum so call sites match on one
//! `Result` error rather than juggling several exception types, mirroring
//! the error-enum convention used across the retrieved corpus.

use thiserror::Error;

use crate::sync::types::{Address, Txid};

/// An error reported by the `Interface` for a single RPC call. Not itself
/// fatal — most sites decide what to do with it (retry, ignore, escalate)
/// based on context.
#[derive(Clone, Debug, Error)]
#[error("rpc error: {message}")]
pub struct RpcError {
    pub message: String,
}

impl RpcError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// The one RPC error message the engine treats specially (§4.2).
    pub fn is_history_too_large(&self) -> bool {
        self.message == "history too large"
    }
}

/// Errors that can escape the core. Only [`CoreError::GracefulDisconnect`]
/// and [`CoreError::SynchronizerFailure`] ever propagate out of a running
/// `run()`; everything else is handled locally (logged and swallowed) by
/// the component that observes it.
#[derive(Clone, Debug, Error)]
pub enum CoreError {
    /// `add()` was called with a string that is not a valid address.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    /// The server reported that this address's history is too large to
    /// serve. Fatal for the whole engine; the owner should construct a
    /// fresh one and retry against (presumably) a different server.
    #[error("graceful disconnect: {0}")]
    GracefulDisconnect(String),

    /// A fetched transaction's computed txid did not match the txid it was
    /// requested under. Indicates a misbehaving server; the owner should
    /// restart the engine.
    #[error("synchronizer failure: server returned tx not matching requested txid {expected} (addr context: {context:?})")]
    SynchronizerFailure { expected: Txid, context: Option<Address> },

    /// Wraps a non-fatal RPC error for call sites that need to propagate
    /// it one level up before deciding whether it was allowed.
    #[error(transparent)]
    Rpc(#[from] RpcError),
}
