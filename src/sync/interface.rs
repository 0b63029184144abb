//! The two external collaborators that carry everything the core is
//! explicitly scoped away from: wire/RPC framing (`Interface`) and
//! cryptographic primitives (`Codec`). Both are consumed through small
//! trait surfaces injected at construction time; nothing in this crate
//! implements a real Electrum-style session or a real script-hash
//! derivation — see `sync::demo` for throwaway in-memory stand-ins used by
//! the binary and the tests.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::sync::error::{CoreError, RpcError};
use crate::sync::types::{Address, AddressStatus, HistoryItem, Scripthash, Txid};

/// The index server's RPC surface, reduced to exactly what the core needs
/// (§6). Implementations must support being called concurrently from many
/// tasks on the same `LocalSet`.
#[async_trait(?Send)]
pub trait Interface {
    /// Subscribe to status updates for `scripthash`. The initial status is
    /// delivered through `notifications` just like every subsequent push —
    /// this mirrors how the original RPC session multiplexes the first
    /// reply and later notifications onto the same queue (see
    /// `SPEC_FULL.md` §6 and the open question in `DESIGN.md`).
    async fn subscribe(
        &self,
        scripthash: Scripthash,
        notifications: UnboundedSender<(Scripthash, AddressStatus)>,
    ) -> Result<(), RpcError>;

    /// Full history for a scripthash, as currently known to the server.
    async fn get_history_for_scripthash(
        &self,
        scripthash: Scripthash,
    ) -> Result<Vec<HistoryItem>, RpcError>;

    /// Raw transaction bytes for a txid. Not-found is an `RpcError`.
    async fn get_transaction(&self, txid: Txid) -> Result<Vec<u8>, RpcError>;

    /// Called once when the engine stops, win or lose. Mirrors the
    /// original's `session.unsubscribe(status_queue)` step of tearing down
    /// the notification channel; implementations without a real session
    /// multiplexer can leave this as a no-op.
    async fn unsubscribe_all(&self) {}
}

/// The pure-function collaborators the original scopes out as "crypto
/// primitives": address validation, scripthash derivation, and
/// transaction parsing/txid computation. `Tx` is deliberately opaque to
/// the core — it is only ever handed back to the `WalletStore` or compared
/// for equality of txid.
pub trait Codec {
    type Tx;

    fn validate_address(&self, addr: &str) -> bool;
    fn address_to_scripthash(&self, addr: &Address) -> Scripthash;
    fn parse_transaction(&self, raw: &[u8]) -> Result<Self::Tx, CoreError>;
    fn txid_of(&self, tx: &Self::Tx) -> Txid;
}
