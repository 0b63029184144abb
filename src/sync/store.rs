//! `WalletStore` — the persistence/address-generation collaborator. The
//! core never touches disk; every durable fact it learns is handed to this
//! trait, and everything it needs to know about the wallet's current state
//! is read back through it.

use async_trait::async_trait;

use crate::sync::error::CoreError;
use crate::sync::types::{Address, HistoryEntry, StoredTx, Txid, TxFee};

/// Required methods a wallet-storage backend must provide (§6). `Tx` is the
/// same opaque parsed-transaction type produced by the paired `Codec`.
///
/// Unlike `Interface`/`Codec` (which live behind `Rc` on the cooperative
/// loop), implementors are required to be `Send + Sync` so a handle can be
/// moved onto a worker thread for `synchronize()`, per §5's note that the
/// store is the one collaborator that must be thread-safe across that
/// boundary.
#[async_trait]
pub trait WalletStore<Tx>: Send + Sync {
    async fn get_addr_history(&self, addr: &Address) -> Vec<HistoryEntry>;

    /// `None` or `StoredTx::Partial` both mean "treat as missing" for fetch
    /// purposes.
    async fn get_transaction(&self, txid: Txid) -> Option<StoredTx<Tx>>;

    /// Addresses that currently have at least one history row.
    async fn get_history(&self) -> Vec<Address>;

    /// All addresses the wallet currently knows about (including freshly
    /// generated ones not yet subscribed).
    async fn get_addresses(&self) -> Vec<Address>;

    async fn receive_history_callback(
        &self,
        addr: &Address,
        hist: Vec<HistoryEntry>,
        tx_fees: Vec<(Txid, TxFee)>,
    );

    async fn receive_tx_callback(&self, txid: Txid, tx: Tx, height: i32);

    /// May block; the caller dispatches this to a worker thread rather
    /// than awaiting it inline on the cooperative loop.
    fn synchronize(&self) -> Result<(), CoreError>;

    fn is_up_to_date(&self) -> bool;
    fn set_up_to_date(&self, up_to_date: bool);
}
