//! `HistoryReconciler` — the synchronizer's `OnStatus` implementation
//! (§4.3). Compares the server's reported status against local history,
//! fetches and validates the server's history on a mismatch, commits it to
//! the `WalletStore`, and fans out missing-transaction fetches.

use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::sync::counters::Counters;
use crate::sync::engine::OnStatus;
use crate::sync::error::CoreError;
use crate::sync::events::EventSink;
use crate::sync::interface::{Codec, Interface};
use crate::sync::status::hash_history;
use crate::sync::store::WalletStore;
use crate::sync::synchronizer::shared::SharedState;
use crate::sync::synchronizer::txfetch;
use crate::sync::types::{Address, AddressStatus, HistoryEntry, Txid, TxFee};

pub(crate) struct HistoryReconciler<C, I, S> {
    codec: Rc<C>,
    interface: Rc<I>,
    store: Arc<S>,
    counters: Rc<Counters>,
    event_sink: Rc<dyn EventSink<C::Tx>>,
    shared: Rc<SharedState>,
    tx_fetch_permits: Rc<Semaphore>,
}

impl<C, I, S> HistoryReconciler<C, I, S>
where
    C: Codec + 'static,
    C::Tx: Clone,
    I: Interface + 'static,
    S: WalletStore<C::Tx> + 'static,
{
    pub fn new(
        codec: Rc<C>,
        interface: Rc<I>,
        store: Arc<S>,
        counters: Rc<Counters>,
        event_sink: Rc<dyn EventSink<C::Tx>>,
        shared: Rc<SharedState>,
        tx_fetch_permits: Rc<Semaphore>,
    ) -> Self {
        Self {
            codec,
            interface,
            store,
            counters,
            event_sink,
            shared,
            tx_fetch_permits,
        }
    }

    /// Heals a wallet whose history rows outlived their transaction rows:
    /// called once by `ProgressLoop` on startup for every address that
    /// already has stored history (§4.5).
    pub(crate) async fn heal_missing_txs(&self, addr: &Address, hist: Vec<HistoryEntry>) -> Result<(), CoreError> {
        let missing: Vec<(Txid, i32)> = hist.into_iter().map(|e| (e.txid, e.height)).collect();
        txfetch::fetch_missing(
            self.codec.clone(),
            self.interface.clone(),
            self.store.clone(),
            self.counters.clone(),
            self.event_sink.clone(),
            self.shared.clone(),
            self.tx_fetch_permits.clone(),
            missing,
            Some(addr.clone()),
            true,
        )
        .await
    }
}

#[async_trait(?Send)]
impl<C, I, S> OnStatus for HistoryReconciler<C, I, S>
where
    C: Codec + 'static,
    C::Tx: Clone,
    I: Interface + 'static,
    S: WalletStore<C::Tx> + 'static,
{
    async fn on_status(&self, addr: Address, server_status: AddressStatus) -> Result<(), CoreError> {
        let local = self.store.get_addr_history(&addr).await;
        let local_status = hash_history(&local);
        if local_status == server_status {
            log::trace!("[sync] {addr}: local status already matches server, no-op");
            return Ok(());
        }

        let key = (addr.clone(), server_status.clone());
        if self.shared.requested_histories.borrow().contains(&key) {
            log::trace!("[sync] {addr}: history fetch for this status already in flight, dedup");
            return Ok(());
        }
        self.shared.requested_histories.borrow_mut().insert(key.clone());

        let result = self.reconcile_once(&addr, &server_status).await;
        self.shared.requested_histories.borrow_mut().remove(&key);
        result
    }
}

impl<C, I, S> HistoryReconciler<C, I, S>
where
    C: Codec + 'static,
    C::Tx: Clone,
    I: Interface + 'static,
    S: WalletStore<C::Tx> + 'static,
{
    async fn reconcile_once(&self, addr: &Address, server_status: &AddressStatus) -> Result<(), CoreError> {
        let scripthash = self.codec.address_to_scripthash(addr);
        self.counters.inc_sent();
        let history_result = self.interface.get_history_for_scripthash(scripthash).await;
        self.counters.inc_answered();
        let items = match history_result {
            Ok(items) => items,
            Err(rpc_err) => {
                log::warn!("[sync] {addr}: get_history_for_scripthash failed: {}", rpc_err.message);
                return Ok(());
            }
        };

        let mut seen = std::collections::HashSet::new();
        for item in &items {
            if !seen.insert(item.tx_hash) {
                log::warn!("[sync] {addr}: server returned duplicate tx_hash {}, dropping history", item.tx_hash);
                return Ok(());
            }
        }

        let hist: Vec<HistoryEntry> = items
            .iter()
            .map(|item| HistoryEntry { txid: item.tx_hash, height: item.height })
            .collect();
        let computed_status = hash_history(&hist);
        if computed_status != *server_status {
            log::warn!(
                "[sync] {addr}: history digest {computed_status:?} does not match reported status {server_status:?}, dropping"
            );
            return Ok(());
        }

        let tx_fees: Vec<(Txid, TxFee)> = items.iter().map(|item| (item.tx_hash, item.fee)).collect();
        self.store.receive_history_callback(addr, hist.clone(), tx_fees).await;
        log::info!("[sync] {addr}: committed history with {} entries", hist.len());

        let missing: Vec<(Txid, i32)> = hist.into_iter().map(|e| (e.txid, e.height)).collect();
        txfetch::fetch_missing(
            self.codec.clone(),
            self.interface.clone(),
            self.store.clone(),
            self.counters.clone(),
            self.event_sink.clone(),
            self.shared.clone(),
            self.tx_fetch_permits.clone(),
            missing,
            Some(addr.clone()),
            false,
        )
        .await
    }
}
