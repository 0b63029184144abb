//! Hand-rolled test doubles shared by the scenario tests (`SPEC_FULL.md`
//! §13): plain structs recording calls into `Rc<RefCell<_>>`, matching the
//! teacher's fake-over-mocking-framework convention. No mocking crate is a
//! dependency of this crate.

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use addr_sync_core::sync::error::{CoreError, RpcError};
use addr_sync_core::sync::events::{Event, EventSink};
use addr_sync_core::sync::interface::{Codec, Interface};
use addr_sync_core::sync::notifier::{HttpPoster, PostError};
use addr_sync_core::sync::store::WalletStore;
use addr_sync_core::sync::types::{
    Address, AddressStatus, HistoryEntry, HistoryItem, Scripthash, StoredTx, Txid, TxFee,
};

/// Opaque parsed-tx type for the tests: raw bytes plus the txid the mock
/// codec computed for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockTx {
    pub txid: Txid,
    pub raw: Vec<u8>,
}

/// Deterministic, non-cryptographic address/txid derivation: every address
/// is valid unless it starts with `"!"`, and scripthash/txid are just the
/// first 32 bytes of the input, zero-padded. Good enough to keep test
/// fixtures legible (`addr_to_scripthash("A1")` is easy to eyeball) without
/// pulling in real hashing.
pub struct MockCodec;

fn pad32(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let n = bytes.len().min(32);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

impl Codec for MockCodec {
    type Tx = MockTx;

    fn validate_address(&self, addr: &str) -> bool {
        !addr.is_empty() && !addr.starts_with('!')
    }

    fn address_to_scripthash(&self, addr: &Address) -> Scripthash {
        Scripthash(pad32(addr.as_bytes()))
    }

    fn parse_transaction(&self, raw: &[u8]) -> Result<Self::Tx, CoreError> {
        Ok(MockTx { txid: Txid(pad32(raw)), raw: raw.to_vec() })
    }

    fn txid_of(&self, tx: &Self::Tx) -> Txid {
        tx.txid
    }
}

pub fn txid_for(raw: &[u8]) -> Txid {
    Txid(pad32(raw))
}

struct ScriptedAddress {
    initial_status: AddressStatus,
    history: Vec<HistoryItem>,
}

/// A scripted `Interface` that records every call it receives, so scenario
/// tests can assert exact call counts (S1, S2, S5) in addition to observed
/// side effects.
#[derive(Default)]
pub struct MockInterface {
    scripted: RefCell<HashMap<Scripthash, ScriptedAddress>>,
    raw_txs: RefCell<HashMap<Txid, Result<Vec<u8>, String>>>,
    history_too_large: RefCell<std::collections::HashSet<Scripthash>>,
    /// Extra notifications pushed on the same sender right after the
    /// initial subscribe reply, simulating a server that re-announces the
    /// same status before the client has reconciled it (S2).
    duplicate_pushes: RefCell<HashMap<Scripthash, AddressStatus>>,
    pub history_fetch_calls: RefCell<Vec<Scripthash>>,
    pub tx_fetch_calls: RefCell<Vec<Txid>>,
}

impl MockInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, scripthash: Scripthash, initial_status: AddressStatus, history: Vec<HistoryItem>) {
        self.scripted.borrow_mut().insert(scripthash, ScriptedAddress { initial_status, history });
    }

    pub fn script_tx(&self, txid: Txid, raw: Vec<u8>) {
        self.raw_txs.borrow_mut().insert(txid, Ok(raw));
    }

    pub fn script_tx_error(&self, txid: Txid, message: &str) {
        self.raw_txs.borrow_mut().insert(txid, Err(message.to_string()));
    }

    pub fn script_history_too_large(&self, scripthash: Scripthash) {
        self.history_too_large.borrow_mut().insert(scripthash);
    }

    /// Arranges for `subscribe()` to push `status` a second time,
    /// immediately after the initial reply, for `scripthash`.
    pub fn script_duplicate_push(&self, scripthash: Scripthash, status: AddressStatus) {
        self.duplicate_pushes.borrow_mut().insert(scripthash, status);
    }

    pub fn history_fetch_count_for(&self, scripthash: Scripthash) -> usize {
        self.history_fetch_calls.borrow().iter().filter(|s| **s == scripthash).count()
    }
}

#[async_trait(?Send)]
impl Interface for MockInterface {
    async fn subscribe(
        &self,
        scripthash: Scripthash,
        notifications: tokio::sync::mpsc::UnboundedSender<(Scripthash, AddressStatus)>,
    ) -> Result<(), RpcError> {
        if self.history_too_large.borrow().contains(&scripthash) {
            return Err(RpcError::new("history too large"));
        }
        let status = self
            .scripted
            .borrow()
            .get(&scripthash)
            .map(|s| s.initial_status.clone())
            .unwrap_or(None);
        let _ = notifications.send((scripthash, status.clone()));
        if let Some(dup_status) = self.duplicate_pushes.borrow().get(&scripthash).cloned() {
            let _ = notifications.send((scripthash, dup_status));
        }
        Ok(())
    }

    async fn get_history_for_scripthash(
        &self,
        scripthash: Scripthash,
    ) -> Result<Vec<HistoryItem>, RpcError> {
        self.history_fetch_calls.borrow_mut().push(scripthash);
        // Yield once so a duplicate notification dispatched immediately
        // after this one gets a chance to observe the fetch as in-flight
        // (S2) instead of racing to completion within the same poll.
        tokio::task::yield_now().await;
        Ok(self
            .scripted
            .borrow()
            .get(&scripthash)
            .map(|s| s.history.clone())
            .unwrap_or_default())
    }

    async fn get_transaction(&self, txid: Txid) -> Result<Vec<u8>, RpcError> {
        self.tx_fetch_calls.borrow_mut().push(txid);
        match self.raw_txs.borrow().get(&txid) {
            Some(Ok(raw)) => Ok(raw.clone()),
            Some(Err(message)) => Err(RpcError::new(message.clone())),
            None => Err(RpcError::new(format!("no such transaction: {txid}"))),
        }
    }

    async fn unsubscribe_all(&self) {
        self.scripted.borrow_mut().clear();
    }
}

/// A thread-safe in-memory `WalletStore`. Records every history commit and
/// tx commit it receives so tests can assert exactly-once delivery (S1).
#[derive(Default)]
pub struct MockWalletStore {
    addresses: std::sync::Mutex<Vec<Address>>,
    history: std::sync::Mutex<HashMap<Address, Vec<HistoryEntry>>>,
    txs: std::sync::Mutex<HashMap<Txid, StoredTx<MockTx>>>,
    up_to_date: std::sync::Mutex<bool>,
    pub history_commits: std::sync::Mutex<Vec<Address>>,
    pub tx_commits: std::sync::Mutex<Vec<(Txid, i32)>>,
}

impl MockWalletStore {
    pub fn new(addresses: Vec<Address>) -> Self {
        Self {
            addresses: std::sync::Mutex::new(addresses),
            ..Default::default()
        }
    }

    pub fn seed_history(&self, addr: Address, hist: Vec<HistoryEntry>) {
        self.history.lock().unwrap().insert(addr.clone(), hist);
        let mut addrs = self.addresses.lock().unwrap();
        if !addrs.contains(&addr) {
            addrs.push(addr);
        }
    }

    pub fn tx_commit_count_for(&self, txid: Txid) -> usize {
        self.tx_commits.lock().unwrap().iter().filter(|(t, _)| *t == txid).count()
    }
}

#[async_trait]
impl WalletStore<MockTx> for MockWalletStore {
    async fn get_addr_history(&self, addr: &Address) -> Vec<HistoryEntry> {
        self.history.lock().unwrap().get(addr).cloned().unwrap_or_default()
    }

    async fn get_transaction(&self, txid: Txid) -> Option<StoredTx<MockTx>> {
        self.txs.lock().unwrap().get(&txid).cloned()
    }

    async fn get_history(&self) -> Vec<Address> {
        self.history.lock().unwrap().keys().cloned().collect()
    }

    async fn get_addresses(&self) -> Vec<Address> {
        self.addresses.lock().unwrap().clone()
    }

    async fn receive_history_callback(
        &self,
        addr: &Address,
        hist: Vec<HistoryEntry>,
        _tx_fees: Vec<(Txid, TxFee)>,
    ) {
        self.history.lock().unwrap().insert(addr.clone(), hist);
        self.history_commits.lock().unwrap().push(addr.clone());
    }

    async fn receive_tx_callback(&self, txid: Txid, tx: MockTx, height: i32) {
        self.txs.lock().unwrap().insert(txid, StoredTx::Complete(tx));
        self.tx_commits.lock().unwrap().push((txid, height));
    }

    fn synchronize(&self) -> Result<(), CoreError> {
        Ok(())
    }

    fn is_up_to_date(&self) -> bool {
        *self.up_to_date.lock().unwrap()
    }

    fn set_up_to_date(&self, up_to_date: bool) {
        *self.up_to_date.lock().unwrap() = up_to_date;
    }
}

/// Records every event published, for assertions like "`wallet_updated`
/// fired at least once" (S1).
#[derive(Default)]
pub struct RecordingEventSink {
    pub events: RefCell<Vec<&'static str>>,
    pub new_transactions: RefCell<Vec<(Txid, i32)>>,
}

impl EventSink<MockTx> for RecordingEventSink {
    fn publish(&self, event: Event<MockTx>) {
        match event {
            Event::NewTransaction { tx, height } => {
                self.events.borrow_mut().push("new_transaction");
                self.new_transactions.borrow_mut().push((tx.txid, height));
            }
            Event::WalletUpdated => {
                self.events.borrow_mut().push("wallet_updated");
            }
        }
    }
}

/// Records every POST made, optionally failing a configured URL once (S6).
#[derive(Default)]
pub struct RecordingHttpPoster {
    pub posts: RefCell<Vec<(String, Value)>>,
    fail_once: RefCell<std::collections::HashSet<String>>,
}

impl RecordingHttpPoster {
    pub fn fail_next_post_to(&self, url: &str) {
        self.fail_once.borrow_mut().insert(url.to_string());
    }
}

#[async_trait(?Send)]
impl HttpPoster for RecordingHttpPoster {
    async fn post_json(&self, url: &str, body: Value) -> Result<(), PostError> {
        self.posts.borrow_mut().push((url.to_string(), body));
        if self.fail_once.borrow_mut().remove(url) {
            return Err(PostError { url: url.to_string(), message: "simulated failure".into() });
        }
        Ok(())
    }
}

pub fn addr(s: &str) -> Address {
    Address::from(s)
}
