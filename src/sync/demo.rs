//! In-memory `Codec`/`Interface`/`WalletStore` stand-ins used by the demo
//! binary to exercise the synchronizer end-to-end without a live index
//! server (§12). None of this is a real wire codec or script-hash
//! derivation — see `SPEC_FULL.md` §1 for what the core deliberately scopes
//! those out to.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::hashes::{sha256, Hash};
use tokio::sync::mpsc::UnboundedSender;

use crate::sync::error::{CoreError, RpcError};
use crate::sync::interface::{Codec, Interface};
use crate::sync::store::WalletStore;
use crate::sync::types::{
    Address, AddressStatus, HistoryEntry, HistoryItem, Scripthash, StoredTx, Txid, TxFee,
};

/// An opaque "parsed transaction" for the demo: just its raw bytes plus the
/// txid the demo codec computed for them. Real wallets hand back a
/// consensus-decoded transaction type here instead.
#[derive(Clone, Debug)]
pub struct DemoTx {
    pub txid: Txid,
    pub raw: Vec<u8>,
}

/// Validates any non-empty ASCII string as an address and derives its
/// scripthash/txids by hashing with SHA-256 — good enough to exercise the
/// engine's plumbing, not a stand-in for real address/script derivation.
pub struct DemoCodec;

impl Codec for DemoCodec {
    type Tx = DemoTx;

    fn validate_address(&self, addr: &str) -> bool {
        !addr.is_empty() && addr.is_ascii()
    }

    fn address_to_scripthash(&self, addr: &Address) -> Scripthash {
        Scripthash(sha256::Hash::hash(addr.as_bytes()).to_byte_array())
    }

    fn parse_transaction(&self, raw: &[u8]) -> Result<Self::Tx, CoreError> {
        let txid = Txid(sha256::Hash::hash(raw).to_byte_array());
        Ok(DemoTx { txid, raw: raw.to_vec() })
    }

    fn txid_of(&self, tx: &Self::Tx) -> Txid {
        tx.txid
    }
}

struct ScriptedAddress {
    initial_status: AddressStatus,
    history: Vec<HistoryItem>,
    raw_txs: HashMap<Txid, Vec<u8>>,
}

/// A scripted, in-memory index server: construct it with the history a real
/// server would serve, then subscribe/fetch against it exactly like the
/// real `Interface`.
#[derive(Default)]
pub struct DemoInterface {
    scripted: RefCell<HashMap<Scripthash, ScriptedAddress>>,
}

impl DemoInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(
        &self,
        scripthash: Scripthash,
        initial_status: AddressStatus,
        history: Vec<HistoryItem>,
        raw_txs: HashMap<Txid, Vec<u8>>,
    ) {
        self.scripted
            .borrow_mut()
            .insert(scripthash, ScriptedAddress { initial_status, history, raw_txs });
    }
}

#[async_trait(?Send)]
impl Interface for DemoInterface {
    async fn subscribe(
        &self,
        scripthash: Scripthash,
        notifications: UnboundedSender<(Scripthash, AddressStatus)>,
    ) -> Result<(), RpcError> {
        let status = self
            .scripted
            .borrow()
            .get(&scripthash)
            .map(|s| s.initial_status.clone())
            .unwrap_or(None);
        let _ = notifications.send((scripthash, status));
        Ok(())
    }

    async fn get_history_for_scripthash(
        &self,
        scripthash: Scripthash,
    ) -> Result<Vec<HistoryItem>, RpcError> {
        Ok(self
            .scripted
            .borrow()
            .get(&scripthash)
            .map(|s| s.history.clone())
            .unwrap_or_default())
    }

    async fn get_transaction(&self, txid: Txid) -> Result<Vec<u8>, RpcError> {
        for scripted in self.scripted.borrow().values() {
            if let Some(raw) = scripted.raw_txs.get(&txid) {
                return Ok(raw.clone());
            }
        }
        Err(RpcError::new(format!("no such transaction: {txid}")))
    }
}

/// A thread-safe in-memory `WalletStore`. `Mutex`-guarded rather than
/// `RefCell`-guarded because the trait requires `Send + Sync` for the
/// `synchronize()` / worker-thread boundary (§5).
#[derive(Default)]
pub struct DemoWalletStore {
    addresses: Mutex<Vec<Address>>,
    history: Mutex<HashMap<Address, Vec<HistoryEntry>>>,
    txs: Mutex<HashMap<Txid, StoredTx<DemoTx>>>,
    up_to_date: Mutex<bool>,
}

impl DemoWalletStore {
    pub fn new(addresses: Vec<Address>) -> Self {
        Self {
            addresses: Mutex::new(addresses),
            history: Mutex::new(HashMap::new()),
            txs: Mutex::new(HashMap::new()),
            up_to_date: Mutex::new(false),
        }
    }

    pub fn generate_address(&self, addr: Address) {
        self.addresses.lock().unwrap().push(addr);
    }
}

#[async_trait]
impl WalletStore<DemoTx> for DemoWalletStore {
    async fn get_addr_history(&self, addr: &Address) -> Vec<HistoryEntry> {
        self.history.lock().unwrap().get(addr).cloned().unwrap_or_default()
    }

    async fn get_transaction(&self, txid: Txid) -> Option<StoredTx<DemoTx>> {
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
    }

    async fn receive_tx_callback(&self, txid: Txid, tx: DemoTx, _height: i32) {
        self.txs.lock().unwrap().insert(txid, StoredTx::Complete(tx));
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
