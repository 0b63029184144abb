//! State shared between the `HistoryReconciler` and the tx-fetch
//! collaborator — kept separate from `engine::state::EngineState` because
//! it tracks history/tx requests, not subscriptions (§3, §4.3, §4.4).

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::sync::types::{Address, AddressStatus, Txid};

pub(crate) struct SharedState {
    /// `(address, status)` pairs with a history fetch currently in flight;
    /// dedups repeated notifications for the same status (§4.3 step 2).
    pub requested_histories: RefCell<HashSet<(Address, AddressStatus)>>,
    /// Txids currently being fetched, mapped to the height they were
    /// reported at. Presence implies exactly one outstanding fetch; removed
    /// on success or on a permitted not-found (§3, §4.4).
    pub requested_tx: RefCell<HashMap<Txid, i32>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            requested_histories: RefCell::new(HashSet::new()),
            requested_tx: RefCell::new(HashMap::new()),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.requested_histories.borrow().is_empty() && self.requested_tx.borrow().is_empty()
    }
}
