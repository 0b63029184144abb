//! Engine-owned state: the address/scripthash bookkeeping (§3, §4.2). The
//! request counters live one level up, in [`crate::sync::counters`], since
//! they are shared with the history-reconciliation and tx-fetch
//! collaborators, not owned by the engine alone.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::sync::counters::Counters;
use crate::sync::types::{Address, Scripthash};

pub(crate) struct EngineState {
    pub requested_addrs: RefCell<HashSet<Address>>,
    pub scripthash_to_address: RefCell<HashMap<Scripthash, Address>>,
    pub counters: Rc<Counters>,
    pub processed_some_notifications: Cell<bool>,
}

impl EngineState {
    pub fn new(counters: Rc<Counters>) -> Self {
        Self {
            requested_addrs: RefCell::new(HashSet::new()),
            scripthash_to_address: RefCell::new(HashMap::new()),
            counters,
            processed_some_notifications: Cell::new(false),
        }
    }
}
