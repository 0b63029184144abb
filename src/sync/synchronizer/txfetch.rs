//! `TxFetcher` — fetches, parses and verifies missing transactions (§4.4).
//! Concurrency across in-flight fetches is capped by a shared `Semaphore`,
//! a deliberate refinement over the original's unbounded fan-out (see the
//! REDESIGN note in `SPEC_FULL.md` §9).

use std::rc::Rc;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::sync::counters::Counters;
use crate::sync::error::CoreError;
use crate::sync::events::{Event, EventSink};
use crate::sync::interface::{Codec, Interface};
use crate::sync::store::WalletStore;
use crate::sync::synchronizer::shared::SharedState;
use crate::sync::types::{Address, StoredTx, Txid};

/// Fetches `txid` (believed to belong to `context`'s history), verifies the
/// server sent back the transaction it was asked for, hands it to the
/// store, and publishes a `NewTransaction` event.
///
/// `requested_tx[txid]` is removed in every exit path — success, a
/// discarded not-found, or a propagated failure — mirroring the original's
/// finally-block counter bookkeeping (§4.4, §7). A txid mismatch is a
/// `CoreError::SynchronizerFailure`, fatal to the whole engine, since the
/// server lied about its own transaction data.
async fn fetch_one<C, I, S>(
    codec: Rc<C>,
    interface: Rc<I>,
    store: Arc<S>,
    counters: Rc<Counters>,
    event_sink: Rc<dyn EventSink<C::Tx>>,
    shared: Rc<SharedState>,
    permits: Rc<Semaphore>,
    txid: Txid,
    height: i32,
    context: Option<Address>,
    allow_not_found: bool,
) -> Result<(), CoreError>
where
    C: Codec + 'static,
    C::Tx: Clone,
    I: Interface + 'static,
    S: WalletStore<C::Tx> + 'static,
{
    let _permit = permits
        .acquire_owned()
        .await
        .expect("tx-fetch semaphore is never closed while the engine runs");

    counters.inc_sent();
    let raw = interface.get_transaction(txid).await;
    counters.inc_answered();

    let raw = match raw {
        Ok(raw) => raw,
        Err(rpc_err) => {
            shared.requested_tx.borrow_mut().remove(&txid);
            if allow_not_found {
                log::warn!("[sync] get_transaction({txid}) failed, treating as not found: {}", rpc_err.message);
                return Ok(());
            }
            return Err(CoreError::Rpc(rpc_err));
        }
    };

    let tx = match codec.parse_transaction(&raw) {
        Ok(tx) => tx,
        Err(err) => {
            shared.requested_tx.borrow_mut().remove(&txid);
            return Err(err);
        }
    };

    let got_txid = codec.txid_of(&tx);
    if got_txid != txid {
        shared.requested_tx.borrow_mut().remove(&txid);
        return Err(CoreError::SynchronizerFailure {
            expected: txid,
            context,
        });
    }

    event_sink.publish(Event::NewTransaction {
        tx: tx.clone(),
        height,
    });
    store.receive_tx_callback(txid, tx, height).await;
    shared.requested_tx.borrow_mut().remove(&txid);
    Ok(())
}

/// Fetches every txid in `missing` concurrently (bounded by `permits`,
/// shared with every other in-flight reconciliation). Skips a txid if a
/// fetch for it is already outstanding (`shared.requested_tx`) or if the
/// store already holds a complete transaction for it. Returns the first
/// `SynchronizerFailure`-or-propagated-`Rpc` error encountered, if any,
/// after every fetch has settled — a single bad transaction does not starve
/// its siblings of a chance to complete.
pub(crate) async fn fetch_missing<C, I, S>(
    codec: Rc<C>,
    interface: Rc<I>,
    store: Arc<S>,
    counters: Rc<Counters>,
    event_sink: Rc<dyn EventSink<C::Tx>>,
    shared: Rc<SharedState>,
    permits: Rc<Semaphore>,
    missing: Vec<(Txid, i32)>,
    context: Option<Address>,
    allow_not_found: bool,
) -> Result<(), CoreError>
where
    C: Codec + 'static,
    C::Tx: Clone,
    I: Interface + 'static,
    S: WalletStore<C::Tx> + 'static,
{
    let mut work = Vec::new();
    for (txid, height) in missing {
        if txid.is_pruned_sentinel() {
            continue;
        }
        if shared.requested_tx.borrow().contains_key(&txid) {
            continue;
        }
        if let Some(StoredTx::Complete(_)) = store.get_transaction(txid).await {
            continue;
        }
        shared.requested_tx.borrow_mut().insert(txid, height);
        work.push((txid, height));
    }

    let mut tasks: JoinSet<Result<(), CoreError>> = JoinSet::new();
    for (txid, height) in work {
        tasks.spawn_local(fetch_one(
            codec.clone(),
            interface.clone(),
            store.clone(),
            counters.clone(),
            event_sink.clone(),
            shared.clone(),
            permits.clone(),
            txid,
            height,
            context.clone(),
            allow_not_found,
        ));
    }

    let mut first_err = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
            Err(join_err) => {
                log::warn!("[sync] tx fetch task did not complete cleanly: {join_err}");
            }
        }
    }
    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
