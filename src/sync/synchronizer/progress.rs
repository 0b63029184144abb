//! `ProgressLoop` — the synchronizer's `Driver` (§4.5). Heals wallets whose
//! history outlived their transaction records, seeds the engine with every
//! address the store already knows about (in randomly shuffled order), then
//! ticks forever: calling `store.synchronize()` off the loop, recomputing
//! up-to-date-ness, and publishing `WalletUpdated` on every observed change.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;

use crate::sync::counters::Counters;
use crate::sync::engine::{Driver, EngineHandle};
use crate::sync::error::CoreError;
use crate::sync::events::{Event, EventSink};
use crate::sync::interface::{Codec, Interface};
use crate::sync::store::WalletStore;
use crate::sync::synchronizer::reconciler::HistoryReconciler;
use crate::sync::synchronizer::shared::SharedState;

pub(crate) struct ProgressLoop<C, I, S> {
    store: Arc<S>,
    counters: Rc<Counters>,
    event_sink: Rc<dyn EventSink<C::Tx>>,
    shared: Rc<SharedState>,
    reconciler: Rc<HistoryReconciler<C, I, S>>,
    tick: Duration,
}

impl<C, I, S> ProgressLoop<C, I, S>
where
    C: Codec + 'static,
    C::Tx: Clone,
    I: Interface + 'static,
    S: WalletStore<C::Tx> + 'static,
{
    pub fn new(
        store: Arc<S>,
        counters: Rc<Counters>,
        event_sink: Rc<dyn EventSink<C::Tx>>,
        shared: Rc<SharedState>,
        reconciler: Rc<HistoryReconciler<C, I, S>>,
        tick: Duration,
    ) -> Self {
        Self { store, counters, event_sink, shared, reconciler, tick }
    }

    async fn heal_and_seed(&self, engine: &EngineHandle<C>) -> Result<(), CoreError> {
        self.store.set_up_to_date(false);

        for addr in self.store.get_history().await {
            let hist = self.store.get_addr_history(&addr).await;
            self.reconciler.heal_missing_txs(&addr, hist).await?;
        }

        let mut addresses = self.store.get_addresses().await;
        addresses.shuffle(&mut rand::thread_rng());
        for addr in addresses {
            if let Err(err) = engine.add(addr.clone()) {
                log::warn!("[sync] could not seed address {addr} from store: {err}");
            }
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl<C, I, S> Driver<C> for ProgressLoop<C, I, S>
where
    C: Codec + 'static,
    C::Tx: Clone,
    I: Interface + 'static,
    S: WalletStore<C::Tx> + 'static,
{
    async fn run(&self, engine: EngineHandle<C>, fault_tx: UnboundedSender<CoreError>) {
        if let Err(err) = self.heal_and_seed(&engine).await {
            let _ = fault_tx.send(err);
            return;
        }

        let mut last_reported = self.store.is_up_to_date();
        loop {
            tokio::time::sleep(self.tick).await;

            let store = self.store.clone();
            let synchronize_result = tokio::task::spawn_blocking(move || store.synchronize()).await;
            match synchronize_result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    let _ = fault_tx.send(err);
                    return;
                }
                Err(join_err) => {
                    log::warn!("[sync] store.synchronize() task did not complete cleanly: {join_err}");
                }
            }

            let up_to_date = engine.requested_addrs_settled() && self.shared.is_settled();
            let processed_notifications = engine.processed_some_notifications();

            if up_to_date != last_reported || (up_to_date && processed_notifications) {
                engine.clear_processed_some_notifications();
                last_reported = up_to_date;
                if up_to_date {
                    self.counters.reset();
                }
                self.store.set_up_to_date(up_to_date);
                self.event_sink.publish(Event::WalletUpdated);
                log::debug!("[sync] up_to_date -> {up_to_date}");
            }
        }
    }
}

/// Concurrency cap shared by every `TxFetcher` fan-out spawned by this
/// synchronizer (§5 backpressure refinement).
pub(crate) fn new_tx_fetch_permits(max_concurrent: usize) -> Rc<Semaphore> {
    Rc::new(Semaphore::new(max_concurrent.max(1)))
}
