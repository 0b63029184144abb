//! The wallet-backing assembly: a [`crate::sync::engine::SubscriptionEngine`]
//! wired to a [`reconciler::HistoryReconciler`] (`OnStatus`) and a
//! [`progress::ProgressLoop`] (`Driver`) (§2, §4.3–§4.5).

mod progress;
mod reconciler;
mod shared;
mod txfetch;

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::sync::counters::Counters;
use crate::sync::engine::SubscriptionEngine;
use crate::sync::error::CoreError;
use crate::sync::events::EventSink;
use crate::sync::interface::{Codec, Interface};
use crate::sync::store::WalletStore;

use progress::{new_tx_fetch_permits, ProgressLoop};
use reconciler::HistoryReconciler;
use shared::SharedState;

/// Tuning knobs with the defaults called out in `SPEC_FULL.md` §12.
#[derive(Clone, Copy, Debug)]
pub struct SynchronizerConfig {
    /// `ProgressLoop`'s steady-state poll interval (§4.5). Default 100ms.
    pub tick: Duration,
    /// Concurrency cap on outstanding `get_transaction` calls, shared
    /// across every in-flight reconciliation (§5, §9 REDESIGN note).
    pub tx_fetch_concurrency: usize,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            tx_fetch_concurrency: 32,
        }
    }
}

/// The assembled Synchronizer: construct with [`Synchronizer::new`], then
/// consume it with [`Synchronizer::run`]. Returns only on a fatal error
/// (`GracefulDisconnect` or `SynchronizerFailure`); the caller is expected
/// to build a fresh one and retry (§7, §9).
pub struct Synchronizer<C: Codec, I, S> {
    engine: SubscriptionEngine<C, I>,
    reconciler: Rc<HistoryReconciler<C, I, S>>,
    progress: Rc<ProgressLoop<C, I, S>>,
}

impl<C, I, S> Synchronizer<C, I, S>
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
        event_sink: Rc<dyn EventSink<C::Tx>>,
        config: SynchronizerConfig,
    ) -> Self {
        let counters = Rc::new(Counters::default());
        let shared = Rc::new(SharedState::new());
        let permits = new_tx_fetch_permits(config.tx_fetch_concurrency);

        let reconciler = Rc::new(HistoryReconciler::new(
            codec.clone(),
            interface.clone(),
            store.clone(),
            counters.clone(),
            event_sink.clone(),
            shared.clone(),
            permits,
        ));
        let progress = Rc::new(ProgressLoop::new(
            store,
            counters.clone(),
            event_sink,
            shared,
            reconciler.clone(),
            config.tick,
        ));
        let engine = SubscriptionEngine::new(codec, interface, counters);

        Self { engine, reconciler, progress }
    }

    pub async fn run(self) -> Result<(), CoreError> {
        self.engine.run(self.reconciler, self.progress).await
    }
}
