//! `SubscriptionEngine` — the always-on core described in §4.2. Owns the
//! add-queue and status-queue, the per-address subscribe bookkeeping, and
//! the request counters; knows nothing about history reconciliation or tx
//! fetching, which are injected as an [`OnStatus`] callback, nor about what
//! drives address discovery, which is injected as a [`Driver`].

mod state;
mod tasks;

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;

use crate::sync::counters::Counters;
use crate::sync::error::CoreError;
use crate::sync::interface::{Codec, Interface};
use crate::sync::types::{Address, AddressStatus, Scripthash};

pub(crate) use state::EngineState;

/// Receives every status notification the engine dispatches, resolved back
/// to an address. Implemented by `HistoryReconciler` (§4.3); a
/// `SynchronizerFailure` returned here aborts the whole engine (§7).
#[async_trait(?Send)]
pub trait OnStatus {
    async fn on_status(&self, addr: Address, status: AddressStatus) -> Result<(), CoreError>;
}

/// Drives address discovery: decides which addresses to `add()` and when
/// the engine is done with its bootstrap pass. Implemented by `ProgressLoop`
/// (§4.5) for the synchronizer, and trivially (a no-op that just waits) by
/// the notifier binary, which only ever watches addresses handed to it up
/// front.
#[async_trait(?Send)]
pub trait Driver<C: Codec> {
    /// Runs for the lifetime of the engine. A driver that hits a fatal
    /// condition (e.g. `ProgressLoop`'s startup healing pass surfacing a
    /// `SynchronizerFailure`) reports it on `fault_tx` and returns; it does
    /// not get its own `Result`, since it shares the same fault channel as
    /// every other top-level task (§4.2, §4.5).
    async fn run(&self, engine: EngineHandle<C>, fault_tx: UnboundedSender<CoreError>);
}

/// A cheaply-cloneable handle into a running engine, handed to the
/// [`Driver`] and to anything else (e.g. an RPC-facing wrapper) that needs
/// to request addresses or read the counters without owning the engine
/// itself — the original's "`add()` is the thread-safe entry point" (§4.2).
pub struct EngineHandle<C: Codec> {
    codec: Rc<C>,
    add_tx: UnboundedSender<Address>,
    state: Rc<EngineState>,
}

impl<C: Codec> Clone for EngineHandle<C> {
    fn clone(&self) -> Self {
        Self {
            codec: self.codec.clone(),
            add_tx: self.add_tx.clone(),
            state: self.state.clone(),
        }
    }
}

impl<C: Codec> EngineHandle<C> {
    /// Validates `addr` synchronously against the codec, then enqueues it.
    /// Deduplication against already-requested addresses happens later, at
    /// queue-drain time (see the open question in `DESIGN.md`) — calling
    /// `add()` twice in a row for the same address is harmless but not
    /// free.
    pub fn add(&self, addr: Address) -> Result<(), CoreError> {
        if !self.codec.validate_address(&addr) {
            return Err(CoreError::InvalidAddress(addr.to_string()));
        }
        // The receiver only goes away once the engine itself has stopped;
        // a send error here means the caller is racing engine shutdown.
        let _ = self.add_tx.send(addr);
        Ok(())
    }

    pub fn requests_sent_and_answered(&self) -> (u64, u64) {
        self.state.counters.snapshot()
    }

    /// True once every address handed to `add()` has been subscribed and
    /// answered. Used by `ProgressLoop` as one leg of its up-to-date check
    /// (§4.5) — the other legs (pending histories, pending tx fetches) live
    /// in the synchronizer's own shared state.
    pub fn requested_addrs_settled(&self) -> bool {
        self.state.requested_addrs.borrow().is_empty()
    }

    /// Non-destructive read of `processed_some_notifications`, set by
    /// `handle_status` the moment it dispatches an `on_status` task.
    pub fn processed_some_notifications(&self) -> bool {
        self.state.processed_some_notifications.get()
    }

    /// Clears `processed_some_notifications`. Only ever called from
    /// `ProgressLoop`'s tick, which runs on the same `LocalSet` as
    /// `handle_status` — no synchronization needed beyond the `Cell`
    /// itself (§4.5, §9 open question 3).
    pub fn clear_processed_some_notifications(&self) {
        self.state.processed_some_notifications.set(false);
    }
}

/// The engine itself. Construct with [`SubscriptionEngine::new`], then hand
/// ownership to [`SubscriptionEngine::run`] — it is consumed by the run, not
/// borrowed, since there is exactly one run per engine lifetime.
pub struct SubscriptionEngine<C: Codec, I: Interface> {
    codec: Rc<C>,
    interface: Rc<I>,
    state: Rc<EngineState>,
    add_tx: UnboundedSender<Address>,
    add_rx: RefCell<Option<mpsc::UnboundedReceiver<Address>>>,
    status_tx: UnboundedSender<(Scripthash, AddressStatus)>,
    status_rx: RefCell<Option<mpsc::UnboundedReceiver<(Scripthash, AddressStatus)>>>,
}

impl<C, I> SubscriptionEngine<C, I>
where
    C: Codec + 'static,
    I: Interface + 'static,
{
    pub fn new(codec: Rc<C>, interface: Rc<I>, counters: Rc<Counters>) -> Self {
        let (add_tx, add_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        Self {
            codec,
            interface,
            state: Rc::new(EngineState::new(counters)),
            add_tx,
            add_rx: RefCell::new(Some(add_rx)),
            status_tx,
            status_rx: RefCell::new(Some(status_rx)),
        }
    }

    /// A handle usable before (and during) `run()`. Clonable and cheap;
    /// hand it to the `Driver` and to anything else that needs to call
    /// `add()`.
    pub fn handle(&self) -> EngineHandle<C> {
        EngineHandle {
            codec: self.codec.clone(),
            add_tx: self.add_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Runs the engine until a fatal error occurs (`GracefulDisconnect` or
    /// `SynchronizerFailure`) or the caller drops this future. There is no
    /// graceful internal stop condition — matching the original's "the
    /// whole taskgroup is cancelled together and the caller restarts"
    /// model (§7, §9).
    pub async fn run(
        self,
        on_status: Rc<dyn OnStatus>,
        driver: Rc<dyn Driver<C>>,
    ) -> Result<(), CoreError> {
        let add_rx = self
            .add_rx
            .borrow_mut()
            .take()
            .expect("SubscriptionEngine::run called more than once");
        let status_rx = self
            .status_rx
            .borrow_mut()
            .take()
            .expect("SubscriptionEngine::run called more than once");

        let (fault_tx, mut fault_rx) = mpsc::unbounded_channel::<CoreError>();

        let mut top: JoinSet<()> = JoinSet::new();
        top.spawn_local(tasks::send_subscriptions(
            self.state.clone(),
            self.codec.clone(),
            self.interface.clone(),
            add_rx,
            self.status_tx.clone(),
            fault_tx.clone(),
        ));
        top.spawn_local(tasks::handle_status(
            self.state.clone(),
            status_rx,
            on_status,
            fault_tx.clone(),
        ));
        {
            let engine_handle = self.handle();
            let driver_fault_tx = fault_tx.clone();
            top.spawn_local(async move { driver.run(engine_handle, driver_fault_tx).await });
        }
        drop(fault_tx);

        let result = tokio::select! {
            Some(err) = fault_rx.recv() => Err(err),
            _ = drain(&mut top) => Ok(()),
        };

        top.abort_all();
        self.interface.unsubscribe_all().await;
        result
    }
}

async fn drain(tasks: &mut JoinSet<()>) {
    while tasks.join_next().await.is_some() {}
}
