//! `WebhookDispatcher` (§4.6): maps address → ordered URL list, and on every
//! status notification POSTs `{"address", "status"}` to each registered URL.

use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::sync::engine::{Driver, EngineHandle, OnStatus};
use crate::sync::error::CoreError;
use crate::sync::interface::Codec;
use crate::sync::notifier::http::HttpPoster;
use crate::sync::types::{Address, AddressStatus};

pub struct WebhookDispatcher<C, P> {
    poster: Rc<P>,
    /// `WatchedAddresses` (§3): insertion order preserved, duplicates
    /// allowed — the caller's choice to register the same URL twice.
    watched: RefCell<HashMap<Address, Vec<String>>>,
    watch_tx: UnboundedSender<(Address, String)>,
    watch_rx: RefCell<Option<UnboundedReceiver<(Address, String)>>>,
    _engine_codec: PhantomData<C>,
}

impl<C, P> WebhookDispatcher<C, P>
where
    C: Codec + 'static,
    P: HttpPoster + 'static,
{
    pub fn new(poster: Rc<P>) -> Self {
        let (watch_tx, watch_rx) = mpsc::unbounded_channel();
        Self {
            poster,
            watched: RefCell::new(HashMap::new()),
            watch_tx,
            watch_rx: RefCell::new(Some(watch_rx)),
            _engine_codec: PhantomData,
        }
    }

    /// Enqueues `(addr, url)` for registration. Thread-safe; actual
    /// insertion into `watched` happens on the `Driver`'s loop, matching the
    /// add-queue marshalling pattern used by `SubscriptionEngine::add`
    /// (§4.2, §4.6).
    pub fn start_watching_addr(&self, addr: Address, url: String) {
        let _ = self.watch_tx.send((addr, url));
    }

    /// Removes `addr` from the watch map outright. No server-side
    /// unsubscribe is issued — the engine keeps its subscription alive,
    /// a known, bounded leak accepted in `DESIGN.md` (§9 open question 1).
    pub fn stop_watching_addr(&self, addr: &Address) {
        self.watched.borrow_mut().remove(addr);
    }

    pub fn watched_urls(&self, addr: &Address) -> Vec<String> {
        self.watched.borrow().get(addr).cloned().unwrap_or_default()
    }
}

#[async_trait(?Send)]
impl<C, P> Driver<C> for WebhookDispatcher<C, P>
where
    C: Codec + 'static,
    P: HttpPoster + 'static,
{
    async fn run(&self, engine: EngineHandle<C>, _fault_tx: UnboundedSender<CoreError>) {
        // Re-add every address already watched at startup (restart case).
        let startup_addrs: Vec<Address> = self.watched.borrow().keys().cloned().collect();
        for addr in startup_addrs {
            if let Err(err) = engine.add(addr.clone()) {
                log::warn!("[notifier] could not re-add watched address {addr}: {err}");
            }
        }

        let mut watch_rx = self
            .watch_rx
            .borrow_mut()
            .take()
            .expect("WebhookDispatcher driver run more than once");

        while let Some((addr, url)) = watch_rx.recv().await {
            self.watched.borrow_mut().entry(addr.clone()).or_default().push(url);
            if let Err(err) = engine.add(addr.clone()) {
                log::warn!("[notifier] could not add watched address {addr}: {err}");
            }
        }
    }
}

#[async_trait(?Send)]
impl<C, P> OnStatus for WebhookDispatcher<C, P>
where
    C: Codec + 'static,
    P: HttpPoster + 'static,
{
    async fn on_status(&self, addr: Address, status: AddressStatus) -> Result<(), CoreError> {
        let urls = self.watched_urls(&addr);
        if urls.is_empty() {
            return Ok(());
        }

        let body = json!({ "address": addr.as_ref(), "status": status });
        for url in urls {
            if let Err(err) = self.poster.post_json(&url, body.clone()).await {
                log::warn!("[notifier] {err}");
            }
        }
        Ok(())
    }
}

