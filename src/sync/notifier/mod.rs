//! The webhook-fan-out assembly: a [`crate::sync::engine::SubscriptionEngine`]
//! wired to a single [`dispatcher::WebhookDispatcher`] that serves as both
//! the `OnStatus` handler and the `Driver`, since both roles share the same
//! watch-list state.

mod dispatcher;
mod http;

pub use dispatcher::WebhookDispatcher;
pub use http::{HttpPoster, PostError, ReqwestPoster};

use std::rc::Rc;

use crate::sync::counters::Counters;
use crate::sync::engine::SubscriptionEngine;
use crate::sync::error::CoreError;
use crate::sync::interface::{Codec, Interface};

/// The assembled Notifier: construct with [`Notifier::new`], then consume it
/// with [`Notifier::run`].
pub struct Notifier<C: Codec, I, P> {
    engine: SubscriptionEngine<C, I>,
    dispatcher: Rc<WebhookDispatcher<C, P>>,
}

impl<C, I, P> Notifier<C, I, P>
where
    C: Codec + 'static,
    I: Interface + 'static,
    P: HttpPoster + 'static,
{
    pub fn new(codec: Rc<C>, interface: Rc<I>, poster: Rc<P>) -> Self {
        let counters = Rc::new(Counters::default());
        let dispatcher = Rc::new(WebhookDispatcher::new(poster));
        let engine = SubscriptionEngine::new(codec, interface, counters);
        Self { engine, dispatcher }
    }

    /// The handle used to register watches before (and during) `run()`.
    pub fn dispatcher(&self) -> Rc<WebhookDispatcher<C, P>> {
        self.dispatcher.clone()
    }

    pub async fn run(self) -> Result<(), CoreError> {
        self.engine.run(self.dispatcher.clone(), self.dispatcher).await
    }
}
