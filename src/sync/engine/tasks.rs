//! The two cooperative loops that make up a `SubscriptionEngine` run: the
//! add-queue drain that issues subscribes, and the status-queue drain that
//! dispatches notifications to `OnStatus` (§4.2).

use std::rc::Rc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

use crate::sync::engine::state::EngineState;
use crate::sync::engine::OnStatus;
use crate::sync::error::CoreError;
use crate::sync::interface::{Codec, Interface};
use crate::sync::types::{Address, AddressStatus, Scripthash};

/// Drains `add_rx`, deduplicating against `state.requested_addrs` (the
/// dedup happens here, at drain time, not in the synchronous `add()` call —
/// see the open question in `DESIGN.md`), and spawns one subscribe task per
/// newly-requested address.
///
/// Returns only when `add_rx` closes and every in-flight subscribe has
/// settled. A "history too large" response is forwarded on `fault_tx` and
/// ends this loop; any other subscribe `RpcError` is logged and swallowed —
/// per `SPEC_FULL.md` §7, only `GracefulDisconnect` and `SynchronizerFailure`
/// are fatal to the whole engine.
pub(crate) async fn send_subscriptions<C, I>(
    state: Rc<EngineState>,
    codec: Rc<C>,
    interface: Rc<I>,
    mut add_rx: UnboundedReceiver<Address>,
    status_tx: UnboundedSender<(Scripthash, AddressStatus)>,
    fault_tx: UnboundedSender<CoreError>,
) where
    C: Codec + 'static,
    I: Interface + 'static,
{
    let mut subscribes: JoinSet<(Address, Result<(), crate::sync::error::RpcError>)> =
        JoinSet::new();
    let mut add_closed = false;

    loop {
        tokio::select! {
            maybe_addr = add_rx.recv(), if !add_closed => {
                match maybe_addr {
                    Some(addr) => {
                        if state.requested_addrs.borrow().contains(&addr) {
                            continue;
                        }
                        state.requested_addrs.borrow_mut().insert(addr.clone());
                        let scripthash = codec.address_to_scripthash(&addr);
                        state
                            .scripthash_to_address
                            .borrow_mut()
                            .insert(scripthash, addr.clone());
                        state.counters.inc_sent();

                        let interface = interface.clone();
                        let status_tx = status_tx.clone();
                        subscribes.spawn_local(async move {
                            let result = interface.subscribe(scripthash, status_tx).await;
                            (addr, result)
                        });
                    }
                    None => add_closed = true,
                }
            }
            Some(joined) = subscribes.join_next(), if !subscribes.is_empty() => {
                let (addr, result) = match joined {
                    Ok(pair) => pair,
                    Err(join_err) => {
                        log::warn!("[sync] subscribe task did not complete cleanly: {join_err}");
                        continue;
                    }
                };
                state.counters.inc_answered();
                state.requested_addrs.borrow_mut().remove(&addr);

                if let Err(rpc_err) = result {
                    if rpc_err.is_history_too_large() {
                        let _ = fault_tx.send(CoreError::GracefulDisconnect(rpc_err.message));
                        return;
                    }
                    log::warn!("[sync] subscribe({addr}) failed: {}", rpc_err.message);
                }
            }
            else => {
                if add_closed && subscribes.is_empty() {
                    break;
                }
            }
        }
    }
}

/// Drains `status_rx`, dispatching every `(scripthash, status)` pair to
/// `on_status` (resolved back to an address via
/// `state.scripthash_to_address`; unrecognized scripthashes are logged and
/// dropped — the server should never notify on one we didn't subscribe).
///
/// Each dispatch runs as its own child task so a slow reconciliation for one
/// address never blocks notifications for another. A `SynchronizerFailure`
/// from any of them is forwarded on `fault_tx` and ends this loop.
pub(crate) async fn handle_status(
    state: Rc<EngineState>,
    mut status_rx: UnboundedReceiver<(Scripthash, AddressStatus)>,
    on_status: Rc<dyn OnStatus>,
    fault_tx: UnboundedSender<CoreError>,
) {
    let mut dispatches: JoinSet<Result<(), CoreError>> = JoinSet::new();
    let mut status_closed = false;

    loop {
        tokio::select! {
            maybe_msg = status_rx.recv(), if !status_closed => {
                match maybe_msg {
                    Some((scripthash, status)) => {
                        let addr = state.scripthash_to_address.borrow().get(&scripthash).cloned();
                        let Some(addr) = addr else {
                            log::warn!("[sync] status for unknown scripthash {scripthash:?}");
                            continue;
                        };
                        state.processed_some_notifications.set(true);
                        let on_status = on_status.clone();
                        dispatches.spawn_local(async move { on_status.on_status(addr, status).await });
                    }
                    None => status_closed = true,
                }
            }
            Some(joined) = dispatches.join_next(), if !dispatches.is_empty() => {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        let _ = fault_tx.send(err);
                        return;
                    }
                    Err(join_err) => {
                        log::warn!("[sync] on_status task did not complete cleanly: {join_err}");
                    }
                }
            }
            else => {
                if status_closed && dispatches.is_empty() {
                    break;
                }
            }
        }
    }
}
