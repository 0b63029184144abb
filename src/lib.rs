//! `addr-sync-core`: the subscription-based wallet synchronizer described
//! in `DESIGN.md` — per-address status subscriptions, history
//! reconciliation, and webhook fan-out over an injected index-server
//! `Interface`.

pub mod sync;
