//! The wallet synchronizer core: a subscription engine that keeps a
//! wallet's view of the blockchain consistent with a remote index server.
//!
//! Two assemblies are built on top of the shared [`engine`]: a
//! [`synchronizer`] that reconciles history/transactions into a
//! `WalletStore`, and a [`notifier`] that fans status changes out to
//! webhooks. [`demo`] holds the in-memory `Codec`/`Interface`/`WalletStore`/
//! `HttpPoster` stand-ins used by the binary and by tests — nothing in this
//! crate implements a real Electrum-style session.

pub mod counters;
pub mod demo;
pub mod error;
pub mod engine;
pub mod events;
pub mod interface;
pub mod notifier;
pub mod status;
pub mod store;
pub mod synchronizer;
pub mod types;
