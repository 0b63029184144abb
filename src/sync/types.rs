//! Core data model: addresses, scripthashes, txids and the status digest
//! they all revolve around.

use std::fmt;
use std::sync::Arc;

/// Wallet-visible destination identifier. Validity is checked out-of-band by
/// a [`crate::sync::interface::Codec`]; this type itself is just a cheap,
/// shareable string handle so the same address can be cloned into many
/// in-flight tasks without re-allocating. `Arc`, not `Rc`, despite the rest
/// of the engine's state living behind `Rc`/`Cell` on a single `LocalSet`
/// thread: `Address` values also flow through `WalletStore`, which must be
/// `Send + Sync` to cross the `spawn_blocking` boundary for `synchronize()`
/// (§5), so every type reachable from it — including the keys of its
/// history/address maps — has to be too.
pub type Address = Arc<str>;

/// 32-byte digest used as the server-side subscription key, derived
/// deterministically from an address by a `Codec`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scripthash(pub [u8; 32]);

impl fmt::Debug for Scripthash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scripthash({})", hex::encode(self.0))
    }
}

impl fmt::Display for Scripthash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// 32-byte transaction identifier, in the byte order the server/codec use
/// (the core never reinterprets these bytes; it only compares and hashes
/// them).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Txid(pub [u8; 32]);

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({})", hex::encode(self.0))
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Txid {
    /// Stand-in for the old servers' `['*']` pruned-history sentinel (§4.5,
    /// §8 S4). The original protocol represents this as a one-element list
    /// containing the literal string `"*"` in place of a real history row;
    /// since `Txid` here is a fixed 32-byte array rather than a
    /// variant-typed field, the sentinel is reserved as the all-`b'*'`
    /// byte pattern, which a real SHA-256-derived txid cannot produce by
    /// chance. `WalletStore` implementations construct this value (see
    /// `sync::demo`) when surfacing a pruned entry; the core never invents
    /// one itself.
    pub const PRUNED_SENTINEL: Txid = Txid([b'*'; 32]);

    pub fn is_pruned_sentinel(&self) -> bool {
        *self == Self::PRUNED_SENTINEL
    }
}

/// One row of an address's history as reported by the server or stored by
/// the wallet. `height > 0` is confirmed at that block height, `0` is
/// unconfirmed (mempool), `< 0` is unconfirmed with unconfirmed parents.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct HistoryEntry {
    pub txid: Txid,
    pub height: i32,
}

/// Per-address fingerprint of a history list. `None` means empty history.
pub type AddressStatus = Option<String>;

/// Fee (in the server's minimal unit) reported alongside a history entry,
/// kept only when the server actually supplied one.
pub type TxFee = Option<i64>;

/// One item of a `get_history_for_scripthash` response.
#[derive(Clone, Debug)]
pub struct HistoryItem {
    pub tx_hash: Txid,
    pub height: i32,
    pub fee: TxFee,
}

/// What the store holds for a given txid.
#[derive(Clone, Debug)]
pub enum StoredTx<Tx> {
    /// Fully parsed/serializable transaction.
    Complete(Tx),
    /// A placeholder (e.g. unsigned/partial) the core must still treat as
    /// missing for fetch purposes.
    Partial,
}
