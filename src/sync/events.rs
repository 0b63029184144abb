//! Event sink — an injected handle in place of a process-wide callback
//! global, so multiple synchronizers can run in one process without
//! stepping on each other's notifications.

/// The two events the core ever emits. `Tx` is the codec's opaque parsed
/// transaction type.
pub enum Event<Tx> {
    /// A transaction was fetched, verified, and handed to the store.
    NewTransaction { tx: Tx, height: i32 },
    /// The synchronizer's up-to-date status just flipped, or a
    /// notification was processed while already up to date.
    WalletUpdated,
}

/// Where the core publishes [`Event`]s. Implementations decide how (or
/// whether) to fan them out to multiple listeners; the core only ever
/// holds one `Rc<dyn EventSink<Tx>>` and calls it directly.
pub trait EventSink<Tx> {
    fn publish(&self, event: Event<Tx>);
}
