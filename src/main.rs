use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use addr_sync_core::sync::demo::{DemoCodec, DemoInterface, DemoTx, DemoWalletStore};
use addr_sync_core::sync::events::{Event, EventSink};
use addr_sync_core::sync::interface::Codec;
use addr_sync_core::sync::status::hash_history;
use addr_sync_core::sync::synchronizer::{Synchronizer, SynchronizerConfig};
use addr_sync_core::sync::types::{Address, HistoryEntry, HistoryItem};

/// Demo driver for the synchronizer core, wired against an in-memory
/// scripted index server rather than a live one — this stands in for the
/// GUI/dialog/fee-estimation layers the core scopes out.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// `ProgressLoop` steady-state poll interval, in milliseconds.
    #[arg(long, env = "ADDR_SYNC_TICK_MS", default_value_t = 100)]
    tick_ms: u64,

    /// Concurrency cap on outstanding `get_transaction` calls.
    #[arg(long, env = "ADDR_SYNC_TX_CONCURRENCY", default_value_t = 32)]
    tx_concurrency: usize,

    /// How many seconds to run the demo before shutting down.
    #[arg(long, default_value_t = 2)]
    seconds: u64,
}

struct LoggingEventSink;

impl EventSink<DemoTx> for LoggingEventSink {
    fn publish(&self, event: Event<DemoTx>) {
        match event {
            Event::NewTransaction { tx, height } => {
                log::info!("[demo] new_transaction {} at height {height}", tx.txid);
            }
            Event::WalletUpdated => {
                log::info!("[demo] wallet_updated");
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let codec = Rc::new(DemoCodec);
    let interface = Rc::new(DemoInterface::new());

    let empty_addr: Address = Address::from("bc1q-empty-demo-address");
    let funded_addr: Address = Address::from("bc1q-funded-demo-address");

    let raw_tx = b"a totally legitimate signed transaction".to_vec();
    let txid = codec.txid_of(&codec.parse_transaction(&raw_tx)?);

    let history = vec![HistoryItem { tx_hash: txid, height: 700_000, fee: None }];
    let status = hash_history(&[HistoryEntry { txid, height: 700_000 }]);

    let mut raw_txs = HashMap::new();
    raw_txs.insert(txid, raw_tx);

    interface.script(codec.address_to_scripthash(&empty_addr), None, Vec::new(), HashMap::new());
    interface.script(codec.address_to_scripthash(&funded_addr), status, history, raw_txs);

    let store = Arc::new(DemoWalletStore::new(vec![empty_addr, funded_addr]));
    let event_sink: Rc<dyn EventSink<DemoTx>> = Rc::new(LoggingEventSink);

    let config = SynchronizerConfig {
        tick: Duration::from_millis(args.tick_ms),
        tx_fetch_concurrency: args.tx_concurrency,
    };

    let synchronizer = Synchronizer::new(codec, interface, store, event_sink, config);

    let local = tokio::task::LocalSet::new();
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    local.block_on(&rt, async move {
        tokio::select! {
            result = synchronizer.run() => {
                if let Err(err) = result {
                    log::error!("[demo] synchronizer stopped: {err}");
                }
            }
            _ = tokio::time::sleep(Duration::from_secs(args.seconds)) => {
                log::info!("[demo] demo window elapsed, shutting down");
            }
        }
    });

    Ok(())
}
