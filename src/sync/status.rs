//! `StatusHasher` — the server-compatible status digest (§4.1).
//!
//! Pure function, no collaborators: given the ordered history of an
//! address, produce the same hex digest the index server would report for
//! that history, or `None` for an empty history. Bit-for-bit compatibility
//! with the server's convention is what lets the engine tell "server says
//! nothing changed" from "server says something changed" without a round
//! trip.

use bitcoin::hashes::{sha256, Hash};

use crate::sync::types::{AddressStatus, HistoryEntry};

/// Hash an ordered history list the way the index server does: the ASCII
/// concatenation of `txid:height:` for every entry, SHA-256'd, hex-encoded.
/// Order matters — this is not a set digest.
pub fn hash_history(history: &[HistoryEntry]) -> AddressStatus {
    if history.is_empty() {
        return None;
    }

    let mut preimage = String::new();
    for entry in history {
        preimage.push_str(&hex::encode(entry.txid.0));
        preimage.push(':');
        preimage.push_str(&entry.height.to_string());
        preimage.push(':');
    }

    let digest = sha256::Hash::hash(preimage.as_bytes());
    Some(hex::encode(digest.to_byte_array()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::Txid;

    fn txid(byte: u8) -> Txid {
        Txid([byte; 32])
    }

    #[test]
    fn empty_history_hashes_to_none() {
        assert_eq!(hash_history(&[]), None);
    }

    #[test]
    fn single_entry_matches_known_digest() {
        // preimage: "<64 'aa' hex>:700000:"
        let history = [HistoryEntry { txid: txid(0xaa), height: 700_000 }];
        let got = hash_history(&history).unwrap();
        assert_eq!(got.len(), 64);

        let mut preimage = hex::encode([0xaa_u8; 32]);
        preimage.push_str(":700000:");
        let expected = hex::encode(sha256::Hash::hash(preimage.as_bytes()).to_byte_array());
        assert_eq!(got, expected);
    }

    #[test]
    fn order_sensitive() {
        let a = HistoryEntry { txid: txid(1), height: 1 };
        let b = HistoryEntry { txid: txid(2), height: 2 };
        let forward = hash_history(&[a, b]);
        let backward = hash_history(&[b, a]);
        assert_ne!(forward, backward);
    }

    #[test]
    fn negative_heights_render_as_signed_decimal() {
        let history = [HistoryEntry { txid: txid(3), height: -1 }];
        let got = hash_history(&history).unwrap();

        let mut preimage = hex::encode([3_u8; 32]);
        preimage.push_str(":-1:");
        let expected = hex::encode(sha256::Hash::hash(preimage.as_bytes()).to_byte_array());
        assert_eq!(got, expected);
    }

    #[test]
    fn deterministic() {
        let history = [HistoryEntry { txid: txid(9), height: 0 }];
        assert_eq!(hash_history(&history), hash_history(&history));
    }
}
