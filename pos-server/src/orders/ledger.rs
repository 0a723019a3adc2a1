//! Revision ledger hash chain
//!
//! Each order's ledger entries are chained: an entry's hash covers its
//! canonical fields plus the previous entry's hash, so any retroactive edit
//! of committed history is detectable by a single forward walk.

use sha2::{Digest, Sha256};
use shared::revision::Revision;

/// Chain root for an order's first revision
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Hash an entry's canonical fields together with its `prev_hash`
///
/// `curr_hash` itself is excluded; everything else that makes the entry
/// meaningful is covered.
pub fn chain_hash(revision: &Revision) -> String {
    let canonical = serde_json::json!({
        "order_id": revision.order_id,
        "version_from": revision.version_from,
        "version_to": revision.version_to,
        "reason": revision.reason,
        "created_by": revision.created_by,
        "delta_amount": revision.delta_amount,
        "operations": revision.operations,
        "diff": revision.diff,
        "created_at": revision.created_at,
        "prev_hash": revision.prev_hash,
    });

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Walk one order's ledger and check every link
///
/// Entries must be in version order, as returned by storage.
pub fn verify_chain(revisions: &[Revision]) -> bool {
    let mut prev = GENESIS_HASH.to_string();
    for revision in revisions {
        if revision.prev_hash != prev || revision.curr_hash != chain_hash(revision) {
            return false;
        }
        prev = revision.curr_hash.clone();
    }
    true
}
