//! Stable node identity.
//!
//! Every tree node is stamped with a [`NodeId`] when it is constructed. The id
//! survives edits to the node's content, so it can key DOM reconciliation and,
//! later, CRDT addressing.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque, process-unique node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a fresh id, unique within this process.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
        NodeId(format!("{}-{}", process_seed(), count))
    }

    /// Wrap an existing identifier (e.g. one received from a replica).
    pub fn from_string(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

/// CRC32 of a seed string, rendered as lowercase hex.
pub fn seed_hash(seed: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(seed.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn process_seed() -> &'static str {
    static SEED: OnceLock<String> = OnceLock::new();
    SEED.get_or_init(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        seed_hash(&format!("folio:{}:{}", process::id(), nanos))
    })
}

/// Deterministic sequential id generator.
///
/// Two generators created from the same seed produce the same sequence, which
/// is what a replica needs when it rebuilds a tree it received by value.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(name: &str) -> Self {
        Self {
            seed: seed_hash(name),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Next id in the sequence
    pub fn next_id(&mut self) -> NodeId {
        self.count += 1;
        NodeId(format!("{}-{}", self.seed, self.count))
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
