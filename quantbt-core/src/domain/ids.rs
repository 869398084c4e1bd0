use serde::{Deserialize, Serialize};
use std::fmt;

/// Order identifier, unique within a run. Rendered as `ord-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ord-{}", self.0)
    }
}

/// Monotonic order id source. One per run; never reset between segments.
#[derive(Debug, Clone, Default)]
pub struct OrderIdGenerator {
    issued: u64,
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> OrderId {
        self.issued += 1;
        OrderId(self.issued)
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// Run identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a short deterministic id from arbitrary bytes (BLAKE3 prefix).
    pub fn from_bytes(data: &[u8]) -> Self {
        let hex = blake3::hash(data).to_hex();
        Self(format!("run-{}", &hex.as_str()[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
