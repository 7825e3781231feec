//! BLAKE3 fingerprints of resolved snapshots.
//!
//! Two snapshots with equal JSON have equal digests, so a digest tells a
//! caller whether a record or document changed between two runs.

use crate::error::Result;
use serde::{Serialize, Serializer};
use std::fmt;

/// Fingerprint of a resolved snapshot. Displays and serializes as hex.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Digest(blake3::Hash);

impl Digest {
    /// Digest raw bytes.
    pub fn of_bytes(data: &[u8]) -> Self {
        Digest(blake3::hash(data))
    }

    /// Digest the JSON encoding of a value.
    ///
    /// The value goes through a JSON tree first so object keys are written in
    /// map order however the value serializes itself.
    pub fn of_json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let tree = serde_json::to_value(value)?;
        let mut hasher = blake3::Hasher::new();
        serde_json::to_writer(&mut hasher, &tree)?;
        Ok(Digest(hasher.finalize()))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.to_hex().as_str())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
