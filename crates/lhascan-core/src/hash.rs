//! Stable hashing over canonical JSON payloads.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::ScanError;
use crate::serde::to_canonical_json_bytes;

/// Computes a stable hexadecimal hash for the provided serializable payload.
///
/// Used to fingerprint configuration snapshots in stored result metadata so
/// that a table can be matched back to the exact scan definition that
/// produced it.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, ScanError> {
    let bytes = to_canonical_json_bytes(value)?;
    let digest = Sha256::digest(bytes);
    Ok(format!("{:x}", digest))
}
