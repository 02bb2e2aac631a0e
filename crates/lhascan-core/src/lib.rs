#![deny(missing_docs)]
#![doc = "Core error, RNG, and serialization primitives for the lhascan parameter-scan engine."]

/// Structured error payloads and the workspace error enum.
pub mod errors;
/// Stable hashing over canonical JSON payloads.
pub mod hash;
/// Deterministic RNG handle and seed derivation.
pub mod rng;
/// Canonical JSON and YAML serde helpers.
pub mod serde;

pub use errors::{ErrorInfo, ScanError};
pub use hash::stable_hash_string;
pub use rng::{derive_substream_seed, wall_clock_seed, RngHandle};
