//! Contract for invoking the external simulation chain.

use serde_json::Value;

use crate::resolve::ScanPoint;

/// Executes one scan point against the external simulation binaries.
///
/// An implementation materializes the current template with the point's
/// values into an isolated working directory, invokes the binary chain, and
/// parses the output document into its nested mapping form. Concurrent
/// invocations must not share working directories; the scheduler relies on
/// that isolation and provides no locking of its own.
///
/// Returns `None` when the invocation produced no usable result (crashed
/// binary, unparsable output); such points are dropped by the scheduler.
pub trait Runner: Send + Sync {
    /// Runs one scan point to completion.
    fn run(&self, point: &ScanPoint) -> Option<Value>;
}

impl<F> Runner for F
where
    F: Fn(&ScanPoint) -> Option<Value> + Send + Sync,
{
    fn run(&self, point: &ScanPoint) -> Option<Value> {
        self(point)
    }
}
