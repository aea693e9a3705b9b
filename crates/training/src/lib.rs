//! Training drivers for diagonal Gaussian mixtures.
//!
//! - [`Trainer`] — Sequential EM state machine over an in-memory [`Dataset`]
//! - [`Execution`] — Sequential or rayon-partitioned E-step sweep
//! - [`Harness`] — Stateless map / combine / reduce on serialized payloads
//! - [`Snapshot`] — Atomic on-disk parameter persistence
//! - [`Epoch`] — One persisted distributed iteration, run in-process
mod dataset;
mod epoch;
mod execution;
mod harness;
mod snapshot;
mod trainer;

pub use dataset::*;
pub use epoch::*;
pub use execution::*;
pub use harness::*;
pub use snapshot::*;
pub use trainer::*;
