//! Diagonal-covariance Gaussian mixture models trained by EM.
//!
//! This facade crate re-exports the emgmm crates for convenient access.
//!
//! ## Crate Organization
//!
//! - [`core`] — Type aliases, constants, logging and interrupt utilities
//! - [`mixture`] — Model, sufficient statistics, variance floor, codecs
//! - [`training`] — Trainer state machine, parallel harness, persistence

pub use emgmm_core     as core;
pub use emgmm_mixture  as mixture;
pub use emgmm_training as training;
