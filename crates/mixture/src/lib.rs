//! Diagonal-covariance Gaussian mixture models trained by EM.
//!
//! The numerical core shared by the sequential trainer and by every
//! parallel harness adapter. Nothing in this crate performs I/O beyond
//! the in-memory codecs.
//!
//! ## Core Types
//!
//! - [`Mixture`] — Model parameters, E-step primitives and the M-step update
//! - [`SufficientStatistics`] — Mergeable 0th/1st/2nd order moment accumulator
//! - [`VarianceFloor`] — Per-dimension lower bound applied during updates
//! - [`Moments`] — Dataset mean and variance, from records or from a global merge
//!
//! ## Codecs
//!
//! - [`Mixture::encode`] / [`Mixture::decode`] — Fixed-precision text parameters
//! - [`SufficientStatistics::to_bytes`] / [`SufficientStatistics::from_bytes`] — Versioned binary accumulator
mod codec;
mod error;
mod floor;
mod mixture;
mod moments;
mod statistics;
mod wire;

pub use error::*;
pub use floor::*;
pub use mixture::*;
pub use moments::*;
pub use statistics::*;
