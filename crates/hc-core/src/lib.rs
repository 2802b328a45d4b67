//! # hc-core
//!
//! Core records and traits shared by every hadrochem crate.
//!
//! - [`Particle`] / [`Event`]: plain event records produced by an event source.
//! - [`EventSource`]: pull interface over a (possibly chained) event stream.
//! - [`Error`] / [`Result`]: the workspace-wide error type.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{EventSource, VecSource};
pub use types::{CentralityEstimator, CentralityEstimators, Event, Particle};

/// Crate version, reported by the CLI and stamped into artifacts.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
