//! # hc-events
//!
//! [`EventSource`](hc_core::EventSource) implementations.
//!
//! - [`JsonlEventReader`] / [`JsonlEventWriter`]: one JSON [`Event`](hc_core::Event)
//!   per line.
//! - [`EventChain`]: several event files read back to back as one stream,
//!   typically built from [`discover_files`].
//! - [`ToySource`]: a seeded, class-stratified stand-in for the thermal
//!   generator, emitting events with centrality estimators attached.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod jsonl;
pub mod toy;

pub use chain::{EventChain, discover_files};
pub use jsonl::{JsonlEventReader, JsonlEventWriter, read_all, write_events};
pub use toy::{ToyClass, ToyConfig, ToySource, ToySpecies};
