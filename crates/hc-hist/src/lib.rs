//! # hc-hist
//!
//! Binned accumulators for hadrochem and their persistence.
//!
//! - [`Histogram`]: uniform 1D histogram with under/overflow and `sumw2`.
//! - [`Profile`]: per-bin `(entries, sum, sum_sq)` of a filled quantity.
//! - [`BinSeries`]: per-bin value ± error, the projection of a profile used
//!   for scaling, division and bin combination.
//! - [`ObjectStore`]: named histograms/profiles persisted as one JSON document.
//!
//! ## Example
//!
//! ```
//! use hc_hist::{Histogram, ObjectStore};
//!
//! let mut h = Histogram::new("calibration", "nFwd", 100, 0.0, 200.0).unwrap();
//! h.fill(17.0);
//! h.fill(42.0);
//! h.normalize_by_width().unwrap();
//!
//! let mut store = ObjectStore::new();
//! store.insert_histogram(h);
//! assert_eq!(store.list_keys()[0].class_name, "Histogram");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod axis;
pub mod histogram;
pub mod profile;
pub mod series;
pub mod store;

pub use axis::{Axis, BinLocation};
pub use histogram::Histogram;
pub use profile::{Profile, ProfileBin};
pub use series::{BinSeries, BinValue};
pub use store::{KeyInfo, ObjectStore, STORE_SCHEMA_VERSION, StoredObject};
