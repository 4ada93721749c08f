//! `memoir-catalog` – The memory collection.
//!
//! Holds the ordered list of geotagged photo memories the flyover visits and
//! the projections derived from it.
//!
//! # Modules
//!
//! - [`catalog`] – [`Catalog`][catalog::Catalog]: an immutable, ordered
//!   collection of [`MemoryRecord`][memoir_types::MemoryRecord]s, built from
//!   the in-process literal or loaded from a TOML document.
//! - [`year_index`] – [`YearIndex`][year_index::YearIndex]: the distinct
//!   years present in a catalog, oldest first, recomputed on every call.

pub mod catalog;
pub mod year_index;

pub use catalog::Catalog;
pub use year_index::{YearIndex, years};
