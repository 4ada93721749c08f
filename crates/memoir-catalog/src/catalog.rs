//! Ordered, immutable memory catalog.
//!
//! # File format
//!
//! A catalog document is a TOML array of `memory` tables:
//!
//! ```toml
//! [[memory]]
//! place = "Jerusalem"
//! coordinates = [35.235, 31.776]   # [longitude, latitude]
//! photo = "jerusalem.jpg"
//! caption = "Mount of Olives, 2023"
//! year = 2023
//! ```
//!
//! Insertion order is preserved.  Several records may share a year or a
//! photo; nothing is deduplicated.  Coordinates are range-checked on load,
//! photo references are not.
//!
//! # Example
//!
//! ```rust
//! use memoir_catalog::Catalog;
//!
//! let catalog = Catalog::builtin();
//! let in_2022 = catalog.for_year(2022);
//! assert!(in_2022.iter().all(|m| m.year == 2022));
//! ```

use std::fs;
use std::path::Path;

use memoir_types::{FlyoverError, LngLat, MemoryRecord, Year};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default, rename = "memory")]
    memories: Vec<MemoryRecord>,
}

/// The ordered memory collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    records: Vec<MemoryRecord>,
}

impl Catalog {
    /// Build a catalog from `records`, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`FlyoverError::InvalidRecord`] for the first record whose
    /// coordinates are not finite or fall outside the WGS84 ranges.
    pub fn new(records: Vec<MemoryRecord>) -> Result<Self, FlyoverError> {
        for (index, record) in records.iter().enumerate() {
            if !record.coordinates.is_valid() {
                return Err(FlyoverError::InvalidRecord {
                    index,
                    reason: format!("coordinates {} out of range", record.coordinates),
                });
            }
        }
        Ok(Self { records })
    }

    /// The memories shipped with the application.
    ///
    /// `london.jpg` and `jerusalem.jpg` are each reused at a second
    /// location.
    pub fn builtin() -> Self {
        Self {
            records: vec![
                MemoryRecord::new(
                    LngLat::new(-0.1276, 51.5072),
                    "london.jpg",
                    "A rainy afternoon in London",
                    2022,
                )
                .with_place("London"),
                MemoryRecord::new(
                    LngLat::new(-3.1883, 55.9533),
                    "london.jpg",
                    "Up Arthur's Seat before the rain",
                    2022,
                )
                .with_place("Edinburgh"),
                MemoryRecord::new(
                    LngLat::new(35.235, 31.776),
                    "jerusalem.jpg",
                    "Mount of Olives, 2023",
                    2023,
                )
                .with_place("Jerusalem"),
                MemoryRecord::new(
                    LngLat::new(34.7818, 32.0853),
                    "jerusalem.jpg",
                    "Sunset on the Tel Aviv promenade",
                    2023,
                )
                .with_place("Tel Aviv"),
                MemoryRecord::new(
                    LngLat::new(-21.9426, 64.1466),
                    "reykjavik.jpg",
                    "Hallgrímskirkja in the snow",
                    2024,
                )
                .with_place("Reykjavik"),
            ],
        }
    }

    /// Parse a catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`FlyoverError::Catalog`] when the TOML is malformed and
    /// [`FlyoverError::InvalidRecord`] when a record fails validation.
    pub fn from_toml_str(raw: &str) -> Result<Self, FlyoverError> {
        let doc: CatalogDocument = toml::from_str(raw)
            .map_err(|e| FlyoverError::Catalog(format!("failed to parse catalog: {e}")))?;
        Self::new(doc.memories)
    }

    /// Read and parse a catalog document from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FlyoverError::Catalog`] when the file cannot be read, plus
    /// everything [`from_toml_str`][Self::from_toml_str] can return.
    pub fn load(path: &Path) -> Result<Self, FlyoverError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            FlyoverError::Catalog(format!("failed to read catalog at {}: {e}", path.display()))
        })?;
        let catalog = Self::from_toml_str(&raw)?;
        debug!(path = %path.display(), memories = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Serialize back to the catalog document format.
    ///
    /// # Errors
    ///
    /// Returns [`FlyoverError::Catalog`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, FlyoverError> {
        let doc = CatalogDocument {
            memories: self.records.clone(),
        };
        toml::to_string_pretty(&doc)
            .map_err(|e| FlyoverError::Catalog(format!("failed to serialize catalog: {e}")))
    }

    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemoryRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record from `year`, in catalog order.  Empty when the year has
    /// no memories.
    pub fn for_year(&self, year: Year) -> Vec<MemoryRecord> {
        self.records
            .iter()
            .filter(|m| m.year == year)
            .cloned()
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a MemoryRecord;
    type IntoIter = std::slice::Iter<'a, MemoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: Year, caption: &str) -> MemoryRecord {
        MemoryRecord::new(LngLat::new(0.0, 0.0), "p.jpg", caption, year)
    }

    #[test]
    fn for_year_preserves_catalog_order() {
        let catalog = Catalog::new(vec![
            record(2022, "c1"),
            record(2023, "c2"),
            record(2022, "c3"),
        ])
        .unwrap();
        let captions: Vec<_> = catalog
            .for_year(2022)
            .into_iter()
            .map(|m| m.caption)
            .collect();
        assert_eq!(captions, vec!["c1", "c3"]);
    }

    #[test]
    fn for_unknown_year_is_empty() {
        assert!(Catalog::builtin().for_year(1900).is_empty());
    }

    #[test]
    fn duplicate_photos_are_kept() {
        let catalog = Catalog::builtin();
        let london_shots = catalog.iter().filter(|m| m.photo == "london.jpg").count();
        assert_eq!(london_shots, 2);
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        assert!(Catalog::new(catalog.records().to_vec()).is_ok());
        assert!(!catalog.is_empty());
    }

    #[test]
    fn out_of_range_coordinates_rejected() {
        let bad = MemoryRecord::new(LngLat::new(200.0, 0.0), "p.jpg", "nowhere", 2020);
        let err = Catalog::new(vec![record(2020, "ok"), bad]).unwrap_err();
        assert!(matches!(err, FlyoverError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn parses_toml_document() {
        let catalog = Catalog::from_toml_str(
            r#"
            [[memory]]
            place = "Jerusalem"
            coordinates = [35.235, 31.776]
            photo = "jerusalem.jpg"
            caption = "Mount of Olives, 2023"
            year = 2023

            [[memory]]
            coordinates = [-0.1276, 51.5072]
            photo = "london.jpg"
            caption = "A rainy afternoon in London"
            year = 2022
            "#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0].place.as_deref(), Some("Jerusalem"));
        assert_eq!(catalog.records()[1].coordinates, LngLat::new(-0.1276, 51.5072));
        assert!(catalog.records()[1].place.is_none());
    }

    #[test]
    fn empty_document_is_empty_catalog() {
        let catalog = Catalog::from_toml_str("").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn negative_year_is_a_parse_error() {
        let err = Catalog::from_toml_str(
            r#"
            [[memory]]
            coordinates = [0.0, 0.0]
            photo = "p.jpg"
            caption = "c"
            year = -5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, FlyoverError::Catalog(_)));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("memories.toml");
        let original = Catalog::builtin();
        fs::write(&path, original.to_toml_string().unwrap()).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn load_missing_file_is_catalog_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let err = Catalog::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, FlyoverError::Catalog(_)));
    }
}
