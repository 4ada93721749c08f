//! Map style, terrain and 3D building layer description.
//!
//! This is plain initialization data.  It is handed to a [`StyleSink`] once
//! when the map loads and has no runtime coupling to the flyover.

use memoir_types::LngLat;
use serde::{Deserialize, Serialize};

use crate::MapError;

/// Camera view the map opens on, before the first flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialView {
    pub center: LngLat,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            center: LngLat::new(0.0, 20.0),
            zoom: 1.5,
            pitch: 60.0,
            bearing: -45.0,
        }
    }
}

/// Raster elevation source used for terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSource {
    pub id: String,
    pub url: String,
    pub tile_size: u32,
    pub max_zoom: u8,
    /// Vertical exaggeration factor.
    pub exaggeration: f64,
}

impl Default for TerrainSource {
    fn default() -> Self {
        Self {
            id: "mapbox-dem".to_string(),
            url: "mapbox://mapbox.mapbox-terrain-dem-v1".to_string(),
            tile_size: 512,
            max_zoom: 14,
            exaggeration: 1.5,
        }
    }
}

/// Fill-extrusion layer for buildings.
///
/// Height and base are interpolated linearly from zero at `extrude_from_zoom`
/// to the feature's full value at `extrude_full_zoom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingLayer {
    pub id: String,
    pub source: String,
    pub source_layer: String,
    pub min_zoom: f64,
    pub color: String,
    pub opacity: f64,
    pub extrude_from_zoom: f64,
    pub extrude_full_zoom: f64,
}

impl Default for BuildingLayer {
    fn default() -> Self {
        Self {
            id: "3d-buildings".to_string(),
            source: "composite".to_string(),
            source_layer: "building".to_string(),
            min_zoom: 15.0,
            color: "#aaa".to_string(),
            opacity: 0.6,
            extrude_from_zoom: 15.0,
            extrude_full_zoom: 15.05,
        }
    }
}

/// Full style description applied at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapStyle {
    /// Base style URL (a non-satellite light style by default).
    pub style_url: String,
    pub initial_view: InitialView,
    /// `None` disables terrain.
    pub terrain: Option<TerrainSource>,
    /// `None` disables 3D buildings.
    pub buildings: Option<BuildingLayer>,
    /// Show the zoom/rotate navigation control.
    pub navigation_control: bool,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            style_url: "mapbox://styles/mapbox/light-v11".to_string(),
            initial_view: InitialView::default(),
            terrain: Some(TerrainSource::default()),
            buildings: Some(BuildingLayer::default()),
            navigation_control: true,
        }
    }
}

impl MapStyle {
    /// Check the values an engine would reject outright.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Unavailable`] describing the first bad field.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.style_url.trim().is_empty() {
            return Err(MapError::Unavailable("style_url is empty".to_string()));
        }
        if !self.initial_view.center.is_valid() {
            return Err(MapError::Unavailable(format!(
                "initial center {} is out of range",
                self.initial_view.center
            )));
        }
        if let Some(b) = &self.buildings {
            if !(0.0..=1.0).contains(&b.opacity) {
                return Err(MapError::Unavailable(format!(
                    "building opacity {} is outside 0..=1",
                    b.opacity
                )));
            }
            if b.extrude_full_zoom < b.extrude_from_zoom {
                return Err(MapError::Unavailable(
                    "building extrusion zoom range is inverted".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Something that consumes a [`MapStyle`] once, when the map loads.
pub trait StyleSink {
    /// Install base style, terrain and layers.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Unavailable`] if the engine rejects the style.
    fn apply_style(&mut self, style: &MapStyle) -> Result<(), MapError>;
}
