//! `memoir-map` – the mapping-engine boundary.
//!
//! The flyover never talks to a concrete map renderer.  It only sees the
//! three capabilities defined here, so the engine can be swapped (browser map,
//! console narrator, headless simulator) without touching playback logic.
//!
//! # Modules
//!
//! - [`camera`] – [`Camera`][camera::Camera]: fire-and-forget camera
//!   animation to a target view ([`FlyTo`][camera::FlyTo]).
//! - [`overlay`] – [`OverlaySurface`][overlay::OverlaySurface]: HTML popups
//!   anchored to a coordinate plus the fullscreen photo presentation.
//! - [`style`] – [`MapStyle`][style::MapStyle]: base style, terrain and 3D
//!   building layer description, consumed once at startup through
//!   [`StyleSink`][style::StyleSink].
//! - [`sim`] – [`SimMap`][sim::SimMap]: an in-process surface implementing
//!   all three traits and recording every call, for headless tests.

pub mod camera;
pub mod overlay;
pub mod sim;
pub mod style;

use thiserror::Error;

pub use camera::{Camera, FlyTo};
pub use overlay::{OverlayHandle, OverlaySurface, PopupOptions};
pub use sim::{SimLog, SimMap};
pub use style::{BuildingLayer, InitialView, MapStyle, StyleSink, TerrainSource};

/// Failures reported by a mapping engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    /// The engine (or the part of it being driven) cannot take commands.
    #[error("map surface unavailable: {0}")]
    Unavailable(String),

    /// A handle that the surface does not know about was passed in.
    #[error("unknown overlay handle {0}")]
    UnknownOverlay(u64),
}
