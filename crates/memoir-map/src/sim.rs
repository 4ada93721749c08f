//! In-process map surface for CI/CD testing without a rendering engine.
//!
//! [`SimMap`] implements [`Camera`], [`OverlaySurface`] and [`StyleSink`] and
//! records every call into a shared [`SimLog`].  Clones share the same log,
//! so a test can hand one clone to the flyover and keep another to inspect
//! what happened.
//!
//! # Example
//!
//! ```rust
//! use memoir_map::sim::SimMap;
//! use memoir_map::{Camera, FlyTo};
//! use memoir_types::LngLat;
//!
//! let sim = SimMap::new();
//! let mut camera = sim.clone();
//! camera
//!     .fly_to(&FlyTo {
//!         center: LngLat::new(-0.1276, 51.5072),
//!         zoom: 14.0,
//!         pitch: 60.0,
//!         bearing: 12.0,
//!         speed: 0.6,
//!         curve: 1.4,
//!         essential: true,
//!     })
//!     .expect("sim flight must succeed");
//!
//! assert_eq!(sim.log().flights.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use memoir_types::LngLat;
use tracing::debug;

use crate::MapError;
use crate::camera::{Camera, FlyTo};
use crate::overlay::{OverlayHandle, OverlaySurface, PopupOptions};
use crate::style::{MapStyle, StyleSink};

/// An overlay as the simulated surface saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct SimOverlay {
    pub handle: OverlayHandle,
    pub center: LngLat,
    pub html: String,
    pub options: PopupOptions,
}

/// Everything a [`SimMap`] has been asked to do.
#[derive(Debug, Clone, Default)]
pub struct SimLog {
    /// Every accepted camera flight, oldest first.
    pub flights: Vec<FlyTo>,
    /// Where the camera was last sent; `None` until the first flight.
    pub camera_center: Option<LngLat>,
    /// Overlays currently on screen, keyed by handle.
    pub live_overlays: BTreeMap<OverlayHandle, SimOverlay>,
    /// Every overlay ever created, oldest first.
    pub created: Vec<SimOverlay>,
    /// Handles in the order they were disposed.
    pub disposed: Vec<OverlayHandle>,
    /// Largest number of overlays that were on screen at once.
    pub max_live_overlays: usize,
    /// `(photo, caption)` currently shown fullscreen.
    pub fullscreen: Option<(String, String)>,
    /// Every fullscreen presentation opened, oldest first.
    pub fullscreen_history: Vec<String>,
    /// Styles applied, normally exactly one.
    pub styles: Vec<MapStyle>,
}

impl SimLog {
    pub fn live_overlay_count(&self) -> usize {
        self.live_overlays.len()
    }

    /// The single visible overlay, if exactly one is on screen.
    pub fn visible_overlay(&self) -> Option<&SimOverlay> {
        match self.live_overlays.len() {
            1 => self.live_overlays.values().next(),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    log: SimLog,
    next_handle: u64,
    camera_offline: bool,
    overlays_offline: bool,
}

/// Headless map surface.  Always succeeds unless a failure is injected with
/// [`set_camera_offline`][Self::set_camera_offline] or
/// [`set_overlays_offline`][Self::set_overlays_offline].
#[derive(Debug, Clone, Default)]
pub struct SimMap {
    state: Arc<Mutex<SimState>>,
}

impl SimMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn log(&self) -> SimLog {
        self.lock().log.clone()
    }

    /// Make every subsequent `fly_to` fail with [`MapError::Unavailable`].
    pub fn set_camera_offline(&self, offline: bool) {
        self.lock().camera_offline = offline;
    }

    /// Make every subsequent `create_overlay` and `show_fullscreen` fail.
    pub fn set_overlays_offline(&self, offline: bool) {
        self.lock().overlays_offline = offline;
    }

    // A panicking test thread must not hide the log from the others.
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Camera for SimMap {
    fn fly_to(&mut self, target: &FlyTo) -> Result<(), MapError> {
        let mut state = self.lock();
        if state.camera_offline {
            return Err(MapError::Unavailable("simulated camera offline".to_string()));
        }
        debug!(center = %target.center, bearing = target.bearing, "sim fly_to");
        state.log.camera_center = Some(target.center);
        state.log.flights.push(target.clone());
        Ok(())
    }
}

impl OverlaySurface for SimMap {
    fn create_overlay(
        &mut self,
        center: LngLat,
        html: &str,
        options: &PopupOptions,
    ) -> Result<OverlayHandle, MapError> {
        let mut state = self.lock();
        if state.overlays_offline {
            return Err(MapError::Unavailable("simulated overlays offline".to_string()));
        }
        state.next_handle += 1;
        let overlay = SimOverlay {
            handle: OverlayHandle(state.next_handle),
            center,
            html: html.to_string(),
            options: options.clone(),
        };
        let log = &mut state.log;
        log.live_overlays.insert(overlay.handle, overlay.clone());
        log.max_live_overlays = log.max_live_overlays.max(log.live_overlays.len());
        log.created.push(overlay.clone());
        Ok(overlay.handle)
    }

    fn dispose(&mut self, handle: OverlayHandle) -> Result<(), MapError> {
        let mut state = self.lock();
        match state.log.live_overlays.remove(&handle) {
            Some(_) => {
                state.log.disposed.push(handle);
                Ok(())
            }
            None => Err(MapError::UnknownOverlay(handle.0)),
        }
    }

    fn show_fullscreen(&mut self, photo: &str, caption: &str) -> Result<(), MapError> {
        let mut state = self.lock();
        if state.overlays_offline {
            return Err(MapError::Unavailable("simulated overlays offline".to_string()));
        }
        state.log.fullscreen = Some((photo.to_string(), caption.to_string()));
        state.log.fullscreen_history.push(photo.to_string());
        Ok(())
    }

    fn hide_fullscreen(&mut self) {
        self.lock().log.fullscreen = None;
    }
}

impl StyleSink for SimMap {
    fn apply_style(&mut self, style: &MapStyle) -> Result<(), MapError> {
        style.validate()?;
        self.lock().log.styles.push(style.clone());
        Ok(())
    }
}
