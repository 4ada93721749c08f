//! Generic `OverlaySurface` trait for anchored HTML popups and the
//! fullscreen photo presentation.

use memoir_types::LngLat;
use serde::{Deserialize, Serialize};

use crate::MapError;

/// Opaque handle to an overlay created by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverlayHandle(pub u64);

impl std::fmt::Display for OverlayHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// Presentation options for an anchored popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupOptions {
    /// Pixel distance between the anchor and the popup.
    pub offset: u32,
    pub close_button: bool,
    /// Dismiss the popup when the map itself is clicked.
    pub close_on_click: bool,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            offset: 25,
            close_button: false,
            close_on_click: false,
        }
    }
}

/// A surface that can anchor HTML fragments to map coordinates and present a
/// single photo fullscreen.
///
/// Popups stay up until [`dispose`][Self::dispose] is called with their
/// handle.  The fullscreen presentation is independent of popups and has its
/// own show/hide pair.
pub trait OverlaySurface: Send {
    /// Anchor `html` at `center` and return a handle for later disposal.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Unavailable`] if the surface cannot render
    /// overlays.
    fn create_overlay(
        &mut self,
        center: LngLat,
        html: &str,
        options: &PopupOptions,
    ) -> Result<OverlayHandle, MapError>;

    /// Remove an overlay.  Disposing an unknown handle is an error.
    fn dispose(&mut self, handle: OverlayHandle) -> Result<(), MapError>;

    /// Show `photo` fullscreen with `caption` underneath.
    fn show_fullscreen(&mut self, photo: &str, caption: &str) -> Result<(), MapError>;

    /// Hide the fullscreen presentation.  No-op when nothing is shown.
    fn hide_fullscreen(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_popup_options_match_flyover_popups() {
        let opts = PopupOptions::default();
        assert_eq!(opts.offset, 25);
        assert!(!opts.close_button);
        assert!(!opts.close_on_click);
    }

    #[test]
    fn handle_display() {
        assert_eq!(OverlayHandle(7).to_string(), "overlay#7");
    }
}
