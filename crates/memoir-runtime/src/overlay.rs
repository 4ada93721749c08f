//! [`OverlayManager`] – popup and fullscreen lifecycle.
//!
//! Owns every overlay the flyover puts on the map.  The popup for a memory is
//! created with [`show`][OverlayManager::show] and torn down with
//! [`destroy_all`][OverlayManager::destroy_all]; the sequencer calls
//! `destroy_all` immediately before each `show`, so at most one popup is on
//! screen at any time.
//!
//! The fullscreen presentation is a separate overlay with its own
//! [`open_fullscreen`][OverlayManager::open_fullscreen] /
//! [`close_fullscreen`][OverlayManager::close_fullscreen] pair.

use memoir_map::{MapError, OverlayHandle, OverlaySurface, PopupOptions};
use memoir_types::MemoryRecord;
use tracing::{debug, warn};

/// A popup currently owned by the manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveOverlay {
    pub handle: OverlayHandle,
    pub record: MemoryRecord,
}

/// Creates and destroys the photo popup and the fullscreen presentation.
pub struct OverlayManager {
    surface: Box<dyn OverlaySurface>,
    options: PopupOptions,
    shown: Vec<ActiveOverlay>,
    fullscreen: Option<MemoryRecord>,
}

impl OverlayManager {
    pub fn new(surface: Box<dyn OverlaySurface>) -> Self {
        Self {
            surface,
            options: PopupOptions::default(),
            shown: Vec::new(),
            fullscreen: None,
        }
    }

    /// Override the popup options (builder-style).
    pub fn with_options(mut self, options: PopupOptions) -> Self {
        self.options = options;
        self
    }

    /// Anchor the popup for `record` at its coordinates.
    ///
    /// Does not remove earlier popups; callers destroy them first.
    ///
    /// # Errors
    ///
    /// Propagates the surface's [`MapError`]; nothing is tracked on failure.
    pub fn show(&mut self, record: &MemoryRecord) -> Result<OverlayHandle, MapError> {
        let html = render_popup_html(record);
        let handle = self
            .surface
            .create_overlay(record.coordinates, &html, &self.options)?;
        debug!(%handle, photo = %record.photo, "popup shown");
        self.shown.push(ActiveOverlay {
            handle,
            record: record.clone(),
        });
        Ok(handle)
    }

    /// Dispose every popup this manager created.
    ///
    /// Disposal failures are logged; the popup is forgotten either way so a
    /// misbehaving surface cannot make the manager hold stale handles.
    pub fn destroy_all(&mut self) {
        for overlay in self.shown.drain(..) {
            if let Err(e) = self.surface.dispose(overlay.handle) {
                warn!(handle = %overlay.handle, error = %e, "failed to dispose popup");
            }
        }
    }

    /// The most recently shown popup that has not been destroyed.
    pub fn visible(&self) -> Option<&ActiveOverlay> {
        self.shown.last()
    }

    /// Number of popups currently on screen.
    pub fn overlay_count(&self) -> usize {
        self.shown.len()
    }

    /// Present `record`'s photo fullscreen, replacing any presentation that
    /// is already open.
    ///
    /// # Errors
    ///
    /// Propagates the surface's [`MapError`]; the manager then reports no
    /// fullscreen presentation.
    pub fn open_fullscreen(&mut self, record: &MemoryRecord) -> Result<(), MapError> {
        if self.fullscreen.take().is_some() {
            self.surface.hide_fullscreen();
        }
        self.surface.show_fullscreen(&record.photo, &record.caption)?;
        self.fullscreen = Some(record.clone());
        Ok(())
    }

    /// Hide the fullscreen presentation and return the record it showed.
    /// Returns `None` when nothing was open.
    pub fn close_fullscreen(&mut self) -> Option<MemoryRecord> {
        let record = self.fullscreen.take()?;
        self.surface.hide_fullscreen();
        Some(record)
    }

    pub fn fullscreen(&self) -> Option<&MemoryRecord> {
        self.fullscreen.as_ref()
    }
}

/// HTML fragment for a memory popup: the photo above its caption.
pub fn render_popup_html(record: &MemoryRecord) -> String {
    format!(
        concat!(
            r#"<div style="text-align:center;">"#,
            r#"<img src="{}" style="width:200px;border-radius:10px;">"#,
            "<p>{}</p>",
            "</div>",
        ),
        escape_html(&record.photo),
        escape_html(&record.caption),
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoir_map::SimMap;
    use memoir_types::LngLat;

    fn record(caption: &str) -> MemoryRecord {
        MemoryRecord::new(LngLat::new(35.235, 31.776), "jerusalem.jpg", caption, 2023)
    }

    fn manager() -> (OverlayManager, SimMap) {
        let sim = SimMap::new();
        (OverlayManager::new(Box::new(sim.clone())), sim)
    }

    #[test]
    fn popup_html_contains_photo_and_caption() {
        let html = render_popup_html(&record("Mount of Olives, 2023"));
        assert!(html.contains(r#"<img src="jerusalem.jpg""#));
        assert!(html.contains("<p>Mount of Olives, 2023</p>"));
    }

    #[test]
    fn popup_html_escapes_markup() {
        let mut rec = record("<b>Fish & \"chips\"</b>");
        rec.photo = "a\"onerror=\"x.jpg".to_string();
        let html = render_popup_html(&rec);
        assert!(html.contains("&lt;b&gt;Fish &amp; &quot;chips&quot;&lt;/b&gt;"));
        assert!(!html.contains("onerror=\"x"));
    }

    #[test]
    fn show_anchors_popup_at_record_coordinates() {
        let (mut overlays, sim) = manager();
        let handle = overlays.show(&record("c1")).unwrap();
        let log = sim.log();
        let popup = log.visible_overlay().expect("one popup");
        assert_eq!(popup.handle, handle);
        assert_eq!(popup.center, LngLat::new(35.235, 31.776));
        assert_eq!(popup.options, PopupOptions::default());
        assert_eq!(overlays.visible().map(|o| o.handle), Some(handle));
    }

    #[test]
    fn destroy_all_then_show_keeps_one_popup() {
        let (mut overlays, sim) = manager();
        overlays.show(&record("c1")).unwrap();
        overlays.destroy_all();
        overlays.show(&record("c2")).unwrap();
        assert_eq!(overlays.overlay_count(), 1);
        assert_eq!(sim.log().live_overlay_count(), 1);
        assert_eq!(sim.log().max_live_overlays, 1);
        assert_eq!(overlays.visible().map(|o| o.record.caption.as_str()), Some("c2"));
    }

    #[test]
    fn failed_show_tracks_nothing() {
        let (mut overlays, sim) = manager();
        sim.set_overlays_offline(true);
        assert!(overlays.show(&record("c1")).is_err());
        assert_eq!(overlays.overlay_count(), 0);
        assert!(overlays.visible().is_none());
    }

    #[test]
    fn fullscreen_pair() {
        let (mut overlays, sim) = manager();
        assert!(overlays.close_fullscreen().is_none());

        overlays.open_fullscreen(&record("c1")).unwrap();
        assert_eq!(overlays.fullscreen().map(|r| r.caption.as_str()), Some("c1"));
        assert!(sim.log().fullscreen.is_some());

        let closed = overlays.close_fullscreen().expect("was open");
        assert_eq!(closed.caption, "c1");
        assert!(sim.log().fullscreen.is_none());
        assert!(overlays.fullscreen().is_none());
    }

    #[test]
    fn fullscreen_is_independent_of_popups() {
        let (mut overlays, _sim) = manager();
        overlays.show(&record("c1")).unwrap();
        overlays.open_fullscreen(&record("c1")).unwrap();
        overlays.destroy_all();
        assert!(overlays.fullscreen().is_some());
        assert_eq!(overlays.overlay_count(), 0);
    }
}
