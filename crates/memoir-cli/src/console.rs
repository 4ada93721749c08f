//! Terminal map surface and event narration.
//!
//! [`ConsoleMap`] stands in for a rendering engine: camera flights, popups
//! and the fullscreen photo are printed as coloured one-liners.
//! [`narrate`] follows the event bus and prints what the viewer would see.

use std::collections::BTreeMap;

use colored::Colorize;
use memoir_map::{Camera, FlyTo, MapError, MapStyle, OverlayHandle, OverlaySurface, PopupOptions, StyleSink};
use memoir_types::{Event, EventPayload, LngLat};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// A map surface that prints instead of rendering.
#[derive(Debug, Default)]
pub struct ConsoleMap {
    next_handle: u64,
    live: BTreeMap<OverlayHandle, LngLat>,
}

impl ConsoleMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Camera for ConsoleMap {
    fn fly_to(&mut self, target: &FlyTo) -> Result<(), MapError> {
        println!("  {} {}", "✈".cyan(), describe_flight(target).dimmed());
        Ok(())
    }
}

impl OverlaySurface for ConsoleMap {
    fn create_overlay(
        &mut self,
        center: LngLat,
        _html: &str,
        options: &PopupOptions,
    ) -> Result<OverlayHandle, MapError> {
        self.next_handle += 1;
        let handle = OverlayHandle(self.next_handle);
        self.live.insert(handle, center);
        debug!(%handle, %center, offset = options.offset, "console popup");
        Ok(handle)
    }

    fn dispose(&mut self, handle: OverlayHandle) -> Result<(), MapError> {
        self.live
            .remove(&handle)
            .map(|_| ())
            .ok_or(MapError::UnknownOverlay(handle.0))
    }

    fn show_fullscreen(&mut self, photo: &str, caption: &str) -> Result<(), MapError> {
        println!();
        println!("  {}", "┌─ fullscreen ─────────────────────────".bold());
        println!("  │ {}", photo.bold());
        println!("  │ {}", caption.italic());
        println!("  {}", "└──────────────────────────────────────".bold());
        println!("  Type {} to return to the flyover.", "/close".bold().cyan());
        Ok(())
    }

    fn hide_fullscreen(&mut self) {
        debug!("console fullscreen hidden");
    }
}

impl StyleSink for ConsoleMap {
    fn apply_style(&mut self, style: &MapStyle) -> Result<(), MapError> {
        style.validate()?;
        println!("  Map style : {}", style.style_url.dimmed());
        if let Some(terrain) = &style.terrain {
            println!(
                "  Terrain   : {} ×{}",
                terrain.id.dimmed(),
                terrain.exaggeration
            );
        }
        if let Some(buildings) = &style.buildings {
            println!(
                "  Buildings : {} from zoom {}",
                buildings.id.dimmed(),
                buildings.min_zoom
            );
        }
        Ok(())
    }
}

/// One-line description of a camera flight.
pub fn describe_flight(target: &FlyTo) -> String {
    format!(
        "flying to {} zoom {:.1} pitch {:.0}° bearing {:.0}°",
        target.center, target.zoom, target.pitch, target.bearing
    )
}

/// Viewer-facing line for an event, or `None` for events the viewer does
/// not need to see.
pub fn describe_event(payload: &EventPayload) -> Option<String> {
    match payload {
        EventPayload::SessionStarted { year, memories: 0 } => {
            Some(format!("No memories for {year}."))
        }
        EventPayload::SessionStarted { year, memories } => {
            Some(format!("Flying through {year} ({memories} memories)"))
        }
        EventPayload::MemoryShown {
            caption,
            coordinates,
            ..
        } => Some(format!("{caption}  {coordinates}")),
        EventPayload::PlaybackPaused { year, .. } => Some(format!("Paused {year}.")),
        EventPayload::PlaybackResumed { year, .. } => Some(format!("Resumed {year}.")),
        EventPayload::SessionSuperseded { .. }
        | EventPayload::FullscreenOpened { .. }
        | EventPayload::FullscreenClosed { .. } => None,
    }
}

/// Print every bus event until the bus closes.
pub async fn narrate(mut events: broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = describe_event(&event.payload) {
                    let line = match event.payload {
                        EventPayload::MemoryShown { .. } => line.bold().to_string(),
                        _ => line.yellow().to_string(),
                    };
                    println!("  {line}");
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "narrator fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlays_are_tracked_until_disposed() {
        let mut map = ConsoleMap::new();
        let opts = PopupOptions::default();
        let a = map.create_overlay(LngLat::new(0.0, 0.0), "<p>a</p>", &opts).unwrap();
        let b = map.create_overlay(LngLat::new(1.0, 1.0), "<p>b</p>", &opts).unwrap();
        assert_ne!(a, b);
        map.dispose(a).unwrap();
        assert_eq!(map.dispose(a), Err(MapError::UnknownOverlay(a.0)));
        assert!(map.dispose(b).is_ok());
    }

    #[test]
    fn invalid_style_is_rejected() {
        let mut map = ConsoleMap::new();
        assert!(map.apply_style(&MapStyle::default()).is_ok());
        let bad = MapStyle {
            style_url: String::new(),
            ..MapStyle::default()
        };
        assert!(map.apply_style(&bad).is_err());
    }

    #[test]
    fn flight_description_names_the_destination() {
        let line = describe_flight(&FlyTo {
            center: LngLat::new(35.235, 31.776),
            zoom: 14.0,
            pitch: 60.0,
            bearing: 271.4,
            speed: 0.6,
            curve: 1.4,
            essential: true,
        });
        assert_eq!(
            line,
            "flying to [35.2350, 31.7760] zoom 14.0 pitch 60° bearing 271°"
        );
    }

    #[test]
    fn empty_year_and_memory_lines() {
        assert_eq!(
            describe_event(&EventPayload::SessionStarted {
                year: 1999,
                memories: 0
            })
            .as_deref(),
            Some("No memories for 1999.")
        );
        let shown = describe_event(&EventPayload::MemoryShown {
            year: 2023,
            index: 0,
            caption: "Mount of Olives, 2023".to_string(),
            coordinates: LngLat::new(35.235, 31.776),
        });
        assert!(shown.unwrap().starts_with("Mount of Olives, 2023"));
        assert!(
            describe_event(&EventPayload::SessionSuperseded { year: 2022 }).is_none()
        );
    }

    #[tokio::test]
    async fn narrator_stops_when_bus_closes() {
        let (tx, rx) = broadcast::channel(8);
        let task = tokio::spawn(narrate(rx));
        tx.send(Event::new(
            "test",
            EventPayload::PlaybackPaused {
                year: 2022,
                cursor: 1,
            },
        ))
        .unwrap();
        drop(tx);
        task.await.unwrap();
    }
}
