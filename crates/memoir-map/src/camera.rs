//! Generic `Camera` trait for the map view animation primitive.

use memoir_types::LngLat;
use serde::{Deserialize, Serialize};

use crate::MapError;

/// Target view for a camera flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlyTo {
    pub center: LngLat,
    pub zoom: f64,
    /// Tilt in degrees from straight down.
    pub pitch: f64,
    /// Heading in degrees, `[0, 360)`.
    pub bearing: f64,
    /// Animation speed factor; `1.0` is the engine default.
    pub speed: f64,
    /// Zoom-out curve of the flight path.
    pub curve: f64,
    /// Animate even when the viewer prefers reduced motion.  A later flight
    /// always interrupts an earlier one.
    pub essential: bool,
}

/// A map camera that can be flown to a new view.
///
/// `fly_to` starts the animation and returns immediately; callers never wait
/// for it to finish.
pub trait Camera: Send {
    /// Begin animating toward `target`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Unavailable`] if the engine cannot accept the
    /// command (e.g. the map is not loaded yet).
    fn fly_to(&mut self, target: &FlyTo) -> Result<(), MapError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingCamera {
        flights: Vec<FlyTo>,
    }

    impl Camera for RecordingCamera {
        fn fly_to(&mut self, target: &FlyTo) -> Result<(), MapError> {
            self.flights.push(target.clone());
            Ok(())
        }
    }

    #[test]
    fn camera_records_flight() {
        let mut cam = RecordingCamera::default();
        let target = FlyTo {
            center: LngLat::new(35.235, 31.776),
            zoom: 14.0,
            pitch: 60.0,
            bearing: 90.0,
            speed: 0.6,
            curve: 1.4,
            essential: true,
        };
        cam.fly_to(&target).unwrap();
        assert_eq!(cam.flights.len(), 1);
        assert_eq!(cam.flights[0].center, LngLat::new(35.235, 31.776));
    }

    #[test]
    fn fly_to_serializes_center_as_array() {
        let target = FlyTo {
            center: LngLat::new(-0.1276, 51.5072),
            zoom: 14.0,
            pitch: 60.0,
            bearing: 0.0,
            speed: 0.6,
            curve: 1.4,
            essential: true,
        };
        let json = serde_json::to_string(&target).unwrap();
        assert!(json.contains(r#""center":[-0.1276,51.5072]"#));
    }
}
