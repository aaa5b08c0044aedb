//! Hand pose classification core.
//!
//! Provides:
//! - `landmarks`: 21-point hand observations and handedness
//! - `fingers`: extended/folded state per finger
//! - `gesture`: gesture labels from finger states
//! - `smoothing`: optional per-hand label smoothing across frames
//!
//! Everything here except `smoothing` is pure and holds no state between
//! calls.

pub mod error;
pub mod fingers;
pub mod gesture;
pub mod landmarks;
pub mod smoothing;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::GestureError;
pub use fingers::{DistanceTest, ExtractorConfig, FingerStateExtractor, FingerStates};
pub use gesture::{Classification, GestureClassifier, GestureLabel, GesturePipeline};
pub use landmarks::{Finger, HandLandmark, HandObservation, Handedness, LandmarkPoint, LANDMARK_COUNT};
pub use smoothing::LabelSmoother;
