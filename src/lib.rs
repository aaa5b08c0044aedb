//! handsign — static hand-gesture classification from hand landmarks.
//!
//! Classifies one hand per frame as open palm, fist, peace sign or
//! thumbs up from 21 image-space landmarks and a handedness label.
//! Landmark detection, rendering and recording are left to other
//! processes, which talk to the `handsign` binary over the `ipc`
//! line protocol.

pub mod hand;
pub mod ipc;
pub mod state;

pub use hand::{
    FingerStateExtractor, FingerStates, GestureClassifier, GestureError, GestureLabel,
    GesturePipeline, HandObservation, Handedness, LandmarkPoint,
};
