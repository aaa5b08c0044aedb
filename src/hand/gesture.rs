//! Gesture recognition from finger states.
//!
//! Maps the five extended/folded flags to one of four static gestures
//! (open palm, fist, peace sign, thumbs up). Anything else is
//! `Unrecognized`, which is a normal result and not an error.

use super::error::GestureError;
use super::fingers::{FingerStateExtractor, FingerStates};
use super::landmarks::{HandObservation, LandmarkPoint};

// ── Gesture labels ─────────────────────────────────────────

/// Recognized gesture labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    /// All five fingers extended.
    OpenPalm,
    /// Index through pinky folded, thumb within its lateral margin.
    Fist,
    /// Index and middle extended, ring and pinky folded.
    PeaceSign,
    /// Thumb extended outward, others folded.
    ThumbsUp,
    /// No known pattern matched.
    Unrecognized,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 5] = [
        Self::OpenPalm,
        Self::Fist,
        Self::PeaceSign,
        Self::ThumbsUp,
        Self::Unrecognized,
    ];

    /// String representation for the stream protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenPalm => "open-palm",
            Self::Fist => "fist",
            Self::PeaceSign => "peace-sign",
            Self::ThumbsUp => "thumbs-up",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Overlay text for display next to the hand.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenPalm => "Open Palm",
            Self::Fist => "Fist",
            Self::PeaceSign => "Peace",
            Self::ThumbsUp => "Thumbs Up",
            Self::Unrecognized => "Unknown",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

// ── Classifier ─────────────────────────────────────────────

/// Maps [`FingerStates`] to a [`GestureLabel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GestureClassifier;

impl GestureClassifier {
    /// Classify finger states. Rules are checked in priority order and
    /// the first match wins.
    pub fn classify(states: FingerStates) -> GestureLabel {
        let FingerStates {
            thumb,
            index,
            middle,
            ring,
            pinky,
        } = states;
        let four_folded = !index && !middle && !ring && !pinky;

        if thumb && index && middle && ring && pinky {
            return GestureLabel::OpenPalm;
        }

        // A thumb held out past the margin turns a fist into thumbs up.
        if four_folded && !thumb {
            return GestureLabel::Fist;
        }

        if index && middle && !ring && !pinky {
            return GestureLabel::PeaceSign;
        }

        if thumb && four_folded {
            return GestureLabel::ThumbsUp;
        }

        GestureLabel::Unrecognized
    }
}

// ── Pipeline ───────────────────────────────────────────────

/// Finger states together with the gesture derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub states: FingerStates,
    pub label: GestureLabel,
}

/// Landmarks to gesture in one call.
#[derive(Debug, Clone, Default)]
pub struct GesturePipeline {
    pub extractor: FingerStateExtractor,
}

impl GesturePipeline {
    pub fn new(extractor: FingerStateExtractor) -> Self {
        Self { extractor }
    }

    pub fn classify(&self, obs: &HandObservation) -> Classification {
        let states = self.extractor.compute(obs);
        Classification {
            states,
            label: GestureClassifier::classify(states),
        }
    }

    /// Validate raw detector output, then classify it.
    pub fn classify_raw(
        &self,
        points: &[LandmarkPoint],
        handedness: Option<&str>,
    ) -> Result<Classification, GestureError> {
        let obs = HandObservation::from_raw(points, handedness)?;
        Ok(self.classify(&obs))
    }
}

// ── Tests ──────────────────────────────────────────────────
