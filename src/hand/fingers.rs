//! Per-finger extended/folded determination from landmark geometry.
//!
//! Index, middle, ring and pinky use a vertical test (tip above the PIP
//! joint) combined with a reach test (tip farther from the knuckle than
//! the PIP joint). The thumb moves laterally, so it is judged by the
//! horizontal displacement of its tip in the direction given by the
//! hand's handedness.

use super::error::GestureError;
use super::landmarks::{Finger, HandLandmark, HandObservation, LandmarkPoint};

// ── Finger states ──────────────────────────────────────────

/// Extended (`true`) or folded (`false`) state of each finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FingerStates {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    pub fn is_extended(&self, finger: Finger) -> bool {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }

    pub fn extended_count(&self) -> usize {
        Finger::ALL.iter().filter(|f| self.is_extended(**f)).count()
    }

    /// Build from a bit set where bit `i` is `Finger::ALL[i]`.
    /// Bits above the fifth are ignored.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            thumb: bits & 0b00001 != 0,
            index: bits & 0b00010 != 0,
            middle: bits & 0b00100 != 0,
            ring: bits & 0b01000 != 0,
            pinky: bits & 0b10000 != 0,
        }
    }

    pub fn bits(&self) -> u8 {
        Finger::ALL
            .iter()
            .enumerate()
            .filter(|(_, f)| self.is_extended(**f))
            .fold(0, |acc, (i, _)| acc | (1 << i))
    }

    /// `(finger, extended)` pairs in thumb-to-pinky order.
    pub fn iter(&self) -> impl Iterator<Item = (Finger, bool)> + '_ {
        Finger::ALL.iter().map(move |f| (*f, self.is_extended(*f)))
    }

    /// Render as an s-expression plist, e.g. `(:thumb nil :index t ...)`.
    pub fn to_sexp(&self) -> String {
        let fields: Vec<String> = self
            .iter()
            .map(|(f, ext)| format!(":{} {}", f.as_str(), if ext { "t" } else { "nil" }))
            .collect();
        format!("({})", fields.join(" "))
    }
}

// ── Config ─────────────────────────────────────────────────

/// Reach test applied to index, middle, ring and pinky.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceTest {
    /// `|MCP→TIP| > |MCP→PIP|`.
    Absolute,
    /// `|MCP→TIP| > min_ratio * |MCP→PIP|`.
    Ratio { min_ratio: f32 },
}

/// Tunable thresholds for finger state extraction.
///
/// All distances are in landmark units (normalized image space for
/// typical detectors).
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Minimum outward displacement of the thumb tip past the IP and MCP
    /// joints for the thumb to count as extended.
    pub thumb_margin: f32,
    /// Reach test for the four non-thumb fingers.
    pub distance_test: DistanceTest,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            thumb_margin: 0.05,
            distance_test: DistanceTest::Absolute,
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        if !self.thumb_margin.is_finite() || self.thumb_margin < 0.0 {
            return Err(GestureError::invalid_config(format!(
                "thumb margin must be a finite non-negative number, got {}",
                self.thumb_margin
            )));
        }
        if let DistanceTest::Ratio { min_ratio } = self.distance_test {
            if !min_ratio.is_finite() || min_ratio <= 0.0 {
                return Err(GestureError::invalid_config(format!(
                    "distance ratio must be a finite positive number, got {}",
                    min_ratio
                )));
            }
        }
        Ok(())
    }

    /// Generate s-expression for the stream protocol.
    pub fn config_sexp(&self) -> String {
        let ratio = match self.distance_test {
            DistanceTest::Absolute => "nil".to_string(),
            DistanceTest::Ratio { min_ratio } => format!("{:.3}", min_ratio),
        };
        format!(
            "(:thumb-margin {:.3} :distance-ratio {})",
            self.thumb_margin, ratio,
        )
    }
}

// ── Extractor ──────────────────────────────────────────────

/// Computes [`FingerStates`] from a single hand observation.
#[derive(Debug, Clone, Default)]
pub struct FingerStateExtractor {
    pub config: ExtractorConfig,
}

impl FingerStateExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, GestureError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Finger states of a validated observation.
    pub fn compute(&self, obs: &HandObservation) -> FingerStates {
        FingerStates {
            thumb: self.thumb_extended(obs),
            index: self.finger_extended(obs, Finger::Index),
            middle: self.finger_extended(obs, Finger::Middle),
            ring: self.finger_extended(obs, Finger::Ring),
            pinky: self.finger_extended(obs, Finger::Pinky),
        }
    }

    /// Validate raw detector output, then compute finger states.
    pub fn compute_raw(
        &self,
        points: &[LandmarkPoint],
        handedness: Option<&str>,
    ) -> Result<FingerStates, GestureError> {
        let obs = HandObservation::from_raw(points, handedness)?;
        Ok(self.compute(&obs))
    }

    fn finger_extended(&self, obs: &HandObservation, finger: Finger) -> bool {
        let [mcp, pip, _dip, tip] = finger.joints().map(|j| *obs.point(j));
        tip_above_pip(&tip, &pip) && self.reaches_past_pip(&mcp, &pip, &tip)
    }

    fn reaches_past_pip(
        &self,
        mcp: &LandmarkPoint,
        pip: &LandmarkPoint,
        tip: &LandmarkPoint,
    ) -> bool {
        let to_tip = mcp.distance_2d(tip);
        let to_pip = mcp.distance_2d(pip);
        match self.config.distance_test {
            DistanceTest::Absolute => to_tip > to_pip,
            DistanceTest::Ratio { min_ratio } => to_tip > min_ratio * to_pip,
        }
    }

    fn thumb_extended(&self, obs: &HandObservation) -> bool {
        let sign = obs.handedness().outward_sign();
        let tip = obs.point(HandLandmark::ThumbTip).x;
        let past = |joint: HandLandmark| sign * (tip - obs.point(joint).x) > self.config.thumb_margin;
        past(HandLandmark::ThumbIp) && past(HandLandmark::ThumbMcp)
    }
}

/// Tip is higher in the image than the PIP joint (y grows downward).
fn tip_above_pip(tip: &LandmarkPoint, pip: &LandmarkPoint) -> bool {
    tip.y < pip.y
}

// ── Tests ──────────────────────────────────────────────────
