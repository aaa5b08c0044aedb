//! Hand landmark data structures.
//!
//! Models the 21-point hand layout reported by image-space landmark
//! detectors (wrist, four thumb joints, four joints per finger).
//! Coordinates are image space with y growing downward, usually
//! normalized to [0, 1].

use std::fmt;
use std::str::FromStr;

use super::error::GestureError;

// ── Landmark definitions ───────────────────────────────────

/// The 21 anatomical hand landmarks, in detector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    pub const ALL: [HandLandmark; LANDMARK_COUNT] = [
        Self::Wrist,
        Self::ThumbCmc,
        Self::ThumbMcp,
        Self::ThumbIp,
        Self::ThumbTip,
        Self::IndexMcp,
        Self::IndexPip,
        Self::IndexDip,
        Self::IndexTip,
        Self::MiddleMcp,
        Self::MiddlePip,
        Self::MiddleDip,
        Self::MiddleTip,
        Self::RingMcp,
        Self::RingPip,
        Self::RingDip,
        Self::RingTip,
        Self::PinkyMcp,
        Self::PinkyPip,
        Self::PinkyDip,
        Self::PinkyTip,
    ];

    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for the stream protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

// ── Fingers ────────────────────────────────────────────────

/// The five fingers of a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Self::Thumb,
        Self::Index,
        Self::Middle,
        Self::Ring,
        Self::Pinky,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thumb => "thumb",
            Self::Index => "index",
            Self::Middle => "middle",
            Self::Ring => "ring",
            Self::Pinky => "pinky",
        }
    }

    /// The finger's four landmarks, base to tip.
    ///
    /// Thumb: CMC, MCP, IP, TIP. Others: MCP, PIP, DIP, TIP.
    pub fn joints(&self) -> [HandLandmark; 4] {
        use HandLandmark::*;
        match self {
            Self::Thumb => [ThumbCmc, ThumbMcp, ThumbIp, ThumbTip],
            Self::Index => [IndexMcp, IndexPip, IndexDip, IndexTip],
            Self::Middle => [MiddleMcp, MiddlePip, MiddleDip, MiddleTip],
            Self::Ring => [RingMcp, RingPip, RingDip, RingTip],
            Self::Pinky => [PinkyMcp, PinkyPip, PinkyDip, PinkyTip],
        }
    }
}

// ── Handedness ─────────────────────────────────────────────

/// Which hand, as labeled by the upstream detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Sign of the outward thumb direction along the image x axis.
    pub fn outward_sign(&self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Handedness {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        if label.eq_ignore_ascii_case("left") {
            Ok(Self::Left)
        } else if label.eq_ignore_ascii_case("right") {
            Ok(Self::Right)
        } else {
            Err(GestureError::MissingHandedness {
                found: Some(s.to_string()),
            })
        }
    }
}

// ── Landmark point ─────────────────────────────────────────

/// A single landmark position in image space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    /// Relative depth, when the detector reports one.
    pub z: Option<f32>,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_depth(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Planar (x, y) distance to another point. Depth is ignored.
    pub fn distance_2d(&self, other: &LandmarkPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f32::is_finite)
    }
}

// ── Hand observation ───────────────────────────────────────

/// One detected hand in one frame: 21 landmarks plus handedness.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    points: [LandmarkPoint; LANDMARK_COUNT],
    handedness: Handedness,
}

impl HandObservation {
    /// Build an observation from exactly 21 finite points.
    pub fn new(points: &[LandmarkPoint], handedness: Handedness) -> Result<Self, GestureError> {
        let points = validate_points(points)?;
        Ok(Self { points, handedness })
    }

    /// Build an observation from detector output where the handedness
    /// label is free text and may be absent.
    ///
    /// Landmarks are validated before the label.
    pub fn from_raw(points: &[LandmarkPoint], handedness: Option<&str>) -> Result<Self, GestureError> {
        let points = validate_points(points)?;
        let handedness: Handedness = handedness
            .ok_or(GestureError::MissingHandedness { found: None })?
            .parse()?;
        Ok(Self { points, handedness })
    }

    pub fn point(&self, landmark: HandLandmark) -> &LandmarkPoint {
        &self.points[landmark.index()]
    }

    pub fn points(&self) -> &[LandmarkPoint; LANDMARK_COUNT] {
        &self.points
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }
}

fn validate_points(points: &[LandmarkPoint]) -> Result<[LandmarkPoint; LANDMARK_COUNT], GestureError> {
    let points: [LandmarkPoint; LANDMARK_COUNT] = points.try_into().map_err(|_| {
        GestureError::malformed(format!(
            "expected {} landmarks, got {}",
            LANDMARK_COUNT,
            points.len()
        ))
    })?;

    if let Some(i) = points.iter().position(|p| !p.is_finite()) {
        return Err(GestureError::malformed(format!(
            "landmark {} ({}) has non-finite coordinates",
            i,
            HandLandmark::ALL[i].as_str()
        )));
    }

    Ok(points)
}

// ── Tests ──────────────────────────────────────────────────
