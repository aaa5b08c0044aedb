//! Synthetic hand poses for unit tests.

use super::landmarks::{HandLandmark, HandObservation, Handedness, LandmarkPoint, LANDMARK_COUNT};

/// Landmarks of an upright right hand with the requested fingers
/// extended, mirrored about x = 0.5 for a left hand.
///
/// `fingers` is index, middle, ring, pinky.
pub fn hand_points(handedness: Handedness, thumb: bool, fingers: [bool; 4]) -> Vec<LandmarkPoint> {
    let mut pts = vec![LandmarkPoint::default(); LANDMARK_COUNT];
    pts[HandLandmark::Wrist.index()] = LandmarkPoint::new(0.50, 0.90);

    pts[HandLandmark::ThumbCmc.index()] = LandmarkPoint::new(0.55, 0.85);
    pts[HandLandmark::ThumbMcp.index()] = LandmarkPoint::new(0.60, 0.80);
    pts[HandLandmark::ThumbIp.index()] = LandmarkPoint::new(0.62, 0.75);
    pts[HandLandmark::ThumbTip.index()] = if thumb {
        LandmarkPoint::new(0.70, 0.72)
    } else {
        LandmarkPoint::new(0.60, 0.74)
    };

    let bases = [
        (HandLandmark::IndexMcp, 0.45),
        (HandLandmark::MiddleMcp, 0.40),
        (HandLandmark::RingMcp, 0.35),
        (HandLandmark::PinkyMcp, 0.30),
    ];
    for ((mcp, x), extended) in bases.into_iter().zip(fingers) {
        let ys = if extended {
            [0.70, 0.60, 0.55, 0.50]
        } else {
            [0.70, 0.60, 0.64, 0.68]
        };
        for (offset, y) in ys.into_iter().enumerate() {
            pts[mcp.index() + offset] = LandmarkPoint::new(x, y);
        }
    }

    if handedness == Handedness::Left {
        for p in &mut pts {
            p.x = 1.0 - p.x;
        }
    }
    pts
}

pub fn observation(handedness: Handedness, thumb: bool, fingers: [bool; 4]) -> HandObservation {
    HandObservation::new(&hand_points(handedness, thumb, fingers), handedness)
        .expect("fixture hand is well formed")
}

pub fn set_point(points: &mut [LandmarkPoint], landmark: HandLandmark, x: f32, y: f32) {
    points[landmark.index()] = LandmarkPoint::new(x, y);
}

/// Render landmarks as the stream protocol's `((x y) ...)` list.
pub fn points_sexp(points: &[LandmarkPoint]) -> String {
    let items: Vec<String> = points
        .iter()
        .map(|p| format!("({:.4} {:.4})", p.x, p.y))
        .collect();
    format!("({})", items.join(" "))
}
