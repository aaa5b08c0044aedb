//! Hand pose builders shared by integration tests.

#![allow(dead_code)]

use handsign::hand::{Finger, HandLandmark, LandmarkPoint, LANDMARK_COUNT};

/// Mutable 21-point hand, starting from an upright folded right hand.
#[derive(Debug, Clone)]
pub struct HandBuilder {
    pub points: Vec<LandmarkPoint>,
}

impl HandBuilder {
    pub fn new() -> Self {
        let mut b = Self {
            points: vec![LandmarkPoint::default(); LANDMARK_COUNT],
        };
        b.set(HandLandmark::Wrist, 0.50, 0.90);
        b.set(HandLandmark::ThumbCmc, 0.55, 0.85);
        b.set(HandLandmark::ThumbMcp, 0.60, 0.80);
        b.set(HandLandmark::ThumbIp, 0.62, 0.75);
        b.set(HandLandmark::ThumbTip, 0.60, 0.74);
        for (finger, x) in [
            (Finger::Index, 0.45),
            (Finger::Middle, 0.40),
            (Finger::Ring, 0.35),
            (Finger::Pinky, 0.30),
        ] {
            b.fold(finger, x, 0.70);
        }
        b
    }

    pub fn set(&mut self, landmark: HandLandmark, x: f32, y: f32) -> &mut Self {
        self.points[landmark.index()] = LandmarkPoint::new(x, y);
        self
    }

    pub fn get(&self, landmark: HandLandmark) -> LandmarkPoint {
        self.points[landmark.index()]
    }

    /// Straight finger pointing up from a knuckle at (x, mcp_y).
    pub fn extend(&mut self, finger: Finger, x: f32, mcp_y: f32) -> &mut Self {
        let [mcp, pip, dip, tip] = finger.joints();
        self.set(mcp, x, mcp_y)
            .set(pip, x, mcp_y - 0.10)
            .set(dip, x, mcp_y - 0.15)
            .set(tip, x, mcp_y - 0.20)
    }

    /// Finger curled back down toward its knuckle.
    pub fn fold(&mut self, finger: Finger, x: f32, mcp_y: f32) -> &mut Self {
        let [mcp, pip, dip, tip] = finger.joints();
        self.set(mcp, x, mcp_y)
            .set(pip, x, mcp_y - 0.10)
            .set(dip, x, mcp_y - 0.06)
            .set(tip, x, mcp_y - 0.02)
    }

    /// Move the thumb tip `dx` along +x from the IP joint, with the MCP
    /// level with the IP in x.
    pub fn thumb_offset(&mut self, dx: f32) -> &mut Self {
        let ip = self.get(HandLandmark::ThumbIp);
        self.set(HandLandmark::ThumbMcp, ip.x, ip.y + 0.04)
            .set(HandLandmark::ThumbTip, ip.x + dx, ip.y - 0.01)
    }

    pub fn build(&self) -> Vec<LandmarkPoint> {
        self.points.clone()
    }
}

pub fn fingers(thumb_dx: f32, extended: [bool; 4]) -> Vec<LandmarkPoint> {
    let mut b = HandBuilder::new();
    b.thumb_offset(thumb_dx);
    for ((finger, x), up) in [
        (Finger::Index, 0.45),
        (Finger::Middle, 0.40),
        (Finger::Ring, 0.35),
        (Finger::Pinky, 0.30),
    ]
    .into_iter()
    .zip(extended)
    {
        if up {
            b.extend(finger, x, 0.70);
        } else {
            b.fold(finger, x, 0.70);
        }
    }
    b.build()
}
