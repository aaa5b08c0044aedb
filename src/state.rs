//! Session state for a stream of frames.
//!
//! Owns the configured pipeline, one label smoother per handedness and
//! running statistics. The classification core stays stateless; all
//! cross-frame bookkeeping lives here.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::hand::smoothing::MAX_WINDOW;
use crate::hand::{
    Classification, DistanceTest, ExtractorConfig, FingerStateExtractor, GestureError,
    GestureLabel, GesturePipeline, HandObservation, Handedness, LabelSmoother, LandmarkPoint,
};

// ── Config ─────────────────────────────────────────────────

/// Session configuration: extractor thresholds plus smoothing.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub extractor: ExtractorConfig,
    /// Frames in the majority window. 1 disables smoothing.
    pub smoothing_window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            smoothing_window: 1,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        self.extractor.validate()?;
        if self.smoothing_window == 0 || self.smoothing_window > MAX_WINDOW {
            return Err(GestureError::InvalidConfig {
                reason: format!(
                    "smoothing window must be between 1 and {}, got {}",
                    MAX_WINDOW, self.smoothing_window
                ),
            });
        }
        Ok(())
    }

    /// Generate s-expression for the stream protocol.
    pub fn config_sexp(&self) -> String {
        let extractor = self.extractor.config_sexp();
        // Splice the window into the extractor plist.
        format!(
            "{} :smoothing-window {})",
            extractor.trim_end_matches(')'),
            self.smoothing_window
        )
    }
}

/// Partial configuration change; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigUpdate {
    pub thumb_margin: Option<f32>,
    pub distance_test: Option<DistanceTest>,
    pub smoothing_window: Option<usize>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.thumb_margin.is_none() && self.distance_test.is_none() && self.smoothing_window.is_none()
    }
}

// ── Frame input and output ─────────────────────────────────

/// One hand as reported by the landmark detector, not yet validated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawHand {
    pub handedness: Option<String>,
    pub landmarks: Vec<LandmarkPoint>,
}

/// Result for one hand of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandResult {
    pub handedness: Handedness,
    /// Unsmoothed classification of this frame.
    pub classification: Classification,
    /// Label after the per-hand majority filter.
    pub smoothed: GestureLabel,
}

/// Per-hand outcome: a result, or the reason the hand was rejected.
pub type HandOutcome = Result<HandResult, GestureError>;

// ── State ──────────────────────────────────────────────────

/// Central session state.
pub struct SessionState {
    config: SessionConfig,
    pipeline: GesturePipeline,
    left: LabelSmoother,
    right: LabelSmoother,
    /// Frames processed since start or last reset.
    pub frames: u64,
    /// Hands successfully classified.
    pub hands_classified: u64,
    /// Hands rejected by validation.
    pub hands_rejected: u64,
    label_counts: HashMap<GestureLabel, u64>,
}

impl SessionState {
    pub fn new(config: SessionConfig) -> Result<Self, GestureError> {
        config.validate()?;
        let pipeline = GesturePipeline::new(FingerStateExtractor::new(config.extractor.clone())?);
        info!(
            "session configured: thumb margin {:.3}, smoothing window {}",
            config.extractor.thumb_margin, config.smoothing_window
        );
        Ok(Self {
            left: LabelSmoother::new(config.smoothing_window),
            right: LabelSmoother::new(config.smoothing_window),
            config,
            pipeline,
            frames: 0,
            hands_classified: 0,
            hands_rejected: 0,
            label_counts: HashMap::new(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn smoother_mut(&mut self, hand: Handedness) -> &mut LabelSmoother {
        match hand {
            Handedness::Left => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }

    fn smoother(&self, hand: Handedness) -> &LabelSmoother {
        match hand {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        }
    }

    /// Classify every hand of one frame, in detector order.
    ///
    /// Hands are independent: a rejected hand does not affect the others.
    /// Only the first hand of each handedness in a frame feeds its smoother.
    pub fn process_frame(&mut self, hands: Vec<Result<RawHand, GestureError>>) -> Vec<HandOutcome> {
        self.frames += 1;
        let mut fed = [false; 2];

        hands
            .into_iter()
            .enumerate()
            .map(|(i, hand)| {
                let outcome = hand.and_then(|raw| self.classify_once(&raw));
                match outcome {
                    Ok((handedness, classification)) => {
                        let slot = handedness as usize;
                        let smoothed = if fed[slot] {
                            classification.label
                        } else {
                            fed[slot] = true;
                            self.smooth(handedness, classification.label)
                        };
                        self.hands_classified += 1;
                        *self.label_counts.entry(classification.label).or_insert(0) += 1;
                        Ok(HandResult {
                            handedness,
                            classification,
                            smoothed,
                        })
                    }
                    Err(e) => {
                        self.hands_rejected += 1;
                        warn!(frame = self.frames, hand = i, "hand rejected: {}", e);
                        Err(e)
                    }
                }
            })
            .collect()
    }

    /// Classify a single hand without touching smoothers or statistics.
    pub fn classify_once(&self, raw: &RawHand) -> Result<(Handedness, Classification), GestureError> {
        let obs = HandObservation::from_raw(&raw.landmarks, raw.handedness.as_deref())?;
        Ok((obs.handedness(), self.pipeline.classify(&obs)))
    }

    fn smooth(&mut self, hand: Handedness, label: GestureLabel) -> GestureLabel {
        let previous = self.smoother(hand).current();
        let smoothed = self.smoother_mut(hand).push(label);
        if previous != Some(smoothed) {
            debug!("gesture changed: {:?} -> {:?} on {}", previous, smoothed, hand);
        }
        smoothed
    }

    /// Apply a configuration change. Nothing changes if the result is invalid.
    pub fn apply_config(&mut self, update: &ConfigUpdate) -> Result<(), GestureError> {
        let mut next = self.config.clone();
        if let Some(margin) = update.thumb_margin {
            next.extractor.thumb_margin = margin;
        }
        if let Some(test) = update.distance_test {
            next.extractor.distance_test = test;
        }
        if let Some(window) = update.smoothing_window {
            next.smoothing_window = window;
        }
        next.validate()?;

        if next.smoothing_window != self.config.smoothing_window {
            self.left = LabelSmoother::new(next.smoothing_window);
            self.right = LabelSmoother::new(next.smoothing_window);
        }
        self.pipeline = GesturePipeline::new(FingerStateExtractor::new(next.extractor.clone())?);
        info!("configuration updated: {}", next.config_sexp());
        self.config = next;
        Ok(())
    }

    /// Clear smoothers and statistics.
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.frames = 0;
        self.hands_classified = 0;
        self.hands_rejected = 0;
        self.label_counts.clear();
    }

    pub fn label_count(&self, label: GestureLabel) -> u64 {
        self.label_counts.get(&label).copied().unwrap_or(0)
    }

    /// Generate s-expression for the stream protocol status.
    pub fn status_sexp(&self) -> String {
        let current = |hand: Handedness| {
            self.smoother(hand)
                .current()
                .map(|l| format!(":{}", l.as_str()))
                .unwrap_or_else(|| "nil".to_string())
        };
        let counts: Vec<String> = GestureLabel::ALL
            .iter()
            .map(|l| format!(":{} {}", l.as_str(), self.label_count(*l)))
            .collect();
        format!(
            "(:frames {} :classified {} :rejected {} :left (:gesture {} :window-fill {}) :right (:gesture {} :window-fill {}) :counts ({}))",
            self.frames,
            self.hands_classified,
            self.hands_rejected,
            current(Handedness::Left),
            self.left.len(),
            current(Handedness::Right),
            self.right.len(),
            counts.join(" "),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
