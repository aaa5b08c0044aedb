//! Sliding-window majority filter over per-frame gesture labels.
//!
//! Wraps the stateless classifier to reduce label flicker between
//! frames. One smoother tracks one hand.

use std::collections::VecDeque;

use super::gesture::GestureLabel;

/// Largest accepted window, in frames.
pub const MAX_WINDOW: usize = 120;

/// Majority vote over the last `window` labels of one hand.
#[derive(Debug, Clone)]
pub struct LabelSmoother {
    window: usize,
    history: VecDeque<GestureLabel>,
}

impl LabelSmoother {
    /// Create a smoother. A window of 0 behaves like 1 (pass-through).
    pub fn new(window: usize) -> Self {
        let window = window.clamp(1, MAX_WINDOW);
        Self {
            window,
            history: VecDeque::with_capacity(window),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Record a new frame's label and return the smoothed label.
    pub fn push(&mut self, label: GestureLabel) -> GestureLabel {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(label);
        self.majority().unwrap_or(label)
    }

    /// Smoothed label of the frames seen so far, if any.
    pub fn current(&self) -> Option<GestureLabel> {
        self.majority()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Most frequent label; ties go to the one seen most recently.
    fn majority(&self) -> Option<GestureLabel> {
        let mut counts = [0usize; GestureLabel::ALL.len()];
        let mut last_seen = [0usize; GestureLabel::ALL.len()];
        for (i, label) in self.history.iter().enumerate() {
            let slot = label_slot(*label);
            counts[slot] += 1;
            last_seen[slot] = i;
        }

        (0..GestureLabel::ALL.len())
            .filter(|slot| counts[*slot] > 0)
            .max_by_key(|slot| (counts[*slot], last_seen[*slot]))
            .map(|slot| GestureLabel::ALL[slot])
    }
}

fn label_slot(label: GestureLabel) -> usize {
    match label {
        GestureLabel::OpenPalm => 0,
        GestureLabel::Fist => 1,
        GestureLabel::PeaceSign => 2,
        GestureLabel::ThumbsUp => 3,
        GestureLabel::Unrecognized => 4,
    }
}
