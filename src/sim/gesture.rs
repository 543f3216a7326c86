//! Hand gesture tracking
//!
//! Each hand runs its own [`GestureStateMachine`]. The only transition with a
//! game meaning is leaving the ready pose (by default `Victory`), which fires a
//! cut at the hand's last known position. Losing a hand counts as changing to
//! `None`, so a hand that vanishes while in the ready pose still cuts.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use crate::settings::GestureConfig;

/// Gesture vocabulary produced by the hand classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gesture {
    #[default]
    None,
    ClosedFist,
    OpenPalm,
    PointingUp,
    ThumbDown,
    ThumbUp,
    Victory,
    ILoveYou,
}

impl Gesture {
    /// Parse a classifier label. Unknown labels read as `None`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Closed_Fist" => Gesture::ClosedFist,
            "Open_Palm" => Gesture::OpenPalm,
            "Pointing_Up" => Gesture::PointingUp,
            "Thumb_Down" => Gesture::ThumbDown,
            "Thumb_Up" => Gesture::ThumbUp,
            "Victory" => Gesture::Victory,
            "ILoveYou" => Gesture::ILoveYou,
            _ => Gesture::None,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            Gesture::None => "None",
            Gesture::ClosedFist => "Closed_Fist",
            Gesture::OpenPalm => "Open_Palm",
            Gesture::PointingUp => "Pointing_Up",
            Gesture::ThumbDown => "Thumb_Down",
            Gesture::ThumbUp => "Thumb_Up",
            Gesture::Victory => "Victory",
            Gesture::ILoveYou => "ILoveYou",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Left" | "left" => Some(Handedness::Left),
            "Right" | "right" => Some(Handedness::Right),
            _ => None,
        }
    }
}

/// A change of classified gesture on one hand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTransition {
    pub from: Gesture,
    pub to: Gesture,
    /// Left the ready pose: fire a cut
    pub cut: bool,
}

/// Per-hand gesture state
#[derive(Debug, Clone)]
pub struct GestureStateMachine {
    ready: Gesture,
    current: Gesture,
    confidence: f32,
}

impl GestureStateMachine {
    pub fn new(ready: Gesture) -> Self {
        Self {
            ready,
            current: Gesture::None,
            confidence: 0.0,
        }
    }

    pub fn current(&self) -> Gesture {
        self.current
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Feed one classification; reports a transition if the label changed
    pub fn observe(&mut self, gesture: Gesture, confidence: f32) -> Option<GestureTransition> {
        self.confidence = confidence;
        if gesture == self.current {
            return None;
        }
        let from = self.current;
        self.current = gesture;
        Some(GestureTransition {
            from,
            to: gesture,
            cut: from == self.ready && gesture != self.ready,
        })
    }

    /// Hand left the frame
    pub fn lose(&mut self) -> Option<GestureTransition> {
        self.observe(Gesture::None, 0.0)
    }
}

/// One hand as reported by the tracker for a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandSample {
    pub handedness: Handedness,
    /// Normalized video coordinates (0..1, origin top-left)
    pub position: Vec2,
    pub gesture: Gesture,
    pub confidence: f32,
}

/// A transition reported for one hand, with the position it happened at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandUpdate {
    pub hand: Handedness,
    pub transition: GestureTransition,
    /// World position of the hand when the transition fired
    pub position: Option<Vec3>,
}

/// Gesture state and cached position of one hand
#[derive(Debug, Clone)]
pub struct HandState {
    machine: GestureStateMachine,
    position: Option<Vec3>,
    tracked: bool,
}

impl HandState {
    fn new(ready: Gesture) -> Self {
        Self {
            machine: GestureStateMachine::new(ready),
            position: None,
            tracked: false,
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.machine.current()
    }

    pub fn confidence(&self) -> f32 {
        self.machine.confidence()
    }

    /// Last known world position, cleared when tracking is lost
    pub fn position(&self) -> Option<Vec3> {
        self.position
    }

    pub fn is_tracked(&self) -> bool {
        self.tracked
    }
}

/// Both hands, tracked independently
#[derive(Debug, Clone)]
pub struct HandTracker {
    left: HandState,
    right: HandState,
    min_confidence: f32,
}

impl HandTracker {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            left: HandState::new(config.ready_gesture),
            right: HandState::new(config.ready_gesture),
            min_confidence: config.min_confidence,
        }
    }

    pub fn hand(&self, hand: Handedness) -> &HandState {
        match hand {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        }
    }

    fn hand_mut(&mut self, hand: Handedness) -> &mut HandState {
        match hand {
            Handedness::Left => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }

    /// Drop all state (new session)
    pub fn reset(&mut self) {
        let ready = self.left.machine.ready;
        self.left = HandState::new(ready);
        self.right = HandState::new(ready);
    }

    /// Apply one tracking frame. Hands missing from `samples` are forced to
    /// `None` once and their cached position dropped.
    pub fn process_frame(&mut self, samples: &[HandSample], camera: &Camera) -> Vec<HandUpdate> {
        let mut updates = Vec::new();
        for hand in [Handedness::Left, Handedness::Right] {
            // Last sample wins if the tracker reports a hand twice
            let sample = samples.iter().rev().find(|s| s.handedness == hand);
            let min_confidence = self.min_confidence;
            let state = self.hand_mut(hand);

            match sample {
                Some(sample) => {
                    state.tracked = true;
                    if let Some(world) = camera.tracking_to_world(sample.position) {
                        state.position = Some(world);
                    }
                    if sample.confidence < min_confidence {
                        continue;
                    }
                    if let Some(transition) = state.machine.observe(sample.gesture, sample.confidence) {
                        updates.push(HandUpdate {
                            hand,
                            transition,
                            position: state.position,
                        });
                    }
                }
                None if state.tracked => {
                    state.tracked = false;
                    let last_position = state.position.take();
                    if let Some(transition) = state.machine.lose() {
                        updates.push(HandUpdate {
                            hand,
                            transition,
                            position: last_position,
                        });
                    }
                }
                None => {}
            }
        }
        updates
    }
}
