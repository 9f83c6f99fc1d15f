//! Hand signal mapping: tracker landmarks → normalized coordinate + squeeze.
//!
//! The tracker reports up to two hands, each a 21-point landmark set in
//! normalized image space.  Only the wrist and the four fingertips matter:
//!
//! * **coordinate**: the index fingertip, mirrored on x so moving your hand
//!   right moves the cursor right when facing a camera;
//! * **squeeze**: how closed the hand is, from the mean wrist→fingertip
//!   distance (`1.0` = fist).

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Landmark model
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;
pub const WRIST: usize = 0;
pub const INDEX_TIP: usize = 8;
/// Index, middle, ring, pinky.
pub const FINGERTIPS: [usize; 4] = [8, 12, 16, 20];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// A tracker point in normalized image space (`x`, `y` nominally 0–1).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    fn planar_distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectedHand {
    pub side:      Side,
    pub landmarks: Vec<Landmark>,
}

/// One tracker result: zero, one or two hands.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackerFrame {
    pub hands: Vec<DetectedHand>,
}

// ════════════════════════════════════════════════════════════════════════════
// Mapped hand state
// ════════════════════════════════════════════════════════════════════════════

/// Mirrored, clamped hand position.  `z` is passed through untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandCoordinates {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Latest mapped state for both hands.  `None` means "not detected this
/// frame"; the squeeze of an undetected hand is `0.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandState {
    pub left:          Option<HandCoordinates>,
    pub right:         Option<HandCoordinates>,
    pub left_squeeze:  f32,
    pub right_squeeze: f32,
}

impl HandState {
    pub fn hand(&self, side: Side) -> Option<HandCoordinates> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn squeeze(&self, side: Side) -> f32 {
        match side {
            Side::Left => self.left_squeeze,
            Side::Right => self.right_squeeze,
        }
    }

    pub fn any_present(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }

    fn set(&mut self, side: Side, coords: HandCoordinates, squeeze: f32) {
        match side {
            Side::Left => {
                self.left = Some(coords);
                self.left_squeeze = squeeze;
            }
            Side::Right => {
                self.right = Some(coords);
                self.right_squeeze = squeeze;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Squeeze calibration
// ════════════════════════════════════════════════════════════════════════════

/// `openness = clamp01((avg_dist − open_offset) / open_range)`.
///
/// The defaults were tuned for one camera and landmark model; only the
/// monotonic shape of the mapping is a contract.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqueezeCalibration {
    /// Mean distance at which the hand reads as a full fist.
    pub open_offset: f32,
    /// Extra distance over which the hand goes from fist to fully open.
    pub open_range:  f32,
}

impl Default for SqueezeCalibration {
    fn default() -> Self {
        SqueezeCalibration { open_offset: 0.15, open_range: 0.25 }
    }
}

impl SqueezeCalibration {
    pub fn validate(&self) -> Result<(), String> {
        if !self.open_offset.is_finite() || !self.open_range.is_finite() {
            return Err("squeeze calibration must be finite".into());
        }
        if self.open_range <= 0.0 {
            return Err(format!("squeeze open_range must be positive (got {})", self.open_range));
        }
        Ok(())
    }

    /// Squeeze for a mean wrist→fingertip distance.  Non-increasing in `avg_dist`.
    pub fn squeeze_for_distance(&self, avg_dist: f32) -> f32 {
        let openness = ((avg_dist - self.open_offset) / self.open_range).clamp(0.0, 1.0);
        1.0 - openness
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Mapping
// ════════════════════════════════════════════════════════════════════════════

/// Mean planar distance from the wrist to the four fingertips, or `None`
/// if the landmark set is incomplete or not finite.
pub fn mean_fingertip_distance(landmarks: &[Landmark]) -> Option<f32> {
    if landmarks.len() < LANDMARK_COUNT {
        return None;
    }
    let wrist = landmarks[WRIST];
    let sum: f32 = FINGERTIPS.iter().map(|&i| wrist.planar_distance(&landmarks[i])).sum();
    let avg = sum / FINGERTIPS.len() as f32;
    avg.is_finite().then_some(avg)
}

/// Map one detected hand.  Incomplete or non-finite hands yield `None`.
pub fn map_hand(hand: &DetectedHand, calibration: &SqueezeCalibration) -> Option<(HandCoordinates, f32)> {
    let avg = mean_fingertip_distance(&hand.landmarks)?;
    let tip = hand.landmarks[INDEX_TIP];
    if !tip.x.is_finite() || !tip.y.is_finite() {
        return None;
    }
    let coords = HandCoordinates {
        x: (1.0 - tip.x).clamp(0.0, 1.0),
        y: tip.y.clamp(0.0, 1.0),
        z: tip.z,
    };
    Some((coords, calibration.squeeze_for_distance(avg)))
}

/// Map a whole tracker result into a fresh [`HandState`].  Sides with no
/// usable detection come out as `None`; nothing carries over from earlier
/// frames.  If a side is reported twice, the first report wins.
pub fn map_frame(frame: &TrackerFrame, calibration: &SqueezeCalibration) -> HandState {
    let mut state = HandState::default();
    for hand in &frame.hands {
        if state.hand(hand.side).is_some() {
            continue;
        }
        match map_hand(hand, calibration) {
            Some((coords, squeeze)) => state.set(hand.side, coords, squeeze),
            None => log::debug!(
                "ignoring {:?} hand with {} unusable landmarks",
                hand.side,
                hand.landmarks.len()
            ),
        }
    }
    state
}
