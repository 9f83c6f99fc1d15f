//! Software-rendered window using `minifb`.
//!
//! The engine draws into a [`Framebuffer`]; this module only presents it
//! and turns mouse/keyboard state into simulated hands:
//!
//! | Input | Hand |
//! |---|---|
//! | Mouse position | Right index fingertip |
//! | Left mouse button (hold) | Close right hand |
//! | Arrow keys | Move left hand |
//! | `Space` | Show / hide left hand |
//! | `Shift` (hold) | Close left hand |
//! | `Escape` / `Q` | Quit |

use std::time::Duration;

use anyhow::{anyhow, Result};
use handflow_engine::canvas::Framebuffer;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::tracker::{SimHand, SimInput};

/// Fraction of the surface the left hand moves per refresh while an arrow
/// key is held.
const ARROW_STEP: f32 = 0.01;

// ════════════════════════════════════════════════════════════════════════════
// SimControls: keyboard/mouse → SimInput
// ════════════════════════════════════════════════════════════════════════════

/// Raw device state for one refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KeyState {
    pub up:            bool,
    pub down:          bool,
    pub left:          bool,
    pub right:         bool,
    /// `Space` went down this refresh.
    pub toggle_left:   bool,
    pub shift:         bool,
    /// Cursor in window pixels, when inside the window.
    pub mouse:         Option<(f32, f32)>,
    pub mouse_down:    bool,
}

/// Persistent simulated-hand state between refreshes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimControls {
    left_pos: (f32, f32),
    left_on:  bool,
}

impl Default for SimControls {
    fn default() -> Self {
        SimControls { left_pos: (0.3, 0.5), left_on: false }
    }
}

impl SimControls {
    pub fn apply(&mut self, keys: &KeyState, width: usize, height: usize) -> SimInput {
        if keys.toggle_left {
            self.left_on = !self.left_on;
        }
        let (mut x, mut y) = self.left_pos;
        if keys.left  { x -= ARROW_STEP; }
        if keys.right { x += ARROW_STEP; }
        if keys.up    { y -= ARROW_STEP; }
        if keys.down  { y += ARROW_STEP; }
        self.left_pos = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));

        let left = self.left_on.then(|| SimHand {
            x:      self.left_pos.0,
            y:      self.left_pos.1,
            closed: keys.shift,
        });
        let right = keys.mouse.filter(|_| width > 0 && height > 0).map(|(mx, my)| SimHand {
            x:      (mx / width as f32).clamp(0.0, 1.0),
            y:      (my / height as f32).clamp(0.0, 1.0),
            closed: keys.mouse_down,
        });
        SimInput { left, right }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

/// What one refresh of the window produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Poll {
    pub quit: bool,
    pub sim:  SimInput,
    pub size: (usize, usize),
}

pub struct Visualizer {
    window:   Window,
    controls: SimControls,
}

impl Visualizer {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width, height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| anyhow!("cannot open window: {}", e))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer { window, controls: SimControls::default() })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Read the devices once.  Call before every tick.
    pub fn poll(&mut self) -> Poll {
        let size = self.window.get_size();
        if !self.window.is_open()
            || self.window.is_key_down(Key::Escape)
            || self.window.is_key_pressed(Key::Q, KeyRepeat::No)
        {
            return Poll { quit: true, sim: SimInput::default(), size };
        }

        let keys = KeyState {
            up:          self.window.is_key_down(Key::Up),
            down:        self.window.is_key_down(Key::Down),
            left:        self.window.is_key_down(Key::Left),
            right:       self.window.is_key_down(Key::Right),
            toggle_left: self.window.is_key_pressed(Key::Space, KeyRepeat::No),
            shift:       self.window.is_key_down(Key::LeftShift) || self.window.is_key_down(Key::RightShift),
            mouse:       self.window.get_mouse_pos(MouseMode::Discard),
            mouse_down:  self.window.get_mouse_down(MouseButton::Left),
        };
        let sim = self.controls.apply(&keys, size.0, size.1);
        Poll { quit: false, sim, size }
    }

    pub fn present(&mut self, fb: &Framebuffer) -> Result<()> {
        self.window
            .update_with_buffer(fb.pixels(), fb.width(), fb.height())
            .map_err(|e| anyhow!("cannot present frame: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_drives_right_hand() {
        let mut controls = SimControls::default();
        let keys = KeyState { mouse: Some((200.0, 150.0)), mouse_down: true, ..KeyState::default() };
        let sim = controls.apply(&keys, 800, 600);
        assert_eq!(sim.right, Some(SimHand { x: 0.25, y: 0.25, closed: true }));
        assert_eq!(sim.left, None);
    }

    #[test]
    fn cursor_outside_window_hides_right_hand() {
        let mut controls = SimControls::default();
        let sim = controls.apply(&KeyState::default(), 800, 600);
        assert_eq!(sim.right, None);
    }

    #[test]
    fn space_toggles_left_hand() {
        let mut controls = SimControls::default();
        let press = KeyState { toggle_left: true, ..KeyState::default() };
        assert!(controls.apply(&press, 800, 600).left.is_some());
        assert!(controls.apply(&KeyState::default(), 800, 600).left.is_some());
        assert!(controls.apply(&press, 800, 600).left.is_none());
    }

    #[test]
    fn arrows_move_and_shift_closes() {
        let mut controls = SimControls::default();
        controls.apply(&KeyState { toggle_left: true, ..KeyState::default() }, 800, 600);
        let held = KeyState { right: true, up: true, shift: true, ..KeyState::default() };
        let mut last = None;
        for _ in 0..10 {
            last = controls.apply(&held, 800, 600).left;
        }
        let hand = last.unwrap();
        assert!((hand.x - 0.4).abs() < 1e-4);
        assert!((hand.y - 0.4).abs() < 1e-4);
        assert!(hand.closed);
    }

    #[test]
    fn left_hand_stays_on_screen() {
        let mut controls = SimControls::default();
        let held = KeyState { left: true, ..KeyState::default() };
        for _ in 0..200 {
            controls.apply(&held, 800, 600);
        }
        assert_eq!(controls.left_pos.0, 0.0);
    }
}
