//! # handflow
//!
//! Windowed front end for `handflow_engine`: a `minifb` window, a
//! mouse/keyboard hand simulator (or LeapMotion hardware), and a live MIDI
//! engine whose beats and notes drive the visuals.
//!
//! ## Feature flags
//!
//! * (default): **Simulation mode**. The mouse is the right hand, the
//!   arrow keys move the left hand.
//! * `leap`: **Hardware mode**. Polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation controls
//!
//! | Input | Effect |
//! |---|---|
//! | Mouse | Right index fingertip |
//! | Left button (hold) | Close right hand (mutes it) |
//! | Arrows | Move left hand |
//! | `Space` | Show / hide left hand |
//! | `Shift` (hold) | Close left hand |
//! | `Escape` / `Q` | Quit |

pub mod app;
pub mod cli;
pub mod player;
pub mod scale;
pub mod tracker;
pub mod visualizer;
