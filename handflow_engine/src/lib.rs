//! # handflow_engine
//!
//! Gesture-driven particle simulation and rendering core.
//!
//! A hand tracker reports landmarks, an audio engine reports beats and
//! notes, and once per display frame the engine turns both into one render
//! pass of the active genre:
//!
//! ```text
//!  HandTracker ──► TrackerSink ──► map_frame ──► HandSlot ─┐
//!                                                          ├─► Session::tick ─► FrameOrchestrator ─► Canvas
//!  AudioEngine ──► AudioEventSender ──► event queue ───────┘          │
//!       ▲                                                             │
//!       └────────────── update(side, vertical, horizontal, …) ◄───────┘
//! ```
//!
//! ## Genres
//!
//! | Genre | Population | Look |
//! |---|---|---|
//! | `liquid` | 350 | Noise flow field; hands attract and drag streaks |
//! | `vortex` | 300 | Spinning tunnel streaming toward the viewer |
//! | `neural` | 80 | Bouncing nodes linked when close; hands glitch them |
//!
//! Beats flash the trail fade; notes spawn expanding rings.
//!
//! ## Drawing
//!
//! Everything is drawn through the [`canvas::Canvas`] trait.
//! [`canvas::Framebuffer`] rasterizes into ARGB pixels for a window;
//! [`canvas::DrawRecorder`] records commands for tests.

pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod genre;
pub mod hand;
pub mod input;
pub mod noise;
pub mod orchestrator;
pub mod overlay;
pub mod session;

pub use config::EngineConfig;
pub use error::{AudioError, SessionError, TrackerError};
pub use genre::Genre;
pub use session::{AudioEngine, HandTracker, Session, TrackerSink};
