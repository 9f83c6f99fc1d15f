//! Error types for the session boundary.
//!
//! Only the collaborators can fail: the hand tracker (capture device) and
//! the audio engine (output / genre load).  Everything inside a render tick
//! is infallible by construction.

use std::fmt;

// ════════════════════════════════════════════════════════════════════════════
// TrackerError
// ════════════════════════════════════════════════════════════════════════════

/// Failures reported by a [`crate::session::HandTracker`].
#[derive(Clone, Debug, PartialEq)]
pub enum TrackerError {
    /// No capture device, or the device could not be opened.
    Unavailable(String),
    /// The user or the OS refused access to the capture device.
    Denied,
    /// The tracker failed after it had started.
    Runtime(String),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::Unavailable(msg) => write!(f, "hand tracker unavailable: {}", msg),
            TrackerError::Denied => write!(f, "access to the capture device was denied"),
            TrackerError::Runtime(msg) => write!(f, "hand tracker failed: {}", msg),
        }
    }
}

impl std::error::Error for TrackerError {}

// ════════════════════════════════════════════════════════════════════════════
// AudioError
// ════════════════════════════════════════════════════════════════════════════

/// Failures reported by a [`crate::session::AudioEngine`].
#[derive(Clone, Debug, PartialEq)]
pub enum AudioError {
    /// No usable output (e.g. no MIDI port matched).
    NoOutput(String),
    /// The genre could not be loaded.
    Load(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::NoOutput(msg) => write!(f, "no audio output: {}", msg),
            AudioError::Load(msg) => write!(f, "failed to load audio: {}", msg),
        }
    }
}

impl std::error::Error for AudioError {}

// ════════════════════════════════════════════════════════════════════════════
// SessionError
// ════════════════════════════════════════════════════════════════════════════

/// Anything that ends a session.  All variants are fatal; nothing retries.
#[derive(Debug)]
pub enum SessionError {
    Tracker(TrackerError),
    Audio(AudioError),
    /// Rejected configuration (bad calibration, empty surface).
    Config(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Tracker(e) => write!(f, "tracker: {}", e),
            SessionError::Audio(e) => write!(f, "audio: {}", e),
            SessionError::Config(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Tracker(e) => Some(e),
            SessionError::Audio(e) => Some(e),
            SessionError::Config(_) => None,
        }
    }
}

impl From<TrackerError> for SessionError {
    fn from(e: TrackerError) -> Self {
        SessionError::Tracker(e)
    }
}

impl From<AudioError> for SessionError {
    fn from(e: AudioError) -> Self {
        SessionError::Audio(e)
    }
}
