//! Top-level application loop.
//!
//! Opens the window, picks a hand tracker, starts a [`Session`] with the
//! MIDI audio engine and drives it once per refresh until the window
//! closes.

use anyhow::{Context, Result};
use handflow_engine::canvas::Framebuffer;
use handflow_engine::{EngineConfig, HandTracker, Session};

use crate::player::{AudioSettings, MidiAudio};
use crate::tracker::{SimFeed, SimTracker};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackerKind {
    /// Mouse and keyboard stand in for hands.
    #[default]
    Simulated,
    /// LeapMotion controller (needs the `leap` feature).
    Leap,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub engine:  EngineConfig,
    pub width:   usize,
    pub height:  usize,
    pub audio:   AudioSettings,
    pub tracker: TrackerKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            engine:  EngineConfig::default(),
            width:   1280,
            height:  720,
            audio:   AudioSettings::default(),
            tracker: TrackerKind::Simulated,
        }
    }
}

/// The tracker plus, for the simulator, the feed the window writes into.
fn build_tracker(kind: TrackerKind) -> Result<(Box<dyn HandTracker>, Option<SimFeed>)> {
    match kind {
        TrackerKind::Simulated => {
            let (tracker, feed) = SimTracker::new();
            Ok((Box::new(tracker), Some(feed)))
        }
        #[cfg(feature = "leap")]
        TrackerKind::Leap => Ok((Box::new(crate::tracker::LeapTracker::new()), None)),
        #[cfg(not(feature = "leap"))]
        TrackerKind::Leap => anyhow::bail!("this build has no LeapMotion support (rebuild with --features leap)"),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main loop
// ════════════════════════════════════════════════════════════════════════════

pub fn run(cfg: AppConfig) -> Result<()> {
    let title = format!("handflow: {}", cfg.engine.genre);
    let mut vis = Visualizer::new(&title, cfg.width, cfg.height)?;

    let (tracker, feed) = build_tracker(cfg.tracker)?;
    let audio = Box::new(MidiAudio::new(cfg.audio.clone()));
    let mut session = Session::start(&cfg.engine, cfg.width as f32, cfg.height as f32, tracker, audio)
        .context("cannot start session")?;

    let mut fb = Framebuffer::new(cfg.width, cfg.height);
    fb.clear(cfg.engine.genre.style().background);

    while vis.is_open() {
        // 1. Devices → simulated hands
        let poll = vis.poll();
        if poll.quit {
            break;
        }
        if let Some(feed) = &feed {
            feed.send(poll.sim);
        }

        // 2. Follow the window size
        let (w, h) = poll.size;
        if w > 0 && h > 0 && (w, h) != (fb.width(), fb.height()) {
            fb.resize(w, h);
            fb.clear(cfg.engine.genre.style().background);
            session.resize(w as f32, h as f32);
        }

        // 3. Simulate + draw, then present
        session.tick(&mut fb).context("session ended")?;
        vis.present(&fb)?;
    }

    log::info!("window closed");
    session.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use handflow_engine::Genre;

    #[test]
    fn default_config_is_simulated_liquid() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.tracker, TrackerKind::Simulated);
        assert_eq!(cfg.engine.genre, Genre::Liquid);
        assert!(cfg.width > 0 && cfg.height > 0);
    }

    #[test]
    fn simulated_tracker_comes_with_a_feed() {
        let (_tracker, feed) = build_tracker(TrackerKind::Simulated).unwrap();
        assert!(feed.is_some());
    }

    #[cfg(not(feature = "leap"))]
    #[test]
    fn leap_needs_the_feature() {
        assert!(build_tracker(TrackerKind::Leap).is_err());
    }
}
