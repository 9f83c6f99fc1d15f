//! Command line and configuration loading.
//!
//! The optional `--config` file holds the engine section as JSON; flags
//! given on the command line win over it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use handflow_engine::{EngineConfig, Genre};

use crate::app::{AppConfig, TrackerKind};
use crate::player::AudioSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "handflow", author, version, about = "Gesture-driven particle visuals with live MIDI")]
pub struct Cli {
    /// Visual genre: liquid, vortex or neural
    #[arg(long)]
    pub genre: Option<Genre>,

    /// Initial window width
    #[arg(long, default_value_t = 1280)]
    pub width: usize,

    /// Initial window height
    #[arg(long, default_value_t = 720)]
    pub height: usize,

    /// Tempo (overrides the genre's preset)
    #[arg(long, value_parser = clap::value_parser!(u32).range(20..=300))]
    pub bpm: Option<u32>,

    /// Only open a MIDI output whose name contains this text
    #[arg(long, value_name = "NAME")]
    pub midi_port: Option<String>,

    /// Fail instead of running silently when no MIDI output is available
    #[arg(long, default_value_t = false)]
    pub require_midi: bool,

    /// Engine configuration (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Track hands with a LeapMotion controller instead of mouse/keyboard
    #[arg(long, default_value_t = false)]
    pub leap: bool,
}

impl Cli {
    pub fn into_app_config(self) -> Result<AppConfig> {
        let mut engine = match &self.config {
            Some(path) => load_engine_config(path)?,
            None => EngineConfig::default(),
        };
        if let Some(genre) = self.genre {
            engine.genre = genre;
        }
        engine.validate().context("invalid engine configuration")?;
        anyhow::ensure!(self.width > 0 && self.height > 0, "window size must be non-zero");

        Ok(AppConfig {
            engine,
            width:   self.width,
            height:  self.height,
            audio:   AudioSettings {
                bpm:          self.bpm,
                port_filter:  self.midi_port,
                require_midi: self.require_midi,
            },
            tracker: if self.leap { TrackerKind::Leap } else { TrackerKind::Simulated },
        })
    }
}

pub fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    parse_engine_config(&text).with_context(|| format!("in config file {}", path.display()))
}

pub fn parse_engine_config(text: &str) -> Result<EngineConfig> {
    serde_json::from_str(text).context("malformed engine configuration")
}
