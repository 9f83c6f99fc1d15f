//! Real-time MIDI audio engine.
//!
//! A playback thread keeps an eighth-note clock.  Every beat it plays a
//! drum hit and reports it to the session; every eighth it lets each open
//! hand play a note from the genre's scale and reports where it sounded.
//! Hand values arrive over a command channel from [`AudioEngine::update`].

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use handflow_engine::hand::Side;
use handflow_engine::input::{AudioEventSender, BeatKind, NoteKind};
use handflow_engine::{AudioEngine, AudioError, Genre};

use crate::scale::{PitchMap, Scale};

const TPQ: u32 = 480;
const EIGHTH_TICKS: u32 = TPQ / 2;

/// General MIDI percussion lives on channel 10 (index 9).
const DRUM_CHANNEL: u8 = 9;
const KICK:   u8 = 36;
const SNARE:  u8 = 38;
const HI_HAT: u8 = 42;

const LEAD_CHANNEL: u8 = 0;
const BASS_CHANNEL: u8 = 1;

/// Hands squeezed at or past this are silent.
pub const SQUEEZE_MUTE: f32 = 0.8;

// ════════════════════════════════════════════════════════════════════════════
// Settings + genre presets
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioSettings {
    /// Overrides the genre tempo.
    pub bpm:          Option<u32>,
    /// Case-insensitive substring the MIDI port name must contain.
    pub port_filter:  Option<String>,
    /// Fail instead of falling back to silent output.
    pub require_midi: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenrePreset {
    /// GM program for both melodic channels.
    pub program:   u8,
    pub lead:      PitchMap,
    pub bass:      PitchMap,
    pub tempo_bpm: u32,
}

pub fn preset(genre: Genre) -> GenrePreset {
    match genre {
        Genre::Liquid => GenrePreset {
            program:   88, // Pad 1 (new age)
            lead:      PitchMap::new(60, Scale::pentatonic_major(), 2),
            bass:      PitchMap::new(36, Scale::pentatonic_major(), 1),
            tempo_bpm: 90,
        },
        Genre::Vortex => GenrePreset {
            program:   81, // Lead 2 (sawtooth)
            lead:      PitchMap::new(57, Scale::minor(), 2),
            bass:      PitchMap::new(33, Scale::minor(), 1),
            tempo_bpm: 128,
        },
        Genre::Neural => GenrePreset {
            program:   11, // Vibraphone
            lead:      PitchMap::new(62, Scale::dorian(), 2),
            bass:      PitchMap::new(38, Scale::pentatonic_minor(), 1),
            tempo_bpm: 110,
        },
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut: midir or silent
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
    fn all_notes_off(&mut self, channel: u8);
}

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        let _ = self.conn.send(&[0xC0 | (channel & 0x0F), program & 0x7F]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        let _ = self.conn.send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        let _ = self.conn.send(&[0x80 | (channel & 0x0F), note & 0x7F, 0]);
    }
    fn all_notes_off(&mut self, channel: u8) {
        // CC 123
        let _ = self.conn.send(&[0xB0 | (channel & 0x0F), 123, 0]);
    }
}

struct NullOut;

impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8)  {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8) {}
    fn note_off(&mut self, _ch: u8, _n: u8)         {}
    fn all_notes_off(&mut self, _ch: u8)           {}
}

/// Index of the port to open.  With a filter, only a matching name will
/// do; without one, a soft synth is preferred over the first port.
fn pick_port(names: &[String], filter: Option<&str>) -> Option<usize> {
    let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    if let Some(filter) = filter {
        let filter = filter.to_lowercase();
        return lowered.iter().position(|n| n.contains(&filter));
    }
    if lowered.is_empty() {
        return None;
    }
    let synth = lowered.iter().position(|n| {
        n.contains("fluid") || n.contains("timidity") || n.contains("microsoft")
            || n.contains("gm") || n.contains("synth")
    });
    Some(synth.unwrap_or(0))
}

/// Open the configured output.  Without `require_midi`, anything short of
/// a filter mismatch degrades to [`NullOut`].
fn open_midi_output(settings: &AudioSettings) -> Result<(Box<dyn MidiOut>, String), AudioError> {
    let fallback = |reason: String| -> Result<(Box<dyn MidiOut>, String), AudioError> {
        if settings.require_midi {
            Err(AudioError::NoOutput(reason))
        } else {
            log::warn!("{}; using silent output", reason);
            Ok((Box::new(NullOut), "silent".to_string()))
        }
    };

    let midi_out = match midir::MidiOutput::new("handflow") {
        Ok(m) => m,
        Err(e) => return fallback(format!("MIDI init error: {}", e)),
    };
    let ports = midi_out.ports();
    let names: Vec<String> = ports
        .iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();
    log::debug!("MIDI output ports: {:?}", names);

    let filter = settings.port_filter.as_deref();
    let Some(index) = pick_port(&names, filter) else {
        return match filter {
            Some(f) => Err(AudioError::NoOutput(format!("no MIDI port matching '{}' in {:?}", f, names))),
            None => fallback("no MIDI output ports found".to_string()),
        };
    };

    let name = names[index].clone();
    match midi_out.connect(&ports[index], "handflow-out") {
        Ok(conn) => {
            log::info!("opened MIDI port: {}", name);
            Ok((Box::new(MidirOut { conn }), name))
        }
        Err(e) => fallback(format!("failed to connect to {}: {}", name, e)),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Player: the clock thread
// ════════════════════════════════════════════════════════════════════════════

enum PlayerCommand {
    Hand { side: Side, input: HandInput },
    Quit,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct HandInput {
    vertical:   f32,
    horizontal: f32,
    present:    bool,
    squeeze:    f32,
}

struct Player {
    cmd_tx: Sender<PlayerCommand>,
    handle: Option<JoinHandle<()>>,
}

impl Player {
    /// Spawn the thread and wait until it has its MIDI output.  The port is
    /// opened on the playback thread itself, which then owns it.
    fn spawn(
        preset:   GenrePreset,
        settings: AudioSettings,
        events:   Option<AudioEventSender>,
    ) -> Result<Self, AudioError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), AudioError>>(1);

        let handle = thread::Builder::new()
            .name("handflow-player".into())
            .spawn(move || {
                let midi = match open_midi_output(&settings) {
                    Ok((midi, _name)) => {
                        let _ = ready_tx.send(Ok(()));
                        midi
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let bpm = settings.bpm.unwrap_or(preset.tempo_bpm);
                player_thread(midi, preset, bpm, events, cmd_rx);
            })
            .map_err(|e| AudioError::Load(format!("cannot spawn player thread: {}", e)))?;

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(AudioError::Load("player thread exited during startup".into())));
        match ready {
            Ok(()) => Ok(Player { cmd_tx, handle: Some(handle) }),
            Err(e) => {
                let _ = handle.join();
                Err(e)
            }
        }
    }

    fn send(&self, cmd: PlayerCommand) {
        let _ = self.cmd_tx.send(cmd);
    }

    fn shutdown(&mut self) {
        self.send(PlayerCommand::Quit);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("player thread panicked");
            }
        }
    }
}

fn player_thread(
    mut midi:   Box<dyn MidiOut>,
    preset:     GenrePreset,
    bpm:        u32,
    events:     Option<AudioEventSender>,
    cmd_rx:     Receiver<PlayerCommand>,
) {
    let eighth = Duration::from_millis(ticks_to_ms(EIGHTH_TICKS, TPQ, bpm));
    log::info!("player running at {} BPM (program {})", bpm, preset.program);

    midi.program_change(LEAD_CHANNEL, preset.program);
    midi.program_change(BASS_CHANNEL, preset.program);

    let mut hands = [HandInput::default(); 2];
    let mut sounding: Vec<(u8, u8)> = Vec::new();
    let mut step = 0u64;
    let mut next = Instant::now();

    loop {
        // ── wait for the next eighth, applying hand updates meanwhile ─────
        loop {
            let timeout = next.saturating_duration_since(Instant::now());
            match cmd_rx.recv_timeout(timeout) {
                Ok(PlayerCommand::Hand { side, input }) => hands[side.index()] = input,
                Ok(PlayerCommand::Quit) | Err(RecvTimeoutError::Disconnected) => {
                    release(midi.as_mut(), &mut sounding);
                    for ch in [LEAD_CHANNEL, BASS_CHANNEL, DRUM_CHANNEL] {
                        midi.all_notes_off(ch);
                    }
                    return;
                }
                Err(RecvTimeoutError::Timeout) => break,
            }
        }

        play_step(step, &hands, &preset, midi.as_mut(), events.as_ref(), &mut sounding);
        step += 1;
        next += eighth;
    }
}

/// One eighth note: release what was held, hit the drums, play the hands.
fn play_step(
    step:     u64,
    hands:    &[HandInput; 2],
    preset:   &GenrePreset,
    midi:     &mut dyn MidiOut,
    events:   Option<&AudioEventSender>,
    sounding: &mut Vec<(u8, u8)>,
) {
    release(midi, sounding);

    if step % 2 == 0 {
        let beat = (step / 2) % 4;
        let (kind, drum) = if beat % 2 == 0 { (BeatKind::Kick, KICK) } else { (BeatKind::Snare, SNARE) };
        midi.note_on(DRUM_CHANNEL, drum, 110);
        sounding.push((DRUM_CHANNEL, drum));
        if let Some(events) = events {
            events.beat(kind);
        }
    } else {
        midi.note_on(DRUM_CHANNEL, HI_HAT, 60);
        sounding.push((DRUM_CHANNEL, HI_HAT));
    }

    for side in Side::BOTH {
        let hand = hands[side.index()];
        if !hand.present || hand.squeeze >= SQUEEZE_MUTE {
            continue;
        }
        let (channel, map, kind) = match side {
            Side::Left => (BASS_CHANNEL, &preset.bass, NoteKind::Bass),
            Side::Right => (LEAD_CHANNEL, &preset.lead, NoteKind::Lead),
        };
        let note = map.note_for_height(hand.vertical);
        midi.note_on(channel, note, velocity_for(hand.squeeze));
        sounding.push((channel, note));
        if let Some(events) = events {
            events.note(kind, hand.horizontal, hand.vertical);
        }
    }
}

fn release(midi: &mut dyn MidiOut, sounding: &mut Vec<(u8, u8)>) {
    for (channel, note) in sounding.drain(..) {
        midi.note_off(channel, note);
    }
}

/// Tighter squeeze plays harder: 50 open, up to ~112 at the mute point.
fn velocity_for(squeeze: f32) -> u8 {
    (50.0 + squeeze.clamp(0.0, 1.0) * 77.0).round().min(127.0) as u8
}

/// Convert ticks to milliseconds given TPQ and BPM.
fn ticks_to_ms(ticks: u32, tpq: u32, bpm: u32) -> u64 {
    let ms_per_beat = 60_000u64 / bpm.max(1) as u64;
    (ticks as u64 * ms_per_beat / tpq.max(1) as u64).max(50)
}

// ════════════════════════════════════════════════════════════════════════════
// MidiAudio: the session's audio engine
// ════════════════════════════════════════════════════════════════════════════

pub struct MidiAudio {
    settings: AudioSettings,
    events:   Option<AudioEventSender>,
    player:   Option<Player>,
}

impl MidiAudio {
    pub fn new(settings: AudioSettings) -> Self {
        MidiAudio { settings, events: None, player: None }
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_some()
    }
}

impl AudioEngine for MidiAudio {
    fn load(&mut self, genre: Genre) -> Result<(), AudioError> {
        self.stop();
        log::info!("loading {} audio preset", genre);
        let player = Player::spawn(preset(genre), self.settings.clone(), self.events.clone())?;
        self.player = Some(player);
        Ok(())
    }

    fn subscribe(&mut self, events: AudioEventSender) {
        self.events = Some(events);
    }

    fn update(&mut self, side: Side, vertical: f32, horizontal: f32, present: bool, squeeze: f32) {
        if let Some(player) = &self.player {
            let input = HandInput { vertical, horizontal, present, squeeze };
            player.send(PlayerCommand::Hand { side, input });
        }
    }

    fn stop(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.shutdown();
        }
    }
}

impl Drop for MidiAudio {
    fn drop(&mut self) {
        self.stop();
    }
}
