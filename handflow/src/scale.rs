//! Pitch sets for the hand-driven melody.

/// A pitch collection, as semitone offsets from the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scale {
    /// e.g. `[0,2,4,5,7,9,11]` for major.
    pub intervals: Vec<u8>,
    pub name:      &'static str,
}

impl Scale {
    /// Major scale (Ionian): W W H W W W H
    pub fn major() -> Self {
        Scale { intervals: vec![0, 2, 4, 5, 7, 9, 11], name: "Major" }
    }
    /// Natural minor (Aeolian): W H W W H W W
    pub fn minor() -> Self {
        Scale { intervals: vec![0, 2, 3, 5, 7, 8, 10], name: "Minor" }
    }
    /// Pentatonic major: W W 3H W 3H
    pub fn pentatonic_major() -> Self {
        Scale { intervals: vec![0, 2, 4, 7, 9], name: "Pentatonic Major" }
    }
    pub fn pentatonic_minor() -> Self {
        Scale { intervals: vec![0, 3, 5, 7, 10], name: "Pentatonic Minor" }
    }
    pub fn dorian() -> Self {
        Scale { intervals: vec![0, 2, 3, 5, 7, 9, 10], name: "Dorian" }
    }
    pub fn len(&self) -> usize { self.intervals.len() }
    pub fn is_empty(&self) -> bool { self.intervals.is_empty() }
}

/// Maps a scale degree, or a vertical hand position, to a MIDI note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PitchMap {
    /// MIDI note number for degree 0.
    pub root:    u8,
    pub scale:   Scale,
    /// Octaves spanned by the full height of the surface.
    pub octaves: u8,
}

impl PitchMap {
    pub fn new(root: u8, scale: Scale, octaves: u8) -> Self {
        PitchMap { root, scale, octaves: octaves.max(1) }
    }

    /// Resolve degree `d`, wrapping across octaves, clamped to 0–127.
    pub fn note_for(&self, d: u8) -> u8 {
        let n = self.scale.len().max(1);
        let octave   = (d as usize) / n;
        let degree   = (d as usize) % n;
        let semitone = self.scale.intervals.get(degree).copied().unwrap_or(0) as usize;
        let note     = self.root as usize + octave * 12 + semitone;
        note.min(127) as u8
    }

    /// Normalized vertical position (`0` = top) to a note: higher hands
    /// play higher pitches.
    pub fn note_for_height(&self, vertical: f32) -> u8 {
        let steps = self.scale.len() * self.octaves as usize;
        let lift = (1.0 - vertical).clamp(0.0, 1.0);
        let degree = ((lift * steps as f32) as usize).min(steps.saturating_sub(1));
        self.note_for(degree.min(u8::MAX as usize) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_degrees() {
        let pm = PitchMap::new(60, Scale::major(), 2);
        assert_eq!(pm.note_for(0), 60); // C
        assert_eq!(pm.note_for(2), 64); // E
        assert_eq!(pm.note_for(6), 71); // B
        assert_eq!(pm.note_for(7), 72); // octave wrap → C5
    }

    #[test]
    fn pentatonic_wraps() {
        let pm = PitchMap::new(60, Scale::pentatonic_major(), 1);
        assert_eq!(pm.note_for(4), 69); // A4
        assert_eq!(pm.note_for(5), 72);
    }

    #[test]
    fn clamps_at_127() {
        let pm = PitchMap::new(120, Scale::minor(), 1);
        assert_eq!(pm.note_for(20), 127);
    }

    #[test]
    fn height_spans_the_range() {
        let pm = PitchMap::new(48, Scale::pentatonic_minor(), 2);
        assert_eq!(pm.note_for_height(1.0), 48);
        assert_eq!(pm.note_for_height(0.0), pm.note_for(9));
        assert!(pm.note_for_height(0.2) > pm.note_for_height(0.8));
        // Out-of-range input stays on the ends.
        assert_eq!(pm.note_for_height(-3.0), pm.note_for_height(0.0));
        assert_eq!(pm.note_for_height(f32::NAN), 48);
    }
}
