//! The fixed note catalog: C4 to C6, chromatic.

use serde::Serialize;

/// A playable note with its equal-tempered frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Note {
    pub name: &'static str,
    pub frequency: f64,
}

const fn note(name: &'static str, frequency: f64) -> Note {
    Note { name, frequency }
}

/// 25 notes from `c-4` to `c-6`, in ascending order.
pub static NOTES: [Note; 25] = [
    note("c-4", 261.626),
    note("c#-4", 277.183),
    note("d-4", 293.665),
    note("d#-4", 311.127),
    note("e-4", 329.628),
    note("f-4", 349.228),
    note("f#-4", 369.994),
    note("g-4", 391.995),
    note("g#-4", 415.305),
    note("a-4", 440.0),
    note("a#-4", 466.164),
    note("b-4", 493.883),
    note("c-5", 523.251),
    note("c#-5", 554.365),
    note("d-5", 587.33),
    note("d#-5", 622.254),
    note("e-5", 659.255),
    note("f-5", 698.456),
    note("f#-5", 739.989),
    note("g-5", 783.991),
    note("g#-5", 830.609),
    note("a-5", 880.0),
    note("a#-5", 932.328),
    note("b-5", 987.767),
    note("c-6", 1046.502),
];

/// Look up a catalog note by name, ignoring case.
pub fn find_note(name: &str) -> Option<&'static Note> {
    NOTES.iter().find(|n| n.name.eq_ignore_ascii_case(name))
}
