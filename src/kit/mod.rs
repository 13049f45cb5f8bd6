//! The sound kit: synthesis parameters for every pad and the machine that
//! turns a trigger into a rendered one-shot graph.

pub mod envelope;
pub mod machine;
pub mod notes;
pub mod params;
pub mod sound;

pub use machine::DrumMachine;
pub use notes::{NOTES, Note, find_note};
pub use sound::{Sound, Trigger};
