use thiserror::Error;

use crate::dsp::graph::{NodeId, ParamName};

/// Errors raised while building or rendering an audio graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} does not accept audio input")]
    NoInput(NodeId),
    #[error("node {0:?} has no audio output")]
    NoOutput(NodeId),
    #[error("node {node:?} has no {param:?} parameter")]
    NoSuchParam { node: NodeId, param: ParamName },
    #[error("node {0:?} is not a scheduled source")]
    NotASource(NodeId),
    #[error("source {0:?} has already been started")]
    AlreadyStarted(NodeId),
    #[error("connection from {from:?} to {to:?} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },
    #[error("exponential ramp target must be positive, got {0}")]
    NonPositiveRampTarget(f64),
    #[error("graph has a source with no end; stop it or render a fixed length")]
    Unbounded,
}

/// Errors raised by the sound kit.
#[derive(Debug, Error)]
pub enum KitError {
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
    #[error("invalid decay: {0}")]
    InvalidDecay(String),
    #[error("invalid kit config: {0}")]
    InvalidConfig(String),
    #[error("unknown sound '{0}'")]
    UnknownSound(String),
    #[error("hi-hat sample has not been loaded")]
    SampleNotLoaded,
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while fetching or decoding a sample asset.
#[cfg(feature = "samples")]
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV decode failed: {0}")]
    Wav(#[from] hound::Error),
    #[error("MP3 decode failed: {0}")]
    Mp3(String),
    #[error("decoded audio contains no samples")]
    Empty,
}

#[cfg(feature = "samples")]
impl From<minimp3::Error> for SampleError {
    fn from(e: minimp3::Error) -> Self {
        SampleError::Mp3(format!("{e:?}"))
    }
}

/// Errors raised while opening or driving the live output stream.
#[cfg(feature = "playback")]
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no default output device")]
    NoDevice,
    #[error("unsupported output sample format {0:?}, need f32")]
    UnsupportedFormat(cpal::SampleFormat),
    #[error("output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("build stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("start stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error("output stream has shut down")]
    Disconnected,
}
