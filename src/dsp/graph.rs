//! Audio graph: one-shot node graphs rendered offline.
//!
//! A graph is an arena of nodes with a destination sink at index 0. Nodes
//! are wired with audio connections (summed into a node's input) and param
//! connections (summed into a node's automatable parameter, e.g. vibrato on
//! an oscillator's frequency). Sources must be started to sound and can be
//! started only once; rendering consumes the graph, so a graph is never
//! played twice.

use std::sync::Arc;

use tracing::debug;

use crate::error::GraphError;

use super::buffer::SampleBuffer;
use super::filter::{BiquadFilter, FilterType};
use super::oscillator::{Oscillator, Waveform};
use super::param::AudioParam;

/// Handle to a node inside one [`AudioGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Automatable parameters a node may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamName {
    Frequency,
    Gain,
    PlaybackRate,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Destination,
    Oscillator {
        osc: Oscillator,
        frequency: AudioParam,
    },
    BufferSource {
        buffer: Arc<SampleBuffer>,
        playback_rate: AudioParam,
        /// Read position in buffer frames.
        position: f64,
        /// Buffer sample rate / graph sample rate.
        rate_ratio: f64,
    },
    Gain {
        gain: AudioParam,
    },
    Filter {
        filter: BiquadFilter,
    },
}

impl NodeKind {
    fn is_source(&self) -> bool {
        matches!(self, NodeKind::Oscillator { .. } | NodeKind::BufferSource { .. })
    }

    fn param_mut(&mut self, name: ParamName) -> Option<&mut AudioParam> {
        match (self, name) {
            (NodeKind::Oscillator { frequency, .. }, ParamName::Frequency) => Some(frequency),
            (NodeKind::BufferSource { playback_rate, .. }, ParamName::PlaybackRate) => {
                Some(playback_rate)
            }
            (NodeKind::Gain { gain }, ParamName::Gain) => Some(gain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Schedule {
    start: Option<f64>,
    stop: Option<f64>,
}

impl Schedule {
    fn is_playing(&self, t: f64) -> bool {
        self.start.is_some_and(|s| t >= s) && self.stop.is_none_or(|e| t < e)
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    inputs: Vec<NodeId>,
    /// Nodes whose output is added to this node's parameter.
    modulators: Vec<NodeId>,
    schedule: Schedule,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            inputs: Vec::new(),
            modulators: Vec::new(),
            schedule: Schedule::default(),
        }
    }

    fn process(&mut self, t: f64, input: f64, modulation: f64) -> f64 {
        let playing = self.schedule.is_playing(t);
        match &mut self.kind {
            NodeKind::Destination => input,
            NodeKind::Gain { gain } => input * (gain.value_at(t) + modulation),
            NodeKind::Filter { filter } => filter.process(input),
            NodeKind::Oscillator { osc, frequency } => {
                if !playing {
                    return 0.0;
                }
                osc.next_sample(frequency.value_at(t) + modulation)
            }
            NodeKind::BufferSource {
                buffer,
                playback_rate,
                position,
                rate_ratio,
            } => {
                if !playing || *position >= buffer.len() as f64 {
                    return 0.0;
                }
                let sample = buffer.read_interpolated(*position);
                *position += (playback_rate.value_at(t) + modulation) * *rate_ratio;
                sample
            }
        }
    }

    /// End time in seconds, `None` when a started source never ends.
    fn end_time(&self) -> Option<f64> {
        let Some(start) = self.schedule.start else {
            return Some(0.0);
        };
        match &self.kind {
            NodeKind::Oscillator { .. } => self.schedule.stop,
            NodeKind::BufferSource {
                buffer,
                playback_rate,
                ..
            } => {
                let rate = playback_rate.value_at(start);
                let natural = (rate > 0.0).then(|| start + buffer.duration() / rate);
                match (natural, self.schedule.stop) {
                    (Some(n), Some(s)) => Some(n.min(s)),
                    (n, s) => n.or(s),
                }
            }
            _ => Some(0.0),
        }
    }
}

/// A disposable graph of audio nodes feeding a destination sink.
#[derive(Debug, Clone)]
pub struct AudioGraph {
    sample_rate: f64,
    nodes: Vec<Node>,
}

impl AudioGraph {
    pub fn new(sample_rate: f64) -> Self {
        AudioGraph {
            sample_rate,
            nodes: vec![Node::new(NodeKind::Destination)],
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// The output sink.
    pub fn destination(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    /// Oscillator at 440 Hz; set its frequency param to retune.
    pub fn add_oscillator(&mut self, waveform: Waveform) -> NodeId {
        let osc = Oscillator::new(waveform, self.sample_rate);
        self.push(NodeKind::Oscillator {
            osc,
            frequency: AudioParam::new(440.0),
        })
    }

    /// Gain node with unity gain.
    pub fn add_gain(&mut self) -> NodeId {
        self.push(NodeKind::Gain {
            gain: AudioParam::new(1.0),
        })
    }

    pub fn add_filter(&mut self, filter_type: FilterType, frequency: f64) -> NodeId {
        let filter = BiquadFilter::new(filter_type, frequency, self.sample_rate);
        self.push(NodeKind::Filter { filter })
    }

    /// Source that plays `buffer` once, resampled to the graph rate.
    pub fn add_buffer_source(&mut self, buffer: Arc<SampleBuffer>) -> NodeId {
        let rate_ratio = buffer.sample_rate as f64 / self.sample_rate;
        self.push(NodeKind::BufferSource {
            buffer,
            playback_rate: AudioParam::new(1.0),
            position: 0.0,
            rate_ratio,
        })
    }

    fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes.get_mut(id.0).ok_or(GraphError::UnknownNode(id))
    }

    pub fn param_mut(
        &mut self,
        id: NodeId,
        param: ParamName,
    ) -> Result<&mut AudioParam, GraphError> {
        self.node_mut(id)?
            .kind
            .param_mut(param)
            .ok_or(GraphError::NoSuchParam { node: id, param })
    }

    /// Route `from`'s output into `to`'s input.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.check_edge(from, to)?;
        if self.node(to)?.kind.is_source() {
            return Err(GraphError::NoInput(to));
        }
        self.node_mut(to)?.inputs.push(from);
        Ok(())
    }

    /// Add `from`'s output to `to`'s `param`.
    pub fn connect_param(
        &mut self,
        from: NodeId,
        to: NodeId,
        param: ParamName,
    ) -> Result<(), GraphError> {
        self.check_edge(from, to)?;
        self.param_mut(to, param)?;
        self.node_mut(to)?.modulators.push(from);
        Ok(())
    }

    fn check_edge(&self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.node(to)?;
        if matches!(self.node(from)?.kind, NodeKind::Destination) {
            return Err(GraphError::NoOutput(from));
        }
        if self.depends_on(from, to) {
            return Err(GraphError::Cycle { from, to });
        }
        Ok(())
    }

    /// Does `node` (transitively) read from `target`?
    fn depends_on(&self, node: NodeId, target: NodeId) -> bool {
        let mut stack = vec![node];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if std::mem::replace(&mut seen[id.0], true) {
                continue;
            }
            let n = &self.nodes[id.0];
            stack.extend(n.inputs.iter().chain(n.modulators.iter()).copied());
        }
        false
    }

    pub fn start(&mut self, id: NodeId, at: f64) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        if !node.kind.is_source() {
            return Err(GraphError::NotASource(id));
        }
        if node.schedule.start.is_some() {
            return Err(GraphError::AlreadyStarted(id));
        }
        node.schedule.start = Some(at.max(0.0));
        Ok(())
    }

    pub fn stop(&mut self, id: NodeId, at: f64) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        if !node.kind.is_source() {
            return Err(GraphError::NotASource(id));
        }
        node.schedule.stop = Some(at.max(0.0));
        Ok(())
    }

    /// Time at which the last source falls silent, `None` if any started
    /// source plays forever.
    pub fn duration(&self) -> Option<f64> {
        self.nodes
            .iter()
            .try_fold(0.0_f64, |acc, n| n.end_time().map(|e| acc.max(e)))
    }

    /// Render until every source has ended.
    pub fn render_to_end(self) -> Result<Vec<f64>, GraphError> {
        let duration = self.duration().ok_or(GraphError::Unbounded)?;
        // Tolerate float error so exact durations don't gain a frame.
        let frames = (duration * self.sample_rate - 1e-6).ceil().max(0.0) as usize;
        Ok(self.render(frames))
    }

    /// Render `frames` samples of the destination's mono output.
    pub fn render(mut self, frames: usize) -> Vec<f64> {
        let order = self.processing_order();
        debug!(nodes = self.nodes.len(), frames, "rendering audio graph");

        let mut outputs = vec![0.0_f64; self.nodes.len()];
        let mut rendered = Vec::with_capacity(frames);
        for frame in 0..frames {
            let t = frame as f64 / self.sample_rate;
            for &idx in &order {
                let node = &mut self.nodes[idx];
                let input: f64 = node.inputs.iter().map(|i| outputs[i.0]).sum();
                let modulation: f64 = node.modulators.iter().map(|m| outputs[m.0]).sum();
                outputs[idx] = node.process(t, input, modulation);
            }
            rendered.push(outputs[0]);
        }
        rendered
    }

    /// Dependencies before dependents. Connections are acyclic by construction.
    fn processing_order(&self) -> Vec<usize> {
        fn visit(graph: &AudioGraph, idx: usize, seen: &mut [bool], order: &mut Vec<usize>) {
            if seen[idx] {
                return;
            }
            seen[idx] = true;
            let node = &graph.nodes[idx];
            for dep in node.inputs.iter().chain(node.modulators.iter()) {
                visit(graph, dep.0, seen, order);
            }
            order.push(idx);
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        for idx in 0..self.nodes.len() {
            visit(self, idx, &mut seen, &mut order);
        }
        order
    }
}
