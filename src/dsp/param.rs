//! Automatable parameters: scheduled value changes and ramps.
//!
//! Mirrors the WebAudio `AudioParam` automation model: a default value plus
//! a time-ordered list of events. A ramp event interpolates from the
//! previous event's time and value up to its own time; after the last event
//! the final value holds.

use crate::error::GraphError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Automation {
    Set { time: f64, value: f64 },
    Linear { time: f64, value: f64 },
    Exponential { time: f64, value: f64 },
}

impl Automation {
    fn time(&self) -> f64 {
        match *self {
            Automation::Set { time, .. }
            | Automation::Linear { time, .. }
            | Automation::Exponential { time, .. } => time,
        }
    }

    fn value(&self) -> f64 {
        match *self {
            Automation::Set { value, .. }
            | Automation::Linear { value, .. }
            | Automation::Exponential { value, .. } => value,
        }
    }
}

/// A parameter whose value can be scheduled over time (in seconds).
#[derive(Debug, Clone)]
pub struct AudioParam {
    pub default_value: f64,
    events: Vec<Automation>,
}

impl AudioParam {
    pub fn new(default_value: f64) -> Self {
        AudioParam {
            default_value,
            events: Vec::new(),
        }
    }

    /// Jump to `value` at `time`.
    pub fn set_value_at_time(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(Automation::Set { time, value });
        self
    }

    /// Ramp linearly from the previous event to `value`, arriving at `time`.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(Automation::Linear { time, value });
        self
    }

    /// Ramp exponentially from the previous event to `value`, arriving at `time`.
    ///
    /// Exponential interpolation is undefined for a target of zero, so
    /// non-positive targets are rejected.
    pub fn exponential_ramp_to_value_at_time(
        &mut self,
        value: f64,
        time: f64,
    ) -> Result<&mut Self, GraphError> {
        if !(value > 0.0) {
            return Err(GraphError::NonPositiveRampTarget(value));
        }
        self.insert(Automation::Exponential { time, value });
        Ok(self)
    }

    /// Intrinsic value at time `t` (excluding any connected modulation).
    pub fn value_at(&self, t: f64) -> f64 {
        let mut prev_time = 0.0;
        let mut prev_value = self.default_value;

        for event in &self.events {
            let time = event.time();
            if time <= t {
                prev_time = time;
                prev_value = event.value();
                continue;
            }

            // First event still in the future: interpolate towards it.
            let span = time - prev_time;
            let progress = if span > 0.0 { (t - prev_time) / span } else { 1.0 };
            return match *event {
                Automation::Set { .. } => prev_value,
                Automation::Linear { value, .. } => prev_value + (value - prev_value) * progress,
                Automation::Exponential { value, .. } => {
                    if prev_value > 0.0 {
                        prev_value * (value / prev_value).powf(progress)
                    } else {
                        prev_value
                    }
                }
            };
        }

        prev_value
    }

    /// Keep events sorted by time; events at equal times keep insertion order.
    fn insert(&mut self, event: Automation) {
        let idx = self
            .events
            .iter()
            .position(|e| e.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(idx, event);
    }
}
