//! Cosine and ramp oscillators

use crate::message::Message;
use crate::node::{InitContext, InletId, Input, MessageContext, ObjectKind, ProcessContext};

/// `osc~`: cosine oscillator, frequency in Hz from inlet 0.
///
/// The first argument seeds the frequency when inlet 0 is unconnected. A
/// float on inlet 1 resets the phase (in cycles).
#[derive(Clone, Debug, Default)]
pub struct Osc {
    phase: f64,
}

impl Osc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase in cycles.
    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }
}

impl ObjectKind for Osc {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        if let Some(freq) = cx.float_arg(0) {
            cx.set_inlet_constant(0, freq);
        }
        self.phase = 0.0;
    }

    fn process(&mut self, cx: &mut ProcessContext<'_>, inputs: &[Input<'_>], outputs: &mut [Vec<f32>]) {
        let Some(out) = outputs.first_mut() else {
            return;
        };
        let freq = inputs[0];
        let sample_rate = cx.sample_rate as f64;

        for (i, sample) in out.iter_mut().enumerate() {
            *sample = (core::f64::consts::TAU * self.phase).cos() as f32;
            self.phase += freq.at(i) as f64 / sample_rate;
        }
        self.phase -= self.phase.floor();
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        if inlet == InletId::Port(1) {
            match msg.first_float() {
                Some(phase) => self.phase = phase as f64,
                None => cx.mismatch("float", msg),
            }
        }
    }
}

/// `phasor~`: sawtooth ramping from 0 to 1 at the frequency on inlet 0.
#[derive(Clone, Debug, Default)]
pub struct Phasor {
    phase: f64,
}

impl Phasor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectKind for Phasor {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        if let Some(freq) = cx.float_arg(0) {
            cx.set_inlet_constant(0, freq);
        }
        self.phase = 0.0;
    }

    fn process(&mut self, cx: &mut ProcessContext<'_>, inputs: &[Input<'_>], outputs: &mut [Vec<f32>]) {
        let Some(out) = outputs.first_mut() else {
            return;
        };
        let freq = inputs[0];
        let sample_rate = cx.sample_rate as f64;

        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.phase as f32;
            self.phase = (self.phase + freq.at(i) as f64 / sample_rate).rem_euclid(1.0);
        }
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        if inlet == InletId::Port(1) {
            match msg.first_float() {
                Some(phase) => self.phase = (phase as f64).rem_euclid(1.0),
                None => cx.mismatch("float", msg),
            }
        }
    }
}
