//! Linear ramp generator

use crate::message::Message;
use crate::node::{InletId, Input, MessageContext, ObjectKind, ProcessContext};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Segment {
    Hold,
    Ramp {
        /// Absolute sample index the ramp started at.
        start: u64,
        from: f32,
        to: f32,
        /// Ramp length in samples.
        length: f64,
    },
}

/// `line~`: holds a value, or ramps linearly to a target.
///
/// A single float jumps to that value. `target time_ms` ramps from the
/// current value, starting at the next processed sample. A float on inlet 1
/// sets the ramp time used by the next single float.
#[derive(Clone, Debug)]
pub struct Line {
    value: f32,
    segment: Segment,
    next_time: Option<f32>,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            value: 0.0,
            segment: Segment::Hold,
            next_time: None,
        }
    }
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn is_ramping(&self) -> bool {
        matches!(self.segment, Segment::Ramp { .. })
    }

    fn ramp_to(&mut self, to: f32, time_ms: f32, cx: &MessageContext<'_>) {
        let length = time_ms as f64 * cx.config().sample_rate as f64 / 1000.0;
        if length <= 0.0 {
            self.value = to;
            self.segment = Segment::Hold;
            return;
        }
        self.segment = Segment::Ramp {
            start: cx.block_start(),
            from: self.value,
            to,
            length,
        };
    }
}

impl ObjectKind for Line {
    fn process(&mut self, cx: &mut ProcessContext<'_>, _inputs: &[Input<'_>], outputs: &mut [Vec<f32>]) {
        let Some(out) = outputs.first_mut() else {
            return;
        };
        let block_start = cx.block_start();

        for (i, sample) in out.iter_mut().enumerate() {
            if let Segment::Ramp { start, from, to, length } = self.segment {
                let elapsed = (block_start + i as u64) as f64 - start as f64;
                if elapsed >= length {
                    self.value = to;
                    self.segment = Segment::Hold;
                } else {
                    self.value = (elapsed / length) as f32 * (to - from) + from;
                }
            }
            *sample = self.value;
        }
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        match inlet {
            InletId::Port(0) => {
                let atoms = msg.list_atoms();
                let floats: Option<Vec<f32>> = atoms.iter().map(|a| a.as_float()).collect();
                match floats.as_deref() {
                    Some([to]) => match self.next_time.take() {
                        Some(time) => self.ramp_to(*to, time, cx),
                        None => {
                            self.value = *to;
                            self.segment = Segment::Hold;
                        }
                    },
                    Some([to, time, ..]) => self.ramp_to(*to, *time, cx),
                    _ if msg.atoms().first().and_then(|a| a.as_symbol()) == Some("stop") => {
                        self.segment = Segment::Hold;
                    }
                    _ => cx.mismatch("float", msg),
                }
            }
            InletId::Port(1) => match msg.first_float() {
                Some(time) => self.next_time = Some(time),
                None => cx.mismatch("float", msg),
            },
            _ => {}
        }
    }
}
