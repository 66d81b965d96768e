//! Per-sample arithmetic on two signal inlets, plus `mtof~`

use crate::node::{InitContext, Input, ObjectKind, ProcessContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl SignalOp {
    #[inline]
    pub fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            SignalOp::Add => a + b,
            SignalOp::Sub => a - b,
            SignalOp::Mul => a * b,
            SignalOp::Div if b == 0.0 => 0.0,
            SignalOp::Div => a / b,
        }
    }
}

/// `+~`, `-~`, `*~` and `/~`. Division by zero yields zero.
///
/// The first argument seeds the right operand while inlet 1 is unconnected.
#[derive(Clone, Debug)]
pub struct SignalBinop {
    op: SignalOp,
}

impl SignalBinop {
    pub fn new(op: SignalOp) -> Self {
        Self { op }
    }

    pub fn add() -> Self {
        Self::new(SignalOp::Add)
    }

    #[inline]
    pub fn op(&self) -> SignalOp {
        self.op
    }
}

impl ObjectKind for SignalBinop {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        if let Some(value) = cx.float_arg(0) {
            cx.set_inlet_constant(1, value);
        }
    }

    fn process(&mut self, _cx: &mut ProcessContext<'_>, inputs: &[Input<'_>], outputs: &mut [Vec<f32>]) {
        let (Some(out), [a, b, ..]) = (outputs.first_mut(), inputs) else {
            return;
        };
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.op.apply(a.at(i), b.at(i));
        }
    }
}

/// `mtof~`: MIDI note number to frequency in Hz.
#[derive(Clone, Debug, Default)]
pub struct Mtof;

/// MIDI note to Hz with the input clamped to `1499`. Notes at or below `-1500` are silent.
#[inline]
pub fn mtof(note: f32) -> f32 {
    if note <= -1500.0 {
        0.0
    } else {
        8.175_798_915_64 * (0.057_762_265_0 * note.min(1499.0)).exp()
    }
}

impl ObjectKind for Mtof {
    fn process(&mut self, _cx: &mut ProcessContext<'_>, inputs: &[Input<'_>], outputs: &mut [Vec<f32>]) {
        let (Some(out), Some(note)) = (outputs.first_mut(), inputs.first()) else {
            return;
        };
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = mtof(note.at(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(SignalOp::Div.apply(3.0, 0.0), 0.0);
        assert_eq!(SignalOp::Div.apply(3.0, 2.0), 1.5);
        assert_eq!(SignalOp::Sub.apply(3.0, 2.0), 1.0);
    }

    #[test]
    fn mtof_reference_points() {
        assert!((mtof(69.0) - 440.0).abs() < 0.01);
        assert!((mtof(0.0) - 8.175_799).abs() < 1e-4);
        assert_eq!(mtof(-1500.0), 0.0);
        assert_eq!(mtof(5000.0), mtof(1499.0));
    }
}
