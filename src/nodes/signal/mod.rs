//! Signal-rate kinds: oscillators, arithmetic, table lookup and ramps.

mod arith;
mod line;
mod osc;
mod tabread;

pub use arith::{mtof, Mtof, SignalBinop, SignalOp};
pub use line::Line;
pub use osc::{Osc, Phasor};
pub use tabread::TabRead;

use crate::node::Rate;
use crate::registry::{KindCategory, KindDecl, KindRegistry};

use super::Object;

pub(crate) fn register(registry: &mut KindRegistry) {
    registry.register(
        KindDecl::new("osc~", |_| Object::Osc(Osc::new()))
            .inlets(2)
            .outlets(&[Rate::Signal])
            .signal_inlets(&[0])
            .describe("cosine oscillator"),
    );
    registry.register(
        KindDecl::new("phasor~", |_| Object::Phasor(Phasor::new()))
            .inlets(2)
            .outlets(&[Rate::Signal])
            .signal_inlets(&[0])
            .describe("sawtooth from 0 to 1"),
    );

    for (name, op) in [
        ("+~", SignalOp::Add),
        ("-~", SignalOp::Sub),
        ("*~", SignalOp::Mul),
        ("/~", SignalOp::Div),
    ] {
        registry.register(
            KindDecl::new(name, move |_| Object::SignalBinop(SignalBinop::new(op)))
                .inlets(2)
                .outlets(&[Rate::Signal])
                .signal_inlets(&[0, 1])
                .describe("per-sample arithmetic"),
        );
    }

    registry.register(
        KindDecl::new("mtof~", |_| Object::Mtof(Mtof))
            .inlets(1)
            .outlets(&[Rate::Signal])
            .signal_inlets(&[0])
            .describe("MIDI note to frequency"),
    );
    registry.register(
        KindDecl::new("tabread~", |_| Object::TabRead(TabRead::new()))
            .inlets(1)
            .outlets(&[Rate::Signal])
            .signal_inlets(&[0])
            .describe("non-interpolating table lookup"),
    );
    registry.register(
        KindDecl::new("line~", |_| Object::Line(Line::new()))
            .inlets(2)
            .outlets(&[Rate::Signal])
            .category(KindCategory::Signal)
            .describe("linear ramp generator"),
    );
}
