//! Built-in object kinds.
//!
//! Kinds are organized into three groups:
//!
//! ## Signal ([`signal`])
//!
//! Compute a buffer every frame:
//! - [`Osc`] (`osc~`), [`Phasor`] (`phasor~`) - oscillators
//! - [`SignalBinop`] (`+~ -~ *~ /~`) - per-sample arithmetic
//! - [`Mtof`] (`mtof~`), [`TabRead`] (`tabread~`), [`Line`] (`line~`)
//!
//! ## Control ([`control`])
//!
//! React to messages:
//! - [`MessageBox`] (`msg`), [`Receive`] (`r`), [`Loadbang`], [`Print`]
//! - [`Trigger`] (`t`), [`Pack`], [`Unpack`]
//! - [`Binop`] (`+ - * / mod pow == != < > <= >= && ||`)
//! - [`FloatBox`] (`f`, `i`), [`Random`], [`Bang`], [`Toggle`] (`tgl`)
//! - [`Spigot`], [`Moses`], [`Swap`], [`Select`] (`sel`), [`Change`]
//!
//! ## Sinks ([`sink`])
//!
//! - [`Dac`] (`dac~`) - mixes into the engine output
//!
//! Structural kinds ([`Null`], [`TableNode`]) keep node indices aligned with
//! the patch file without doing any work.

pub mod control;
pub mod signal;
pub mod sink;
mod structural;

pub use control::*;
pub use signal::*;
pub use sink::Dac;
pub use structural::{Null, TableNode};

use crate::message::Message;
use crate::node::{InitContext, InletId, Input, MessageContext, ObjectKind, ProcessContext, SlotLayout};
use crate::registry::{KindCategory, KindDecl, KindRegistry};

/// Every kind the engine can instantiate.
///
/// Plug in kinds defined outside this crate through [`Object::Custom`].
#[enum_delegate::implement(ObjectKind,
    pub trait ObjectKind {
        fn preinit(&mut self, args: &[String], layout: &mut SlotLayout);
        fn init(&mut self, cx: &mut InitContext<'_>);
        fn process(&mut self, cx: &mut ProcessContext<'_>, inputs: &[Input<'_>], outputs: &mut [Vec<f32>]);
        fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>);
    }
)]
pub enum Object {
    Null(Null),
    Table(TableNode),

    Osc(Osc),
    Phasor(Phasor),
    SignalBinop(SignalBinop),
    Mtof(Mtof),
    TabRead(TabRead),
    Line(Line),
    Dac(Dac),

    Msg(MessageBox),
    Receive(Receive),
    Loadbang(Loadbang),
    Print(Print),
    Trigger(Trigger),
    Pack(Pack),
    Unpack(Unpack),
    Binop(Binop),
    Float(FloatBox),
    Random(Random),
    Bang(Bang),
    Toggle(Toggle),
    Spigot(Spigot),
    Moses(Moses),
    Swap(Swap),
    Select(Select),
    Change(Change),

    Custom(Box<dyn ObjectKind>),
}

impl Default for Object {
    fn default() -> Self {
        Object::Null(Null)
    }
}

pub(crate) fn register_builtins(registry: &mut KindRegistry) {
    registry.register(
        KindDecl::new("table", |_| Object::Table(TableNode::default()))
            .category(KindCategory::Structural)
            .describe("named sample table"),
    );
    registry.register(
        KindDecl::new("text", |_| Object::Null(Null))
            .category(KindCategory::Structural)
            .describe("comment"),
    );
    signal::register(registry);
    control::register(registry);
    sink::register(registry);
}
