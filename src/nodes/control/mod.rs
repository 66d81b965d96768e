//! Message-rate kinds.

mod binop;
mod flow;
mod io;
mod msg;
mod trigger;
mod value;

pub use binop::{Binop, BinopKind};
pub use flow::{Bang, Change, Moses, Select, Spigot, Swap};
pub use io::{Loadbang, Print, Receive};
pub use msg::MessageBox;
pub use trigger::{Conversion, Pack, SlotType, Trigger, Unpack};
pub use value::{FloatBox, Random, Toggle};

use crate::node::Rate;
use crate::registry::{KindDecl, KindRegistry};

use super::Object;

const ONE_OUT: &[Rate] = &[Rate::Message];

pub(crate) fn register(registry: &mut KindRegistry) {
    registry.register(
        KindDecl::new("msg", |_| Object::Msg(MessageBox::default()))
            .inlets(1)
            .outlets(ONE_OUT)
            .describe("message box"),
    );
    registry.register(
        KindDecl::new("receive", |_| Object::Receive(Receive::default()))
            .outlets(ONE_OUT)
            .describe("named receiver"),
    );
    registry.register(
        KindDecl::new("loadbang", |_| Object::Loadbang(Loadbang))
            .outlets(ONE_OUT)
            .describe("bang on the first frame"),
    );
    registry.register(
        KindDecl::new("print", |_| Object::Print(Print::default()))
            .inlets(1)
            .describe("log messages"),
    );
    registry.register(
        KindDecl::new("trigger", |args| Object::Trigger(Trigger::new(args)))
            .inlets(1)
            .describe("fan out right to left with conversion"),
    );
    registry.register(
        KindDecl::new("pack", |args| Object::Pack(Pack::new(args)))
            .inlets(2)
            .outlets(ONE_OUT)
            .describe("combine atoms into a list"),
    );
    registry.register(
        KindDecl::new("unpack", |args| Object::Unpack(Unpack::new(args)))
            .inlets(1)
            .describe("split a list into atoms"),
    );

    for (name, op) in BinopKind::ALL {
        registry.register(
            KindDecl::new(name, move |_| Object::Binop(Binop::new(op)))
                .inlets(2)
                .outlets(ONE_OUT)
                .describe("control arithmetic"),
        );
    }

    registry.register(
        KindDecl::new("float", |_| Object::Float(FloatBox::float()))
            .inlets(2)
            .outlets(ONE_OUT)
            .describe("store a float"),
    );
    registry.register(
        KindDecl::new("int", |_| Object::Float(FloatBox::int()))
            .inlets(2)
            .outlets(ONE_OUT)
            .describe("store an integer"),
    );
    registry.register(
        KindDecl::new("random", |_| Object::Random(Random::default()))
            .inlets(2)
            .outlets(ONE_OUT)
            .describe("pseudo-random integers"),
    );
    registry.register(
        KindDecl::new("bang", |_| Object::Bang(Bang))
            .inlets(1)
            .outlets(ONE_OUT)
            .describe("convert to bang"),
    );
    registry.register(
        KindDecl::new("tgl", |_| Object::Toggle(Toggle::default()))
            .inlets(1)
            .outlets(ONE_OUT)
            .describe("toggle"),
    );
    registry.register(
        KindDecl::new("spigot", |_| Object::Spigot(Spigot::default()))
            .inlets(2)
            .outlets(ONE_OUT)
            .describe("message gate"),
    );
    registry.register(
        KindDecl::new("moses", |_| Object::Moses(Moses::default()))
            .inlets(2)
            .outlets(&[Rate::Message, Rate::Message])
            .describe("split floats at a threshold"),
    );
    registry.register(
        KindDecl::new("swap", |_| Object::Swap(Swap::default()))
            .inlets(2)
            .outlets(&[Rate::Message, Rate::Message])
            .describe("exchange two floats"),
    );
    registry.register(
        KindDecl::new("select", |args| Object::Select(Select::new(args)))
            .inlets(2)
            .describe("match and bang"),
    );
    registry.register(
        KindDecl::new("change", |_| Object::Change(Change::default()))
            .inlets(1)
            .outlets(ONE_OUT)
            .describe("drop repeated floats"),
    );

    for (alias, target) in [
        ("r", "receive"),
        ("t", "trigger"),
        ("f", "float"),
        ("i", "int"),
        ("b", "bang"),
        ("bng", "bang"),
        ("sel", "select"),
    ] {
        registry.alias(alias, target);
    }
}
