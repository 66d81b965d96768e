//! Routing and gating of messages

use crate::message::{Atom, Message};
use crate::node::{InitContext, InletId, MessageContext, ObjectKind, Rate, SlotLayout};

/// `bang` / `bng` / `b`: turns anything into a bang.
#[derive(Clone, Debug, Default)]
pub struct Bang;

impl ObjectKind for Bang {
    fn on_message(&mut self, inlet: InletId, _msg: &Message, cx: &mut MessageContext<'_>) {
        if inlet == InletId::Port(0) {
            cx.send(0, Message::bang());
        }
    }
}

/// `spigot`: passes inlet 0 through while the control on inlet 1 is nonzero.
#[derive(Clone, Debug, Default)]
pub struct Spigot {
    open: bool,
}

impl ObjectKind for Spigot {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        self.open = cx.float_arg(0).is_some_and(|v| v != 0.0);
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        match inlet {
            InletId::Port(0) if self.open => cx.send(0, msg.clone()),
            InletId::Port(1) => match msg.first_float() {
                Some(v) => self.open = v != 0.0,
                None => cx.mismatch("float", msg),
            },
            _ => {}
        }
    }
}

/// `moses`: floats below the split point go left, the rest go right.
#[derive(Clone, Debug, Default)]
pub struct Moses {
    split: f32,
}

impl ObjectKind for Moses {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        self.split = cx.float_arg(0).unwrap_or(0.0);
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        let Some(v) = msg.first_float() else {
            return cx.mismatch("float", msg);
        };
        match inlet {
            InletId::Port(0) => cx.send(if v < self.split { 0 } else { 1 }, Message::float(v)),
            InletId::Port(1) => self.split = v,
            _ => {}
        }
    }
}

/// `swap`: outputs the stored right value on outlet 0 and the incoming left
/// value on outlet 1, right outlet first.
#[derive(Clone, Debug, Default)]
pub struct Swap {
    left: f32,
    right: f32,
}

impl ObjectKind for Swap {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        self.right = cx.float_arg(0).unwrap_or(0.0);
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        match inlet {
            InletId::Port(0) => {
                if let Some(v) = msg.first_float() {
                    self.left = v;
                } else if !msg.is_bang() {
                    return cx.mismatch("float", msg);
                }
                cx.send(1, Message::float(self.left));
                cx.send(0, Message::float(self.right));
            }
            InletId::Port(1) => match msg.first_float() {
                Some(v) => self.right = v,
                None => cx.mismatch("float", msg),
            },
            _ => {}
        }
    }
}

/// `select` / `sel`: bangs outlet `k` when the input equals argument `k`,
/// otherwise passes the input out of the last outlet.
#[derive(Clone, Debug, Default)]
pub struct Select {
    matches: Vec<Atom>,
}

impl Select {
    pub fn new(args: &[String]) -> Self {
        let matches = if args.is_empty() {
            vec![Atom::Float(0.0)]
        } else {
            args.iter().map(|a| Atom::parse(a)).collect()
        };
        Self { matches }
    }
}

impl ObjectKind for Select {
    fn preinit(&mut self, _args: &[String], layout: &mut SlotLayout) {
        layout.outlets = vec![Rate::Message; self.matches.len() + 1];
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        match inlet {
            InletId::Port(0) => {
                let value = match msg.atoms() {
                    [Atom::Symbol(s), value] if s == "symbol" => Some(value),
                    atoms => atoms.first(),
                };
                match value.and_then(|v| self.matches.iter().position(|m| m == v)) {
                    Some(k) => cx.send(k, Message::bang()),
                    None => cx.send(self.matches.len(), msg.clone()),
                }
            }
            InletId::Port(1) if self.matches.len() == 1 => match msg.first() {
                Some(atom) => self.matches[0] = atom.clone(),
                None => cx.mismatch("float", msg),
            },
            _ => {}
        }
    }
}

/// `change`: passes a float only when it differs from the previous one.
/// `set N` updates the stored value silently.
#[derive(Clone, Debug, Default)]
pub struct Change {
    last: Option<f32>,
}

impl ObjectKind for Change {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        self.last = cx.float_arg(0);
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        if inlet != InletId::Port(0) {
            return;
        }
        match msg.atoms() {
            [Atom::Float(v)] => {
                if self.last != Some(*v) {
                    self.last = Some(*v);
                    cx.send(0, Message::float(*v));
                }
            }
            [Atom::Symbol(s), Atom::Float(v)] if s == "set" => self.last = Some(*v),
            _ if msg.is_bang() => {
                if let Some(v) = self.last {
                    cx.send(0, Message::float(v));
                }
            }
            _ => cx.mismatch("float", msg),
        }
    }
}
