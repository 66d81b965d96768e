//! `trigger`, `pack` and `unpack`: ordering and (de)composing lists

use crate::error::Error;
use crate::message::{Atom, Message};
use crate::node::{InletId, MessageContext, ObjectKind, Rate, SlotLayout};

/// Conversion applied by one `trigger` outlet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conversion {
    Float,
    Symbol,
    Bang,
    Anything,
}

impl Conversion {
    pub fn parse(token: &str) -> Self {
        match token {
            "f" | "float" => Conversion::Float,
            "s" | "symbol" => Conversion::Symbol,
            "b" | "bang" => Conversion::Bang,
            _ => Conversion::Anything,
        }
    }

    fn convert(self, msg: &Message, cx: &MessageContext<'_>) -> Option<Message> {
        match self {
            Conversion::Bang => Some(Message::bang()),
            Conversion::Anything => Some(msg.clone()),
            Conversion::Float => match msg.first() {
                Some(Atom::Float(v)) => Some(Message::float(*v)),
                Some(Atom::Symbol(s)) if s == "symbol" => Some(Message::float(0.0)),
                _ => {
                    cx.report(Error::type_mismatch("trigger", "float", msg));
                    None
                }
            },
            Conversion::Symbol => match msg.first() {
                Some(Atom::Float(_)) => Some(Message::parse("symbol float")),
                Some(Atom::Symbol(s)) if s == "symbol" => Some(msg.clone()),
                _ => {
                    cx.report(Error::type_mismatch("trigger", "symbol", msg));
                    None
                }
            },
        }
    }
}

/// `trigger` / `t`: one outlet per argument, fired right to left.
///
/// With no arguments it behaves like `t a a`.
#[derive(Clone, Debug, Default)]
pub struct Trigger {
    conversions: Vec<Conversion>,
}

impl Trigger {
    pub fn new(args: &[String]) -> Self {
        let conversions = if args.is_empty() {
            vec![Conversion::Anything; 2]
        } else {
            args.iter().map(|a| Conversion::parse(a)).collect()
        };
        Self { conversions }
    }

    pub fn conversions(&self) -> &[Conversion] {
        &self.conversions
    }
}

impl ObjectKind for Trigger {
    fn preinit(&mut self, _args: &[String], layout: &mut SlotLayout) {
        layout.outlets = vec![Rate::Message; self.conversions.len()];
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        if inlet != InletId::Port(0) {
            return;
        }
        for (outlet, conversion) in self.conversions.iter().enumerate().rev() {
            if let Some(out) = conversion.convert(msg, cx) {
                cx.send(outlet, out);
            }
        }
    }
}

/// Element type of a `pack` or `unpack` slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotType {
    Float,
    Symbol,
}

fn slot_types(kind: &str, args: &[String]) -> Vec<(SlotType, Atom)> {
    if args.is_empty() {
        return vec![(SlotType::Float, Atom::Float(0.0)); 2];
    }
    args.iter()
        .map(|arg| match Atom::parse(arg) {
            Atom::Float(v) => (SlotType::Float, Atom::Float(v)),
            Atom::Symbol(s) if s == "f" || s == "float" => (SlotType::Float, Atom::Float(0.0)),
            Atom::Symbol(s) if s == "s" || s == "symbol" => (SlotType::Symbol, Atom::Symbol("symbol".to_string())),
            Atom::Symbol(s) => {
                tracing::error!("{}: {}: bad type", kind, s);
                (SlotType::Float, Atom::Float(0.0))
            }
        })
        .collect()
}

/// `pack`: collects atoms on its inlets and emits them as a list whenever
/// inlet 0 is hit.
///
/// A list on inlet 0 is spread across the inlets right to left.
#[derive(Clone, Debug, Default)]
pub struct Pack {
    slots: Vec<(SlotType, Atom)>,
}

impl Pack {
    pub fn new(args: &[String]) -> Self {
        Self {
            slots: slot_types("pack", args),
        }
    }

    /// Whether `atom` fits slot `inlet`, reporting a mismatch if not.
    fn fits(&self, inlet: usize, atom: &Atom, cx: &mut MessageContext<'_>) -> bool {
        let Some((ty, _)) = self.slots.get(inlet) else {
            return false;
        };
        match (ty, atom) {
            (SlotType::Float, Atom::Float(_)) | (SlotType::Symbol, Atom::Symbol(_)) => true,
            (SlotType::Float, _) => {
                cx.mismatch("float", &Message::from(vec![atom.clone()]));
                false
            }
            (SlotType::Symbol, _) => {
                cx.mismatch("symbol", &Message::from(vec![atom.clone()]));
                false
            }
        }
    }

    fn output(&self, cx: &mut MessageContext<'_>) {
        cx.send(0, Message::list(self.slots.iter().map(|(_, v)| v.clone())));
    }
}

impl ObjectKind for Pack {
    fn preinit(&mut self, _args: &[String], layout: &mut SlotLayout) {
        layout.inlets = self.slots.len();
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        let Some(inlet) = inlet.port() else {
            return;
        };
        if inlet == 0 && msg.is_bang() {
            self.output(cx);
            return;
        }

        let atoms = match msg.atoms() {
            [Atom::Symbol(s), value] if s == "symbol" => core::slice::from_ref(value),
            _ => msg.list_atoms(),
        };
        match atoms {
            [atom] => {
                if self.fits(inlet, atom, cx) {
                    self.slots[inlet].1 = atom.clone();
                    if inlet == 0 {
                        self.output(cx);
                    }
                }
            }
            _ if inlet == 0 => {
                let n = atoms.len().min(self.slots.len());
                // all slots or none
                let mut ok = true;
                for (i, atom) in atoms[..n].iter().enumerate().rev() {
                    ok &= self.fits(i, atom, cx);
                }
                if ok {
                    for (slot, atom) in self.slots.iter_mut().zip(&atoms[..n]) {
                        slot.1 = atom.clone();
                    }
                    self.output(cx);
                }
            }
            _ => cx.mismatch("single atom", msg),
        }
    }
}

/// `unpack`: spreads an inbound list across its outlets, right to left.
#[derive(Clone, Debug, Default)]
pub struct Unpack {
    slots: Vec<SlotType>,
}

impl Unpack {
    pub fn new(args: &[String]) -> Self {
        Self {
            slots: slot_types("unpack", args).into_iter().map(|(ty, _)| ty).collect(),
        }
    }
}

impl ObjectKind for Unpack {
    fn preinit(&mut self, _args: &[String], layout: &mut SlotLayout) {
        layout.outlets = vec![Rate::Message; self.slots.len()];
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        if inlet != InletId::Port(0) {
            return;
        }
        let atoms = msg.list_atoms();
        for (outlet, atom) in atoms.iter().enumerate().take(self.slots.len()).rev() {
            match (self.slots[outlet], atom) {
                (SlotType::Float, Atom::Float(v)) => cx.send(outlet, Message::float(*v)),
                (SlotType::Symbol, Atom::Symbol(s)) => cx.send(outlet, Message::parse(&format!("symbol {}", s))),
                (SlotType::Float, _) => cx.mismatch("float", msg),
                (SlotType::Symbol, _) => cx.mismatch("symbol", msg),
            }
        }
    }
}
