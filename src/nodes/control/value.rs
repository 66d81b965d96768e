//! Stored values: `float`, `int`, `tgl` and `random`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::message::{Atom, Message};
use crate::node::{InitContext, InletId, MessageContext, ObjectKind};

/// `float` / `f` and `int` / `i`: stores a number, outputs it on bang.
///
/// A float on inlet 0 stores and outputs; on inlet 1 it only stores. The
/// integer variant truncates toward zero.
#[derive(Clone, Debug, Default)]
pub struct FloatBox {
    value: f32,
    integer: bool,
}

impl FloatBox {
    pub fn float() -> Self {
        Self::default()
    }

    pub fn int() -> Self {
        Self {
            value: 0.0,
            integer: true,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    fn store(&mut self, v: f32) {
        self.value = if self.integer { v.trunc() } else { v };
    }
}

impl ObjectKind for FloatBox {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        self.store(cx.float_arg(0).unwrap_or(0.0));
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        match inlet {
            InletId::Port(0) => {
                if let Some(v) = msg.first_float() {
                    self.store(v);
                } else if !msg.is_bang() {
                    return cx.mismatch("float", msg);
                }
                cx.send(0, Message::float(self.value));
            }
            InletId::Port(1) => match msg.first_float() {
                Some(v) => self.store(v),
                None => cx.mismatch("float", msg),
            },
            _ => {}
        }
    }
}

/// `tgl`: flips between 0 and 1 on bang. A float sets the state and passes
/// through as 0 or 1.
#[derive(Clone, Debug, Default)]
pub struct Toggle {
    on: bool,
}

impl Toggle {
    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl ObjectKind for Toggle {
    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        if inlet != InletId::Port(0) {
            return;
        }
        if msg.is_bang() {
            self.on = !self.on;
        } else if let Some(v) = msg.first_float() {
            self.on = v != 0.0;
        } else {
            return cx.mismatch("float", msg);
        }
        cx.send(0, Message::float(if self.on { 1.0 } else { 0.0 }));
    }
}

/// `random`: any message on inlet 0 outputs an integer in `0..range`.
///
/// `seed N` restarts the generator deterministically.
#[derive(Clone, Debug)]
pub struct Random {
    range: f32,
    rng: StdRng,
}

impl Default for Random {
    fn default() -> Self {
        Self {
            range: 1.0,
            rng: StdRng::from_entropy(),
        }
    }
}

impl Random {
    pub fn seeded(seed: u64) -> Self {
        Self {
            range: 1.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ObjectKind for Random {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        if let Some(range) = cx.float_arg(0) {
            self.range = range;
        }
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        match inlet {
            InletId::Port(0) => {
                if let [Atom::Symbol(s), Atom::Float(seed)] = msg.atoms() {
                    if s == "seed" {
                        self.rng = StdRng::seed_from_u64(*seed as u64);
                        return;
                    }
                }
                let range = self.range.max(1.0).floor();
                let v = (self.rng.gen::<f32>() * range).floor().min(range - 1.0);
                cx.send(0, Message::float(v));
            }
            InletId::Port(1) => match msg.first_float() {
                Some(range) => self.range = range,
                None => cx.mismatch("float", msg),
            },
            _ => {}
        }
    }
}
