//! Control-rate arithmetic, comparison and logic

use crate::message::{Atom, Message};
use crate::node::{InitContext, InletId, MessageContext, ObjectKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinopKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinopKind {
    pub const ALL: [(&'static str, BinopKind); 14] = [
        ("+", BinopKind::Add),
        ("-", BinopKind::Sub),
        ("*", BinopKind::Mul),
        ("/", BinopKind::Div),
        ("mod", BinopKind::Mod),
        ("pow", BinopKind::Pow),
        ("==", BinopKind::Eq),
        ("!=", BinopKind::Ne),
        ("<", BinopKind::Lt),
        (">", BinopKind::Gt),
        ("<=", BinopKind::Le),
        (">=", BinopKind::Ge),
        ("&&", BinopKind::And),
        ("||", BinopKind::Or),
    ];

    pub fn apply(self, l: f32, r: f32) -> f32 {
        let truth = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            BinopKind::Add => l + r,
            BinopKind::Sub => l - r,
            BinopKind::Mul => l * r,
            BinopKind::Div if r == 0.0 => 0.0,
            BinopKind::Div => l / r,
            BinopKind::Mod => {
                let n = i128::from((r as i64).unsigned_abs().max(1));
                i128::from(l as i64).rem_euclid(n) as f32
            }
            BinopKind::Pow => {
                let v = l.powf(r);
                if v.is_finite() {
                    v
                } else {
                    0.0
                }
            }
            BinopKind::Eq => truth(l == r),
            BinopKind::Ne => truth(l != r),
            BinopKind::Lt => truth(l < r),
            BinopKind::Gt => truth(l > r),
            BinopKind::Le => truth(l <= r),
            BinopKind::Ge => truth(l >= r),
            BinopKind::And => truth(l != 0.0 && r != 0.0),
            BinopKind::Or => truth(l != 0.0 || r != 0.0),
        }
    }
}

/// Two-operand control object. Inlet 1 (or the first argument) holds the
/// right operand; a float on inlet 0 computes and outputs.
///
/// A list on inlet 0 sets both operands. A bang repeats the last left operand.
#[derive(Clone, Debug)]
pub struct Binop {
    op: BinopKind,
    left: f32,
    right: f32,
}

impl Binop {
    pub fn new(op: BinopKind) -> Self {
        Self {
            op,
            left: 0.0,
            right: 0.0,
        }
    }

    fn output(&self, cx: &mut MessageContext<'_>) {
        cx.send(0, Message::float(self.op.apply(self.left, self.right)));
    }
}

impl ObjectKind for Binop {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        self.right = cx.float_arg(0).unwrap_or(0.0);
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        match inlet {
            InletId::Port(0) => {
                if msg.is_bang() {
                    self.output(cx);
                    return;
                }
                match msg.list_atoms() {
                    [Atom::Float(l)] => self.left = *l,
                    [Atom::Float(l), Atom::Float(r), ..] => {
                        self.left = *l;
                        self.right = *r;
                    }
                    _ => return cx.mismatch("float", msg),
                }
                self.output(cx);
            }
            InletId::Port(1) => match msg.first_float() {
                Some(r) => self.right = r,
                None => cx.mismatch("float", msg),
            },
            _ => {}
        }
    }
}
