//! Non-interpolating table lookup

use tracing::warn;

use crate::message::{Atom, Message};
use crate::node::{InitContext, InletId, Input, MessageContext, ObjectKind, ProcessContext};

/// `tabread~`: reads the named table at the index on inlet 0.
///
/// Indices are rounded and clamped to the table bounds. A missing or empty
/// table outputs silence. `set <name>` switches tables.
#[derive(Clone, Debug, Default)]
pub struct TabRead {
    table: Option<String>,
}

impl TabRead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }
}

impl ObjectKind for TabRead {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        if let Some(name) = cx.arg(0) {
            if !cx.has_table(name) {
                warn!("tabread~: {}: no such table", name);
            }
            self.table = Some(name.to_string());
        }
    }

    fn process(&mut self, cx: &mut ProcessContext<'_>, inputs: &[Input<'_>], outputs: &mut [Vec<f32>]) {
        let (Some(out), Some(index)) = (outputs.first_mut(), inputs.first()) else {
            return;
        };
        match self.table.as_deref().and_then(|name| cx.table(name)) {
            Some(table) => {
                for (i, sample) in out.iter_mut().enumerate() {
                    *sample = table.read_clamped(index.at(i));
                }
            }
            None => out.fill(0.0),
        }
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        if inlet != InletId::Port(0) {
            return;
        }
        match msg.atoms() {
            [Atom::Symbol(set), Atom::Symbol(name)] if set == "set" => {
                if cx.table(name).is_none() {
                    warn!("tabread~: {}: no such table", name);
                }
                self.table = Some(name.clone());
            }
            // the index constant is updated by the inlet observer
            [Atom::Float(_), ..] => {}
            _ => cx.mismatch("set <table>", msg),
        }
    }
}
