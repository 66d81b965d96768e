//! Message boxes

use itertools::Itertools;

use crate::message::{substitute, tokenize, Atom, Message};
use crate::node::{InitContext, InletId, MessageContext, ObjectKind};

/// `msg`: on any inbound message, emits its stored text with `$N`
/// placeholders filled in from that message.
///
/// The first `;`-separated message goes out of outlet 0, one part per `,`.
/// Every later message is addressed to the receiver named by its first atom.
/// `set ...` replaces the stored text without emitting.
#[derive(Clone, Debug, Default)]
pub struct MessageBox {
    value: String,
}

impl MessageBox {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    fn expand(part: &str, inbound: &Message, cx: &MessageContext<'_>) -> Message {
        let (text, errors) = substitute(part, inbound);
        for err in errors {
            cx.report(err);
        }
        Message::parse(&text)
    }
}

impl ObjectKind for MessageBox {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        self.value = cx.args().iter().join(" ");
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        if inlet != InletId::Port(0) {
            return;
        }
        if let Some((Atom::Symbol(selector), rest)) = msg.atoms().split_first() {
            if selector == "set" {
                self.value = rest.iter().join(" ");
                return;
            }
        }

        for (n, parts) in tokenize(&self.value).into_iter().enumerate() {
            if n == 0 {
                for part in &parts {
                    let out = Self::expand(part, msg, cx);
                    cx.send(0, out);
                }
                continue;
            }

            let mut receiver: Option<String> = None;
            for part in &parts {
                let out = Self::expand(part, msg, cx);
                let body = match receiver {
                    Some(_) => out,
                    None => match out.atoms().split_first() {
                        Some((Atom::Symbol(name), rest)) => {
                            receiver = Some(name.clone());
                            Message::from(rest.to_vec())
                        }
                        _ => {
                            cx.mismatch("receiver name", &out);
                            break;
                        }
                    },
                };
                if let Some(name) = &receiver {
                    if !body.is_empty() {
                        cx.send_to(name, body);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Emission;
    use crate::config::EngineConfig;
    use crate::table::Tables;
    use petgraph::graph::NodeIndex;

    fn fire(value: &str, inbound: &str) -> Vec<Emission> {
        let config = EngineConfig::default();
        let tables = Tables::default();
        let mut outbox = Vec::new();
        let mut cx = MessageContext {
            node: NodeIndex::new(0),
            kind: "msg",
            frame: 0,
            rendering: false,
            config: &config,
            tables: &tables,
            outbox: &mut outbox,
        };
        MessageBox::new(value).on_message(InletId::Port(0), &Message::parse(inbound), &mut cx);
        outbox
    }

    #[test]
    fn parts_go_out_of_outlet_zero_in_order() {
        let out = fire("bang, 1 2", "bang");
        assert_eq!(
            out,
            vec![
                Emission::Outlet(0, Message::bang()),
                Emission::Outlet(0, Message::parse("1 2")),
            ]
        );
    }

    #[test]
    fn later_messages_are_routed_by_first_atom() {
        let out = fire("go; freq $1, 880", "440");
        assert_eq!(
            out,
            vec![
                Emission::Outlet(0, Message::symbol("go")),
                Emission::Receiver("freq".into(), Message::float(440.0)),
                Emission::Receiver("freq".into(), Message::float(880.0)),
            ]
        );
    }

    #[test]
    fn leading_semicolon_is_plain_forwarding() {
        let out = fire("; hello 1", "bang");
        assert_eq!(out, vec![Emission::Outlet(0, Message::parse("hello 1"))]);
    }

    #[test]
    fn set_replaces_without_output() {
        let config = EngineConfig::default();
        let tables = Tables::default();
        let mut outbox = Vec::new();
        let mut cx = MessageContext {
            node: NodeIndex::new(0),
            kind: "msg",
            frame: 0,
            rendering: false,
            config: &config,
            tables: &tables,
            outbox: &mut outbox,
        };
        let mut m = MessageBox::new("old");
        m.on_message(InletId::Port(0), &Message::parse("set new 1"), &mut cx);
        assert!(cx.outbox.is_empty());
        assert_eq!(m.value(), "new 1");
    }
}
