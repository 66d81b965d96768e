//! Message delivery: outlet wires, receiver names and external sends.

use core::mem;

use hashbrown::HashMap;
use petgraph::graph::NodeIndex;
use tracing::{debug, error, trace};

use crate::engine::Engine;
use crate::message::Message;
use crate::node::{InletId, MessageContext, ObjectKind};

/// Nesting limit for synchronous message delivery.
pub(crate) const MAX_MESSAGE_DEPTH: usize = 1000;

/// Output queued by a message handler.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Emission {
    Outlet(usize, Message),
    Receiver(String, Message),
}

/// Nodes listening on each receiver name, in registration order.
#[derive(Clone, Debug, Default)]
pub struct Receivers {
    by_name: HashMap<String, Vec<NodeIndex>>,
}

impl Receivers {
    pub fn listen(&mut self, name: &str, node: NodeIndex) {
        self.by_name.entry(name.to_string()).or_default().push(node);
    }

    pub fn get(&self, name: &str) -> &[NodeIndex] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Pending step of a delivery chain, tagged with its nesting depth.
#[derive(Debug)]
enum Pending {
    Outlet(NodeIndex, usize, Message, usize),
    Receiver(String, Message, usize),
    Inlet(NodeIndex, InletId, Message, usize),
}

impl Engine {
    /// Deliver `value` to every node listening on `name`.
    ///
    /// Names nobody listens on are ignored.
    ///
    /// ```
    /// use patchwerk::{Engine, EngineConfig};
    ///
    /// let mut engine = Engine::load(EngineConfig::default(), "#X obj 0 0 r freq;\n").unwrap();
    /// engine.send("freq", 440.0);
    /// engine.send("nobody", "bang");
    /// ```
    pub fn send(&mut self, name: &str, value: impl Into<Message>) {
        self.run(vec![Pending::Receiver(name.to_string(), value.into(), 0)]);
    }

    /// Deliver `message` along the wire leaving `outlet` of `node`, if any.
    pub fn emit(&mut self, node: NodeIndex, outlet: usize, message: &Message) {
        self.run(vec![Pending::Outlet(node, outlet, message.clone(), 0)]);
    }

    /// Drain a delivery chain depth-first.
    ///
    /// The stack is popped from the end, so siblings are pushed in reverse to
    /// keep them in emission order. Targets are resolved when a step is
    /// popped, after every earlier sibling has run.
    fn run(&mut self, mut stack: Vec<Pending>) {
        while let Some(step) = stack.pop() {
            match step {
                Pending::Outlet(node, outlet, message, depth) => {
                    match self.graph.message_target(node, outlet) {
                        Some((target, inlet)) => {
                            stack.push(Pending::Inlet(target, InletId::Port(inlet), message, depth))
                        }
                        None => trace!(node = node.index(), outlet, "dropped {}", message),
                    }
                }
                Pending::Receiver(name, message, depth) => {
                    let listeners = self.receivers.get(&name);
                    debug!(receiver = %name, listeners = listeners.len(), "send {}", message);
                    stack.extend(
                        listeners
                            .iter()
                            .rev()
                            .map(|&node| Pending::Inlet(node, InletId::External, message.clone(), depth)),
                    );
                }
                Pending::Inlet(node, inlet, message, depth) => {
                    if depth >= MAX_MESSAGE_DEPTH {
                        error!(node = node.index(), "stack overflow");
                        continue;
                    }
                    let outbox = self.handle(node, inlet, &message);
                    stack.extend(outbox.into_iter().rev().map(|emission| match emission {
                        Emission::Outlet(outlet, out) => Pending::Outlet(node, outlet, out, depth + 1),
                        Emission::Receiver(name, out) => Pending::Receiver(name, out, depth + 1),
                    }));
                }
            }
        }
    }

    /// Run inlet observers and the kind's message hook, returning whatever
    /// the hook emitted.
    fn handle(&mut self, node: NodeIndex, inlet: InletId, message: &Message) -> Vec<Emission> {
        let mut outbox = Vec::new();
        if node.index() >= self.graph.len() {
            return outbox;
        }
        if let InletId::Port(port) = inlet {
            self.graph.observe(node, port, message);
        }

        let mut object = mem::take(&mut self.graph[node].object);
        {
            let mut cx = MessageContext {
                node,
                kind: &self.graph[node].kind,
                frame: self.frame,
                rendering: self.rendering,
                config: &self.config,
                tables: &self.tables,
                outbox: &mut outbox,
            };
            object.on_message(inlet, message, &mut cx);
        }
        self.graph[node].object = object;
        outbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receivers_keep_registration_order() {
        let mut r = Receivers::default();
        r.listen("a", NodeIndex::new(3));
        r.listen("a", NodeIndex::new(1));
        assert_eq!(r.get("a"), &[NodeIndex::new(3), NodeIndex::new(1)]);
        assert!(r.get("b").is_empty());
    }
}
