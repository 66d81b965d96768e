//! Kinds bridging the graph and the outside world: `receive`, `loadbang`, `print`.

use tracing::info;

use crate::message::Message;
use crate::node::{InitContext, InletId, MessageContext, ObjectKind};

/// `receive` / `r`: forwards externally sent messages for its name out of outlet 0.
#[derive(Clone, Debug, Default)]
pub struct Receive {
    name: Option<String>,
}

impl Receive {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl ObjectKind for Receive {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        if let Some(name) = cx.arg(0).map(str::to_string) {
            cx.listen(&name);
            self.name = Some(name);
        }
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        if inlet == InletId::External {
            cx.send(0, msg.clone());
        }
    }
}

/// `loadbang`: bangs outlet 0 once, on the first frame.
#[derive(Clone, Debug, Default)]
pub struct Loadbang;

impl ObjectKind for Loadbang {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        let node = cx.node();
        cx.schedule(0.0, move |engine| engine.emit(node, 0, &Message::bang()));
    }
}

/// `print`: logs every inbound message prefixed with its name (default `print`).
#[derive(Clone, Debug)]
pub struct Print {
    name: String,
}

impl Default for Print {
    fn default() -> Self {
        Self {
            name: "print".to_string(),
        }
    }
}

impl ObjectKind for Print {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        if let Some(name) = cx.arg(0) {
            self.name = name.to_string();
        }
    }

    fn on_message(&mut self, _inlet: InletId, msg: &Message, _cx: &mut MessageContext<'_>) {
        info!(target: "patchwerk::print", "{}: {}", self.name, msg);
    }
}
