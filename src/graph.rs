//! Patch graph - owns nodes, their slots and the wires between them

use core::mem;
use core::ops::{Index, IndexMut};

use petgraph::graph::{EdgeIndex, NodeIndex, WalkNeighbors};
use petgraph::visit::EdgeRef;
use petgraph::Direction::{Incoming, Outgoing};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::message::Message;
use crate::node::{Input, ObjectKind, ProcessContext, Rate};
use crate::nodes::Object;

/// A connection from an outlet to an inlet. Its rate is the source outlet's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wire {
    pub outlet: usize,
    pub inlet: usize,
    pub rate: Rate,
}

/// What a signal inlet reads during `process`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InletBuffer {
    /// Not resolved yet, or a message inlet. Reads as silence.
    Unresolved,
    /// Shares the buffer of an upstream signal outlet.
    Aliased { node: NodeIndex, outlet: usize },
    /// Unconnected signal inlet holding one value for the whole frame.
    Constant(f32),
}

/// Side effect run on a message before the node's own handler sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observer {
    /// A leading float overwrites the inlet's constant buffer.
    SetConstant,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InletSlot {
    pub rate: Rate,
    pub buffer: InletBuffer,
    pub observers: Vec<Observer>,
}

impl InletSlot {
    pub fn new(rate: Rate) -> Self {
        Self {
            rate,
            buffer: InletBuffer::Unresolved,
            observers: Vec::new(),
        }
    }
}

/// One object instance in the patch.
pub struct Node {
    pub(crate) kind: String,
    pub(crate) args: Vec<String>,
    pub(crate) position: (i32, i32),
    pub(crate) endpoint: bool,
    pub(crate) inlets: Vec<InletSlot>,
    pub(crate) outlets: Vec<Rate>,
    pub(crate) outputs: Vec<Vec<f32>>,
    pub(crate) object: Object,
    pub(crate) frame: u64,
}

impl Node {
    /// Build a node with one zeroed buffer of `buffer_size` per signal outlet.
    pub fn new(
        kind: impl Into<String>,
        args: Vec<String>,
        position: (i32, i32),
        inlets: Vec<Rate>,
        outlets: Vec<Rate>,
        object: Object,
        buffer_size: usize,
    ) -> Self {
        let outputs = outlets
            .iter()
            .map(|rate| match rate {
                Rate::Signal => vec![0.0; buffer_size],
                Rate::Message => Vec::new(),
            })
            .collect();
        Self {
            kind: kind.into(),
            args,
            position,
            endpoint: false,
            inlets: inlets.into_iter().map(InletSlot::new).collect(),
            outlets,
            outputs,
            object,
            frame: 0,
        }
    }

    pub fn with_endpoint(mut self, endpoint: bool) -> Self {
        self.endpoint = endpoint;
        self
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[inline]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[inline]
    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    #[inline]
    pub fn is_endpoint(&self) -> bool {
        self.endpoint
    }

    #[inline]
    pub fn inlets(&self) -> &[InletSlot] {
        &self.inlets
    }

    #[inline]
    pub fn outlets(&self) -> &[Rate] {
        &self.outlets
    }

    /// Buffer of a signal outlet as of the last processed frame.
    pub fn outlet_buffer(&self, outlet: usize) -> Option<&[f32]> {
        match self.outlets.get(outlet) {
            Some(Rate::Signal) => self.outputs.get(outlet).map(Vec::as_slice),
            _ => None,
        }
    }

    /// Last frame this node was processed in. Zero before the first frame.
    #[inline]
    pub fn last_frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn object(&self) -> &Object {
        &self.object
    }

    fn is_placeholder(&self) -> bool {
        matches!(self.object, Object::Null(_))
    }
}

type InnerGraph = petgraph::graph::Graph<Node, Wire>;

/// The dual-rate patch graph. Node indices are the directive order of the
/// patch file and never change.
#[derive(Default)]
pub struct Graph {
    inner: InnerGraph,
    endpoints: Vec<NodeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        let endpoint = node.endpoint;
        let idx = self.inner.add_node(node);
        if endpoint {
            self.endpoints.push(idx);
        }
        idx
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.node_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn node(&self, idx: usize) -> Option<&Node> {
        self.inner.node_weight(NodeIndex::new(idx))
    }

    /// Nodes flagged as endpoints, in creation order.
    #[inline]
    pub fn endpoints(&self) -> &[NodeIndex] {
        &self.endpoints
    }

    pub fn wire_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Every wire as `(source, wire, sink)`.
    pub fn wires(&self) -> impl Iterator<Item = (NodeIndex, Wire, NodeIndex)> + '_ {
        self.inner.edge_references().map(|e| (e.source(), *e.weight(), e.target()))
    }

    /// Connect `outlet` of `source` to `inlet` of `sink`.
    ///
    /// Returns the wire's rate. A new wire replaces an existing signal wire
    /// into the same inlet, or an existing message wire out of the same outlet.
    pub fn connect(&mut self, source: usize, outlet: usize, sink: usize, inlet: usize) -> core::result::Result<Rate, String> {
        let (src, dst) = (NodeIndex::new(source), NodeIndex::new(sink));
        let rate = match self.inner.node_weight(src) {
            None => return Err(format!("no node {}", source)),
            Some(node) => match node.outlets.get(outlet) {
                Some(rate) => *rate,
                None => return Err(format!("{} ({}) has no outlet {}", node.kind, source, outlet)),
            },
        };
        match self.inner.node_weight_mut(dst) {
            None => return Err(format!("no node {}", sink)),
            Some(node) if inlet >= node.inlets.len() => {
                if !node.is_placeholder() {
                    return Err(format!("{} ({}) has no inlet {}", node.kind, sink, inlet));
                }
                node.inlets.resize_with(inlet + 1, || InletSlot::new(Rate::Message));
            }
            Some(_) => {}
        }

        let stale = match rate {
            Rate::Signal => self.signal_wire_into(dst, inlet),
            Rate::Message => self.message_wire_from(src, outlet),
        };
        if let Some(edge) = stale {
            debug!(source, outlet, sink, inlet, "replacing existing {:?} wire", rate);
            self.inner.remove_edge(edge);
        }

        self.inner.add_edge(src, dst, Wire { outlet, inlet, rate });
        trace!("connected {}:{} -> {}:{} ({:?})", source, outlet, sink, inlet, rate);
        Ok(rate)
    }

    fn signal_wire_into(&self, node: NodeIndex, inlet: usize) -> Option<EdgeIndex> {
        self.inner
            .edges_directed(node, Incoming)
            .find(|e| e.weight().rate == Rate::Signal && e.weight().inlet == inlet)
            .map(|e| e.id())
    }

    fn message_wire_from(&self, node: NodeIndex, outlet: usize) -> Option<EdgeIndex> {
        self.inner
            .edges_directed(node, Outgoing)
            .find(|e| e.weight().rate == Rate::Message && e.weight().outlet == outlet)
            .map(|e| e.id())
    }

    /// Upstream outlet feeding a signal inlet.
    pub fn signal_source(&self, node: NodeIndex, inlet: usize) -> Option<(NodeIndex, usize)> {
        self.signal_wire_into(node, inlet).and_then(|edge| {
            let (source, _) = self.inner.edge_endpoints(edge)?;
            Some((source, self.inner[edge].outlet))
        })
    }

    /// Inlet reached by a message leaving `outlet` of `node`.
    pub fn message_target(&self, node: NodeIndex, outlet: usize) -> Option<(NodeIndex, usize)> {
        self.message_wire_from(node, outlet).and_then(|edge| {
            let (_, target) = self.inner.edge_endpoints(edge)?;
            Some((target, self.inner[edge].inlet))
        })
    }

    /// Reject signal cycles, then point every signal inlet at its upstream
    /// buffer or at a constant.
    pub fn setup(&mut self) -> Result<()> {
        self.check_signal_cycles()?;

        for i in 0..self.inner.node_count() {
            let idx = NodeIndex::new(i);
            for inlet in 0..self.inner[idx].inlets.len() {
                if self.inner[idx].inlets[inlet].rate != Rate::Signal {
                    continue;
                }
                let source = self.signal_source(idx, inlet);
                let slot = &mut self.inner[idx].inlets[inlet];
                match source {
                    Some((node, outlet)) => slot.buffer = InletBuffer::Aliased { node, outlet },
                    None => {
                        slot.buffer = InletBuffer::Constant(0.0);
                        slot.observers.push(Observer::SetConstant);
                    }
                }
            }
        }
        Ok(())
    }

    fn check_signal_cycles(&self) -> Result<()> {
        if let Some(e) = self
            .inner
            .edge_references()
            .find(|e| e.weight().rate == Rate::Signal && e.source() == e.target())
        {
            return Err(Error::SignalCycle { node: e.source().index() });
        }
        let signal_only = self.inner.filter_map(
            |_, _| Some(()),
            |_, wire| if wire.rate == Rate::Signal { Some(()) } else { None },
        );
        petgraph::algo::toposort(&signal_only, None)
            .map(|_| ())
            .map_err(|cycle| Error::SignalCycle {
                node: cycle.node_id().index(),
            })
    }

    /// Run the inlet's observers on an inbound message.
    pub(crate) fn observe(&mut self, node: NodeIndex, inlet: usize, message: &Message) {
        let Some(slot) = self.inner.node_weight_mut(node).and_then(|n| n.inlets.get_mut(inlet)) else {
            return;
        };
        for observer in &slot.observers {
            match observer {
                Observer::SetConstant => {
                    if let (InletBuffer::Constant(v), Some(value)) = (&mut slot.buffer, message.first_float()) {
                        *v = value;
                    }
                }
            }
        }
    }

    /// Walker over the wires entering `node`.
    pub(crate) fn upstream(&self, node: NodeIndex) -> WalkNeighbors<u32> {
        self.inner.neighbors_directed(node, Incoming).detach()
    }

    /// Next source behind `walker` that feeds a signal wire and has not been
    /// processed in `frame` yet.
    pub(crate) fn next_stale_source(&self, walker: &mut WalkNeighbors<u32>, frame: u64) -> Option<NodeIndex> {
        while let Some((edge, source)) = walker.next(&self.inner) {
            if self.inner[edge].rate == Rate::Signal && self.inner[source].frame < frame {
                return Some(source);
            }
        }
        None
    }

    fn input_for<'a>(&'a self, slot: &'a InletSlot) -> Input<'a> {
        match &slot.buffer {
            InletBuffer::Aliased { node, outlet } => match self.inner[*node].outputs.get(*outlet) {
                Some(buffer) => Input::signal(buffer),
                None => Input::silent(),
            },
            InletBuffer::Constant(value) => Input::constant(value),
            InletBuffer::Unresolved => Input::silent(),
        }
    }

    /// Run the process hook of one node against its current inputs.
    pub(crate) fn process(&mut self, idx: NodeIndex, cx: &mut ProcessContext<'_>) {
        let mut object = mem::take(&mut self.inner[idx].object);
        let mut outputs = mem::take(&mut self.inner[idx].outputs);
        {
            let node = &self.inner[idx];
            let inputs: Vec<Input<'_>> = node.inlets.iter().map(|slot| self.input_for(slot)).collect();
            object.process(cx, &inputs, &mut outputs);
        }
        let node = &mut self.inner[idx];
        node.object = object;
        node.outputs = outputs;
        node.frame = cx.frame;
    }
}

impl Index<NodeIndex> for Graph {
    type Output = Node;

    fn index(&self, idx: NodeIndex) -> &Node {
        &self.inner[idx]
    }
}

impl IndexMut<NodeIndex> for Graph {
    fn index_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.inner[idx]
    }
}
