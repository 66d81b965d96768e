//! Core object trait and the contexts handed to its hooks.

use petgraph::graph::NodeIndex;
use tracing::error;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::Error;
use crate::graph::{InletBuffer, InletSlot};
use crate::message::{parse_float, Message};
use crate::router::{Emission, Receivers};
use crate::scheduler::Scheduler;
use crate::table::{Table, Tables};

/// Rate of an inlet or outlet, fixed once the node is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rate {
    /// A buffer recomputed every frame.
    Signal,
    /// Discrete, synchronously delivered events.
    Message,
}

/// Where a message arrived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InletId {
    /// A wired inlet.
    Port(usize),
    /// Injected from outside the graph through [`Engine::send`].
    External,
}

impl InletId {
    #[inline]
    pub fn port(self) -> Option<usize> {
        match self {
            InletId::Port(n) => Some(n),
            InletId::External => None,
        }
    }
}

/// Slot counts a kind may adjust from its arguments in [`ObjectKind::preinit`].
#[derive(Clone, Debug, PartialEq)]
pub struct SlotLayout {
    pub inlets: usize,
    pub outlets: Vec<Rate>,
}

static SILENCE: [f32; 1] = [0.0];

/// Read-only view of one inlet's buffer for the current frame.
///
/// Either the full buffer of the upstream outlet, or a single constant sample
/// that repeats for the whole frame.
#[derive(Clone, Copy, Debug)]
pub struct Input<'a> {
    samples: &'a [f32],
    signal: bool,
}

impl<'a> Input<'a> {
    pub(crate) fn signal(samples: &'a [f32]) -> Self {
        if samples.is_empty() {
            return Self::silent();
        }
        Self {
            samples,
            signal: true,
        }
    }

    pub(crate) fn constant(value: &'a f32) -> Self {
        Self {
            samples: core::slice::from_ref(value),
            signal: false,
        }
    }

    pub(crate) fn silent() -> Self {
        Self {
            samples: &SILENCE,
            signal: false,
        }
    }

    /// Sample `i` of the frame. Constant inputs return their value for every `i`.
    #[inline]
    pub fn at(&self, i: usize) -> f32 {
        self.samples[i % self.samples.len()]
    }

    /// Whether this input is aliased to an upstream signal outlet.
    #[inline]
    pub fn is_signal(&self) -> bool {
        self.signal
    }
}

/// Information available while computing a frame.
///
/// Passed to every [`ObjectKind::process`] call.
pub struct ProcessContext<'a> {
    /// Sample rate of the engine in Hz.
    pub sample_rate: u32,
    /// Samples per channel in one frame.
    pub buffer_size: usize,
    /// The frame being computed (first frame is 1).
    pub frame: u64,
    pub(crate) channels: usize,
    pub(crate) output: &'a mut [f32],
    pub(crate) tables: &'a Tables,
}

impl<'a> ProcessContext<'a> {
    pub(crate) fn new(config: &EngineConfig, frame: u64, output: &'a mut [f32], tables: &'a Tables) -> Self {
        Self {
            sample_rate: config.sample_rate,
            buffer_size: config.buffer_size,
            frame,
            channels: config.channels,
            output,
            tables,
        }
    }

    /// Absolute index of this frame's first sample.
    #[inline]
    pub fn block_start(&self) -> u64 {
        self.frame * self.buffer_size as u64
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Add `sample` into `channel` of the interleaved output at position `i`.
    #[inline]
    pub fn mix(&mut self, channel: usize, i: usize, sample: f32) {
        if channel < self.channels {
            if let Some(slot) = self.output.get_mut(i * self.channels + channel) {
                *slot += sample;
            }
        }
    }
}

/// Access granted to [`ObjectKind::init`], run once after the graph is wired.
pub struct InitContext<'a> {
    pub(crate) node: NodeIndex,
    pub(crate) kind: &'a str,
    pub(crate) args: &'a [String],
    pub(crate) inlets: &'a mut [InletSlot],
    pub(crate) receivers: &'a mut Receivers,
    pub(crate) scheduler: &'a mut Scheduler,
    pub(crate) tables: &'a Tables,
    pub(crate) config: &'a EngineConfig,
}

impl<'a> InitContext<'a> {
    #[inline]
    pub fn node(&self) -> NodeIndex {
        self.node
    }

    #[inline]
    pub fn kind(&self) -> &str {
        self.kind
    }

    /// Construction arguments (tokens after the kind name).
    #[inline]
    pub fn args(&self) -> &[String] {
        self.args
    }

    pub fn arg(&self, i: usize) -> Option<&str> {
        self.args.get(i).map(String::as_str)
    }

    pub fn float_arg(&self, i: usize) -> Option<f32> {
        self.arg(i).and_then(parse_float)
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Seed the constant buffer of an unconnected signal inlet.
    ///
    /// Returns `false` when the inlet is aliased to an upstream outlet, which
    /// this node must never write.
    pub fn set_inlet_constant(&mut self, inlet: usize, value: f32) -> bool {
        match self.inlets.get_mut(inlet).map(|slot| &mut slot.buffer) {
            Some(InletBuffer::Constant(v)) => {
                *v = value;
                true
            }
            _ => false,
        }
    }

    /// Register this node as a receiver for `name`.
    pub fn listen(&mut self, name: &str) {
        self.receivers.listen(name, self.node);
    }

    /// Run `action` once the engine clock reaches `at` seconds.
    pub fn schedule<F>(&mut self, at: f64, action: F)
    where
        F: FnOnce(&mut Engine) + Send + 'static,
    {
        self.scheduler.schedule(at, Box::new(action));
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.get(name).is_some()
    }
}

/// Access granted to [`ObjectKind::on_message`].
///
/// Output is queued and delivered depth-first, in order, once the handler
/// returns.
pub struct MessageContext<'a> {
    pub(crate) node: NodeIndex,
    pub(crate) kind: &'a str,
    pub(crate) frame: u64,
    pub(crate) rendering: bool,
    pub(crate) config: &'a EngineConfig,
    pub(crate) tables: &'a Tables,
    pub(crate) outbox: &'a mut Vec<Emission>,
}

impl<'a> MessageContext<'a> {
    #[inline]
    pub fn node(&self) -> NodeIndex {
        self.node
    }

    #[inline]
    pub fn kind(&self) -> &str {
        self.kind
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Last frame the engine started.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Absolute index of the first sample of the next block to be processed.
    pub fn block_start(&self) -> u64 {
        let frame = if self.rendering { self.frame } else { self.frame + 1 };
        frame * self.config.buffer_size as u64
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Emit `message` on one of this node's outlets.
    pub fn send(&mut self, outlet: usize, message: impl Into<Message>) {
        self.outbox.push(Emission::Outlet(outlet, message.into()));
    }

    /// Emit `message` to every node listening on `receiver`.
    pub fn send_to(&mut self, receiver: &str, message: impl Into<Message>) {
        self.outbox.push(Emission::Receiver(receiver.to_string(), message.into()));
    }

    /// Log a policy error against this node and carry on.
    pub fn report(&self, err: Error) {
        error!(node = self.node.index(), kind = self.kind, "{}", err);
    }

    /// Report a [`Error::TypeMismatch`] for `got`.
    pub fn mismatch(&self, expected: &'static str, got: &Message) {
        self.report(Error::type_mismatch(self.kind, expected, got));
    }
}

/// The hooks every object kind may implement. All default to no-ops.
///
/// Kinds are dispatched through [`Object`](crate::nodes::Object); plug in new
/// ones with [`Object::Custom`](crate::nodes::Object::Custom) and
/// [`KindRegistry::register`](crate::registry::KindRegistry::register).
///
/// ```
/// use patchwerk::node::{Input, ObjectKind, ProcessContext};
///
/// /// Outputs the absolute value of its input.
/// struct Abs;
///
/// impl ObjectKind for Abs {
///     fn process(&mut self, _cx: &mut ProcessContext<'_>, inputs: &[Input<'_>], outputs: &mut [Vec<f32>]) {
///         for (i, out) in outputs[0].iter_mut().enumerate() {
///             *out = inputs[0].at(i).abs();
///         }
///     }
/// }
/// ```
pub trait ObjectKind: Send {
    /// Runs right after construction, before any wiring. Variable-arity kinds
    /// grow their slot layout here.
    fn preinit(&mut self, _args: &[String], _layout: &mut SlotLayout) {}

    /// Runs once the graph is wired and inlet buffers are resolved, in
    /// ascending graph-index order.
    fn init(&mut self, _cx: &mut InitContext<'_>) {}

    /// Computes every signal outlet for the current frame. Inputs are
    /// guaranteed fresh.
    fn process(&mut self, _cx: &mut ProcessContext<'_>, _inputs: &[Input<'_>], _outputs: &mut [Vec<f32>]) {}

    /// Handles a message arriving on `inlet`.
    fn on_message(&mut self, _inlet: InletId, _msg: &Message, _cx: &mut MessageContext<'_>) {}
}

impl ObjectKind for Box<dyn ObjectKind> {
    fn preinit(&mut self, args: &[String], layout: &mut SlotLayout) {
        (**self).preinit(args, layout)
    }

    fn init(&mut self, cx: &mut InitContext<'_>) {
        (**self).init(cx)
    }

    fn process(&mut self, cx: &mut ProcessContext<'_>, inputs: &[Input<'_>], outputs: &mut [Vec<f32>]) {
        (**self).process(cx, inputs, outputs)
    }

    fn on_message(&mut self, inlet: InletId, msg: &Message, cx: &mut MessageContext<'_>) {
        (**self).on_message(inlet, msg, cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_input_repeats() {
        let v = 3.0;
        let input = Input::constant(&v);
        assert_eq!(input.at(0), 3.0);
        assert_eq!(input.at(63), 3.0);
        assert!(!input.is_signal());
    }

    #[test]
    fn empty_signal_reads_as_silence() {
        let input = Input::signal(&[]);
        assert_eq!(input.at(5), 0.0);
    }

    #[test]
    fn mix_interleaves() {
        let config = EngineConfig::new(44100, 4);
        let tables = Tables::default();
        let mut out = vec![0.0; 8];
        let mut cx = ProcessContext::new(&config, 1, &mut out, &tables);
        cx.mix(0, 1, 0.5);
        cx.mix(1, 1, 0.25);
        cx.mix(1, 1, 0.25);
        cx.mix(2, 1, 9.0);
        assert_eq!(out, vec![0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn external_has_no_port() {
        assert_eq!(InletId::External.port(), None);
        assert_eq!(InletId::Port(2).port(), Some(2));
    }
}
