//! Patch runtime - owns the graph, drives frames into an output sink

use core::mem;

use petgraph::graph::NodeIndex;
use tracing::{debug, error, info, trace, warn};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::graph::{Graph, Node};
use crate::loader::PatchLoader;
use crate::node::{InitContext, ObjectKind, ProcessContext};
use crate::output::OutputSink;
use crate::parser::{self, Directive, Statement};
use crate::registry::KindRegistry;
use crate::router::Receivers;
use crate::scheduler::Scheduler;
use crate::table::{Table, Tables};

/// Lifecycle of an [`Engine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Loaded, not producing audio yet.
    Idle,
    /// [`Engine::write`] renders frames whenever the sink wants data.
    Running,
    /// Stopped by the caller or by the runaway guard.
    Stopped,
}

/// The patch runtime.
///
/// An `Engine` parses a patch into a graph once, then renders it one frame
/// (of [`EngineConfig::buffer_size`] samples per channel) at a time.
///
/// # Loading a Patch
///
/// ```
/// use patchwerk::{Engine, EngineConfig};
///
/// let patch = "#X obj 10 10 osc~ 0;\n#X obj 10 60 dac~;\n#X connect 0 0 1 0;\n";
/// let mut engine = Engine::load(EngineConfig::new(44100, 64), patch).unwrap();
/// assert_eq!(engine.graph().len(), 2);
///
/// let frame = engine.render_frame();
/// assert_eq!(frame.len(), 128);
/// assert_eq!(frame[0], 1.0);
/// ```
///
/// # Driving an Output
///
/// Attach a sink with [`with_output`](Self::with_output), call
/// [`play`](Self::play), then call [`write`](Self::write) periodically. Each
/// `write` renders frames until the sink stops asking for data.
///
/// ```
/// use patchwerk::{Engine, EngineConfig};
/// use patchwerk::output::RtrbSink;
///
/// let (sink, mut consumer) = RtrbSink::with_capacity(512);
/// let mut engine = Engine::new(EngineConfig::default())
///     .with_output(sink)
///     .load_str("#X obj 0 0 osc~ 440;\n#X obj 0 0 dac~;\n#X connect 0 0 1 0;\n")
///     .unwrap();
///
/// engine.play().unwrap();
/// assert_eq!(consumer.slots(), 512);
/// ```
pub struct Engine {
    pub(crate) config: EngineConfig,
    registry: KindRegistry,
    pub(crate) graph: Graph,
    pub(crate) tables: Tables,
    pub(crate) receivers: Receivers,
    pub(crate) scheduler: Scheduler,

    pub(crate) frame: u64,
    pub(crate) rendering: bool,

    output: Vec<f32>,
    overflow: Vec<f32>,
    state: State,
    sink: Option<Box<dyn OutputSink>>,
    loaded: bool,
}

impl Engine {
    /// Create an empty engine with the built-in kinds.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            output: vec![0.0; config.frame_len()],
            config,
            registry: KindRegistry::new(),
            graph: Graph::new(),
            tables: Tables::default(),
            receivers: Receivers::default(),
            scheduler: Scheduler::new(),
            frame: 0,
            rendering: false,
            overflow: Vec::new(),
            state: State::Idle,
            sink: None,
            loaded: false,
        }
    }

    /// Parse `source` into a new engine.
    pub fn load(config: EngineConfig, source: &str) -> Result<Self> {
        Self::new(config).load_str(source)
    }

    /// Replace the kind registry (builder pattern). Use this to add custom kinds.
    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Attach the output sink (builder pattern).
    pub fn with_output<S: OutputSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Build the graph from patch text, then wire and initialize it.
    ///
    /// Malformed directives are logged and skipped. Fails only when signal
    /// connections form a cycle, or when a patch was already loaded.
    pub fn load_str(mut self, source: &str) -> Result<Self> {
        if self.loaded {
            return Err(Error::AlreadyLoaded);
        }
        self.loaded = true;

        let mut open_table: Option<String> = None;
        for statement in parser::parse(source) {
            match statement {
                Ok(statement) => self.apply(statement, &mut open_table),
                Err(err) => warn!("{}", err),
            }
        }

        self.graph.setup()?;
        for i in 0..self.graph.len() {
            self.init_node(NodeIndex::new(i));
        }
        debug!(
            nodes = self.graph.len(),
            wires = self.graph.wire_count(),
            endpoints = self.graph.endpoints().len(),
            "patch loaded"
        );
        Ok(self)
    }

    /// Fetch a patch through `loader`, build it, then hand the ready engine
    /// to `on_loaded`.
    pub fn load_from<L, F>(self, loader: &L, location: &str, on_loaded: F) -> Result<Self>
    where
        L: PatchLoader + ?Sized,
        F: FnOnce(&mut Engine),
    {
        let source = loader.fetch(location).map_err(|err| {
            error!("{}", err);
            err
        })?;
        let mut engine = self.load_str(&source)?;
        on_loaded(&mut engine);
        Ok(engine)
    }

    fn apply(&mut self, statement: Statement, open_table: &mut Option<String>) {
        let Statement { line, directive } = statement;
        match directive {
            Directive::Object { position, kind, args } => {
                self.create_node(&kind, position, args);
            }
            Directive::Message { position, text } => {
                self.create_node("msg", position, text);
            }
            Directive::Text { position, text } => {
                self.create_node("text", position, text);
            }
            Directive::Array { name, size, args } => {
                self.tables.create(&name, size);
                let mut table_args = vec![name.clone(), size.to_string()];
                table_args.extend(args);
                self.create_node("table", (0, 0), table_args);
                *open_table = Some(name);
            }
            Directive::Restore => *open_table = None,
            Directive::Connect {
                source,
                outlet,
                sink,
                inlet,
            } => {
                if let Err(reason) = self.graph.connect(source, outlet, sink, inlet) {
                    warn!("{}", Error::malformed(line, format!("connect {} {} {} {}: {}", source, outlet, sink, inlet, reason)));
                }
            }
            Directive::Fill { start, values } => {
                let result = match open_table.as_deref() {
                    Some(name) => match self.tables.get_mut(name) {
                        Some(table) => table.write(start, &values),
                        None => Err(Error::malformed(line, format!("table '{}' vanished", name))),
                    },
                    None => Err(Error::malformed(line, "got table data outside of a table")),
                };
                if let Err(err) = result {
                    error!("{}", err);
                }
            }
            Directive::Ignored => {}
        }
    }

    fn create_node(&mut self, kind: &str, position: (i32, i32), args: Vec<String>) -> NodeIndex {
        let kind = if kind.is_empty() { "null" } else { kind };
        let decl = self.registry.resolve(kind);
        let (mut object, mut layout) = decl.build(&args);
        object.preinit(&args, &mut layout);

        let inlets = (0..layout.inlets).map(|i| decl.inlet_rate(i)).collect();
        let endpoint = decl.endpoint;
        let node = Node::new(kind, args, position, inlets, layout.outlets, object, self.config.buffer_size)
            .with_endpoint(endpoint);
        let idx = self.graph.add_node(node);
        trace!("added {} at index {}", kind, idx.index());
        idx
    }

    fn init_node(&mut self, idx: NodeIndex) {
        let mut object = mem::take(&mut self.graph[idx].object);
        {
            let node = &mut self.graph[idx];
            let mut cx = InitContext {
                node: idx,
                kind: &node.kind,
                args: &node.args,
                inlets: &mut node.inlets,
                receivers: &mut self.receivers,
                scheduler: &mut self.scheduler,
                tables: &self.tables,
                config: &self.config,
            };
            object.init(&mut cx);
        }
        self.graph[idx].object = object;
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Number of nodes in the loaded patch, comments and placeholders included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    #[inline]
    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Nodes listening on receiver `name`.
    pub fn receivers(&self, name: &str) -> &[NodeIndex] {
        self.receivers.get(name)
    }

    /// Frames started so far. Never reset.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Absolute engine time in seconds at the start of the current frame.
    #[inline]
    pub fn time(&self) -> f64 {
        self.config.frame_time(self.frame)
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// The most recently rendered interleaved frame.
    #[inline]
    pub fn output(&self) -> &[f32] {
        &self.output
    }

    /// Run `action` at the start of the first frame whose time is at or past
    /// `at` seconds.
    pub fn schedule<F>(&mut self, at: f64, action: F)
    where
        F: FnOnce(&mut Engine) + Send + 'static,
    {
        self.scheduler.schedule(at, Box::new(action));
    }

    /// Compute `node` for the current frame, pulling every stale upstream
    /// signal source first.
    pub fn tick(&mut self, node: NodeIndex) {
        let mut upstream = self.graph.upstream(node);
        while let Some(source) = self.graph.next_stale_source(&mut upstream, self.frame) {
            self.tick(source);
        }
        let mut cx = ProcessContext::new(&self.config, self.frame, &mut self.output, &self.tables);
        self.graph.process(node, &mut cx);
    }

    /// Advance one frame: run due callbacks, clear the output, then tick
    /// every endpoint.
    pub fn render_frame(&mut self) -> &[f32] {
        self.frame += 1;
        self.rendering = true;

        let now = self.config.frame_time(self.frame);
        for action in self.scheduler.take_due(now) {
            action(self);
        }

        self.output.fill(0.0);
        for i in 0..self.graph.endpoints().len() {
            let endpoint = self.graph.endpoints()[i];
            self.tick(endpoint);
        }

        self.rendering = false;
        &self.output
    }

    /// Start producing audio, filling the sink once right away.
    pub fn play(&mut self) -> Result<usize> {
        if self.state == State::Running {
            debug!("Already started.");
            return Ok(0);
        }
        info!("Starting audio.");
        self.state = State::Running;
        self.write()
    }

    pub fn stop(&mut self) {
        if self.state != State::Running {
            debug!("Already stopped.");
            return;
        }
        info!("Stopping audio.");
        self.state = State::Stopped;
        self.overflow.clear();
    }

    /// Render and hand off frames while the sink wants more data.
    ///
    /// Returns the number of frames rendered. Samples the sink could not
    /// take are kept and offered first on the next iteration. Fails with
    /// [`Error::RunawayGraph`] and stops the engine when the sink is still
    /// hungry after [`EngineConfig::max_writes_per_drive`] iterations.
    pub fn write(&mut self) -> Result<usize> {
        if self.state != State::Running {
            trace!("write() while {:?}", self.state);
            return Ok(0);
        }
        if self.sink.is_none() {
            warn!("no output sink attached");
            return Ok(0);
        }

        let cap = self.config.max_writes_per_drive;
        let mut iterations = 0;
        let mut frames = 0;
        while self.sink.as_ref().is_some_and(|sink| sink.is_ready()) {
            if iterations >= cap {
                self.state = State::Stopped;
                let err = Error::RunawayGraph { iterations };
                error!("{}", err);
                return Err(err);
            }
            iterations += 1;

            if self.overflow.is_empty() {
                self.render_frame();
                if let Some(sink) = self.sink.as_mut() {
                    let accepted = sink.write(&self.output).min(self.output.len());
                    self.overflow.extend_from_slice(&self.output[accepted..]);
                }
                frames += 1;
            } else if let Some(sink) = self.sink.as_mut() {
                let accepted = sink.write(&self.overflow).min(self.overflow.len());
                self.overflow.drain(..accepted);
            }
        }
        Ok(frames)
    }
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("nodes", &self.graph.len())
            .field("frame", &self.frame)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{NullSink, RtrbSink};

    #[test]
    fn second_load_is_rejected() {
        let engine = Engine::load(EngineConfig::default(), "#X obj 0 0 dac~;\n").unwrap();
        assert!(matches!(engine.load_str(""), Err(Error::AlreadyLoaded)));
    }

    #[test]
    fn frame_counter_survives_stop_and_play() {
        let mut engine = Engine::new(EngineConfig::default())
            .with_output(NullSink::default())
            .load_str("")
            .unwrap();
        engine.render_frame();
        engine.render_frame();
        engine.stop();
        assert_eq!(engine.state(), State::Idle);
        assert_eq!(engine.frame(), 2);

        assert!(engine.play().is_err());
        engine.stop();
        assert_eq!(engine.frame(), 2 + 100);
    }

    #[test]
    fn write_without_play_does_nothing() {
        let mut engine = Engine::new(EngineConfig::default()).with_output(NullSink::default());
        assert_eq!(engine.write().unwrap(), 0);
        assert_eq!(engine.frame(), 0);
    }

    #[test]
    fn runaway_sink_stops_the_engine() {
        let config = EngineConfig::default().with_max_writes_per_drive(10);
        let mut engine = Engine::new(config)
            .with_output(NullSink::default())
            .load_str("#X obj 0 0 dac~;\n")
            .unwrap();
        let err = engine.play().unwrap_err();
        assert!(matches!(err, Error::RunawayGraph { iterations: 10 }));
        assert_eq!(engine.state(), State::Stopped);
        assert_eq!(engine.frame(), 10);
    }

    #[test]
    fn device_sized_ring_fills_within_one_drive() {
        let config = EngineConfig::new(48000, 64);
        let (sink, mut consumer) = RtrbSink::with_capacity(config.sink_capacity());
        let mut engine = Engine::new(config)
            .with_output(sink)
            .load_str("#X obj 0 0 osc~ 440;\n#X obj 0 0 dac~;\n#X connect 0 0 1 0;\n")
            .unwrap();

        assert_eq!(engine.play().unwrap(), 50);
        assert_eq!(engine.state(), State::Running);
        assert_eq!(consumer.slots(), config.sink_capacity());

        // a device pulling a few frames leaves room for exactly that many
        for _ in 0..3 * config.frame_len() {
            consumer.pop().unwrap();
        }
        assert_eq!(engine.write().unwrap(), 3);
        assert_eq!(engine.state(), State::Running);
    }

    #[test]
    fn scheduled_actions_run_at_their_frame() {
        let config = EngineConfig::new(1000, 10);
        let mut engine = Engine::load(config, "").unwrap();
        engine.schedule(0.025, |e| e.schedule(0.0, |_| {}));
        engine.render_frame();
        engine.render_frame();
        assert_eq!(engine.scheduler.len(), 1);
        engine.render_frame();
        // the nested action is already due, so it waits for the next frame
        assert_eq!(engine.scheduler.len(), 1);
        engine.render_frame();
        assert!(engine.scheduler.is_empty());
    }
}
