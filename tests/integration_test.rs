use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use patchwerk::loader::FsLoader;
use patchwerk::node::{InletId, Input, MessageContext, ObjectKind, ProcessContext, Rate};
use patchwerk::nodes::Object;
use patchwerk::output::{NullSink, RtrbSink};
use patchwerk::registry::{KindDecl, KindRegistry};
use patchwerk::{Engine, EngineConfig, Error, Message, State};

const PATCHES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/patches");

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared record of every message a `rec` node received.
#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// `rec <label>`: appends "<label><inlet>: <message>" to the log.
struct Recorder {
    label: String,
    log: Log,
}

impl ObjectKind for Recorder {
    fn on_message(&mut self, inlet: InletId, msg: &Message, _cx: &mut MessageContext<'_>) {
        if let InletId::Port(port) = inlet {
            self.log.0.lock().unwrap().push(format!("{}{}: {}", self.label, port, msg));
        }
    }
}

/// `count~`: outputs 0.25 and counts how often it was processed.
struct Counter {
    ticks: Arc<AtomicUsize>,
}

impl ObjectKind for Counter {
    fn process(&mut self, _cx: &mut ProcessContext<'_>, _inputs: &[Input<'_>], outputs: &mut [Vec<f32>]) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        for out in outputs.iter_mut() {
            out.fill(0.25);
        }
    }
}

fn recording_registry(log: &Log) -> KindRegistry {
    let log = log.clone();
    let mut registry = KindRegistry::new();
    registry.register(
        KindDecl::new("rec", move |args| {
            Object::Custom(Box::new(Recorder {
                label: args.first().cloned().unwrap_or_default(),
                log: log.clone(),
            }))
        })
        .inlets(2)
        .describe("records messages"),
    );
    registry
}

fn load_recording(patch: &str) -> (Engine, Log) {
    init_logging();
    let log = Log::default();
    let engine = Engine::new(EngineConfig::default())
        .with_registry(recording_registry(&log))
        .load_str(patch)
        .unwrap();
    (engine, log)
}

fn left(frame: &[f32]) -> Vec<f32> {
    frame.iter().step_by(2).copied().collect()
}

#[test]
fn loads_patch_from_disk() {
    init_logging();
    let loader = FsLoader::new().with_root(PATCHES);
    let mut loaded = false;
    let engine = Engine::new(EngineConfig::default())
        .load_from(&loader, "sine.pd", |engine| {
            loaded = true;
            assert_eq!(engine.frame(), 0);
        })
        .unwrap();

    assert!(loaded);
    assert_eq!(engine.node_count(), 6);
    assert_eq!(engine.graph().wire_count(), 4);
    assert_eq!(engine.graph().endpoints().len(), 1);
    assert_eq!(engine.graph().node(3).unwrap().kind(), "text");
    assert_eq!(engine.state(), State::Idle);
}

#[test]
fn missing_patch_is_reported() {
    let loader = FsLoader::new().with_root(PATCHES);
    let result = Engine::new(EngineConfig::default()).load_from(&loader, "nope.pd", |_| {
        panic!("callback must not run");
    });
    assert!(matches!(result, Err(Error::NoSuchPatch(name)) if name == "nope.pd"));
}

#[test]
fn fan_out_source_is_ticked_once_per_frame() {
    init_logging();
    let ticks = Arc::new(AtomicUsize::new(0));
    let counted = ticks.clone();
    let mut registry = KindRegistry::new();
    registry.register(
        KindDecl::new("count~", move |_| {
            Object::Custom(Box::new(Counter {
                ticks: counted.clone(),
            }))
        })
        .outlets(&[Rate::Signal])
        .describe("counting source"),
    );

    let patch = "#X obj 0 0 count~;\n\
                 #X obj 0 0 +~;\n\
                 #X obj 0 0 *~ 2;\n\
                 #X obj 0 0 dac~;\n\
                 #X connect 0 0 1 0;\n\
                 #X connect 0 0 1 1;\n\
                 #X connect 0 0 2 0;\n\
                 #X connect 1 0 3 0;\n\
                 #X connect 2 0 3 1;\n";
    let mut engine = Engine::new(EngineConfig::new(48000, 16))
        .with_registry(registry)
        .load_str(patch)
        .unwrap();

    for frame in 1..=3 {
        let out = engine.render_frame();
        assert!(out.iter().all(|&s| s == 0.5));
        assert_eq!(ticks.load(Ordering::SeqCst), frame);
    }
    assert_eq!(engine.graph().node(0).unwrap().last_frame(), 3);
}

#[test]
fn constant_oscillator_times_gain_is_exact() {
    let patch = "#X obj 0 0 osc~ 0;\n\
                 #X obj 0 0 *~ 0.25;\n\
                 #X obj 0 0 dac~;\n\
                 #X connect 0 0 1 0;\n\
                 #X connect 1 0 2 0;\n\
                 #X connect 1 0 2 1;\n";
    let mut engine = Engine::load(EngineConfig::default(), patch).unwrap();
    for _ in 0..3 {
        assert!(engine.render_frame().iter().all(|&s| s == 0.25));
    }
}

#[test]
fn oscillator_stays_in_range() {
    let loader = FsLoader::new().with_root(PATCHES);
    let mut engine = Engine::new(EngineConfig::new(48000, 64))
        .load_from(&loader, "sine.pd", |_| {})
        .unwrap();
    for _ in 0..20 {
        let frame = engine.render_frame();
        assert!(frame.iter().all(|s| s.abs() <= 0.1 + 1e-6));
    }
}

#[test]
fn send_reaches_only_its_listeners() {
    let (mut engine, log) = load_recording(
        "#X obj 0 0 r a;\n\
         #X obj 0 0 r b;\n\
         #X obj 0 0 rec a;\n\
         #X obj 0 0 rec b;\n\
         #X connect 0 0 2 0;\n\
         #X connect 1 0 3 0;\n",
    );
    assert_eq!(engine.receivers("a").len(), 1);

    engine.send("a", 1.0);
    engine.send("nobody", "bang");
    assert_eq!(log.entries(), vec!["a0: 1"]);
}

#[test]
fn message_fan_out_keeps_the_last_wire() {
    let (mut engine, log) = load_recording(
        "#X obj 0 0 r in;\n\
         #X obj 0 0 rec a;\n\
         #X obj 0 0 rec b;\n\
         #X connect 0 0 1 0;\n\
         #X connect 0 0 2 0;\n",
    );
    assert_eq!(engine.graph().wire_count(), 1);
    engine.send("in", 3.0);
    assert_eq!(log.entries(), vec!["b0: 3"]);
}

#[test]
fn trigger_fires_right_to_left() {
    let (mut engine, log) = load_recording(
        "#X obj 0 0 r in;\n\
         #X obj 0 0 t f b;\n\
         #X obj 0 0 rec t;\n\
         #X connect 0 0 1 0;\n\
         #X connect 1 0 2 0;\n\
         #X connect 1 1 2 1;\n",
    );
    engine.send("in", 5.0);
    assert_eq!(log.entries(), vec!["t1: bang", "t0: 5"]);
}

#[test]
fn message_box_substitutes_and_routes() {
    let (mut engine, log) = load_recording(
        "#X obj 0 0 r in;\n\
         #X msg 0 0 \\$1 \\; out \\$1 2;\n\
         #X obj 0 0 r out;\n\
         #X obj 0 0 rec box;\n\
         #X obj 0 0 rec out;\n\
         #X connect 0 0 1 0;\n\
         #X connect 1 0 3 0;\n\
         #X connect 2 0 4 0;\n",
    );
    engine.send("in", 7.0);
    assert_eq!(log.entries(), vec!["box0: 7", "out0: 7 2"]);
}

#[test]
fn pack_and_unpack_round_trip_a_list() {
    let (mut engine, log) = load_recording(
        "#X obj 0 0 r in;\n\
         #X obj 0 0 pack 0 0;\n\
         #X obj 0 0 unpack 0 0;\n\
         #X obj 0 0 rec u;\n\
         #X connect 0 0 1 0;\n\
         #X connect 1 0 2 0;\n\
         #X connect 2 0 3 0;\n\
         #X connect 2 1 3 1;\n",
    );
    engine.send("in", "list 3 4");
    assert_eq!(log.entries(), vec!["u1: 4", "u0: 3"]);
}

#[test]
fn loadbang_fires_on_the_first_frame_only() {
    let (mut engine, log) = load_recording(
        "#X obj 0 0 loadbang;\n\
         #X obj 0 0 rec lb;\n\
         #X connect 0 0 1 0;\n",
    );
    assert!(log.entries().is_empty());
    engine.render_frame();
    engine.render_frame();
    assert_eq!(log.entries(), vec!["lb0: bang"]);
}

#[test]
fn message_loops_are_cut_off() {
    // a default-sized thread stack must survive the whole chain
    let handle = std::thread::spawn(|| {
        let (mut engine, log) = load_recording(
            "#X obj 0 0 r go;\n\
             #X obj 0 0 bang;\n\
             #X obj 0 0 t b b;\n\
             #X obj 0 0 rec loop;\n\
             #X connect 0 0 1 0;\n\
             #X connect 1 0 2 0;\n\
             #X connect 2 1 1 0;\n\
             #X connect 2 0 3 0;\n",
        );
        engine.send("go", "bang");
        let first = log.entries().len();
        // the engine stays usable after a cut-off chain
        engine.send("go", "bang");
        (first, log.entries().len())
    });
    let (first, second) = handle.join().unwrap();
    assert!(first > 0);
    assert!(first < 1000);
    assert_eq!(second, 2 * first);
}

#[test]
fn line_ramps_to_its_target() {
    init_logging();
    let patch = "#X obj 0 0 r ramp;\n\
                 #X obj 0 0 line~;\n\
                 #X obj 0 0 dac~;\n\
                 #X connect 0 0 1 0;\n\
                 #X connect 1 0 2 0;\n";
    let mut engine = Engine::load(EngineConfig::new(1000, 10), patch).unwrap();
    engine.send("ramp", "1 20");

    let first = left(engine.render_frame());
    assert_eq!(first[0], 0.0);
    assert!((first[1] - 0.05).abs() < 1e-6);
    assert!((first[9] - 0.45).abs() < 1e-6);

    let second = left(engine.render_frame());
    assert!((second[0] - 0.5).abs() < 1e-6);

    let third = left(engine.render_frame());
    assert!(third.iter().all(|&s| s == 1.0));

    engine.send("ramp", 0.25);
    assert!(left(engine.render_frame()).iter().all(|&s| s == 0.25));
}

#[test]
fn table_reads_follow_the_index_constant() {
    init_logging();
    let loader = FsLoader::new().with_root(PATCHES);
    let mut engine = Engine::new(EngineConfig::new(44100, 8))
        .load_from(&loader, "table.pd", |_| {})
        .unwrap();

    assert_eq!(engine.node_count(), 4);
    assert_eq!(engine.table("wave").unwrap().data(), &[0.5, 1.0, 1.5, 2.0]);

    let frame = engine.render_frame();
    assert_eq!(frame[0], 0.5);
    assert_eq!(frame[1], 0.0);

    engine.send("index", 2.0);
    assert_eq!(engine.render_frame()[0], 1.5);

    engine.send("index", 99.0);
    assert_eq!(engine.render_frame()[0], 2.0);
}

#[test]
fn table_writes_never_resize() {
    init_logging();
    let patch = "#X array t 3 float 0;\n\
                 #A 0 1 2 3;\n\
                 #A 2 7 8;\n\
                 #X restore 0 0 graph;\n\
                 #A 0 9;\n";
    let engine = Engine::load(EngineConfig::default(), patch).unwrap();
    let table = engine.table("t").unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.data(), &[1.0, 2.0, 3.0]);
}

#[test]
fn out_of_range_table_data_is_skipped() {
    init_logging();
    let patch = "#X array t 3 float 0;\n\
                 #A 18446744073709551615 1;\n\
                 #A 1 4;\n\
                 #X restore 0 0 graph;\n\
                 #X array huge 18446744073709551615 float 0;\n\
                 #A 0 1;\n\
                 #X restore 0 0 graph;\n";
    let engine = Engine::load(EngineConfig::default(), patch).unwrap();
    assert_eq!(engine.table("t").unwrap().data(), &[0.0, 4.0, 0.0]);
    assert!(engine.table("huge").is_none());
    assert_eq!(engine.node_count(), 1);
}

#[test]
fn unknown_kinds_and_bad_wires_are_skipped() {
    init_logging();
    let patch = "#X obj 0 0 frobnicate~ 1;\n\
                 #X obj 0 0 r x;\n\
                 #X obj 0 0;\n\
                 #X connect 1 0 0 3;\n\
                 #X connect 1 0 9 0;\n\
                 #X connect 1 4 2 0;\n";
    let engine = Engine::load(EngineConfig::default(), patch).unwrap();
    assert_eq!(engine.node_count(), 3);
    assert_eq!(engine.graph().node(0).unwrap().kind(), "frobnicate~");
    assert_eq!(engine.graph().node(2).unwrap().kind(), "null");
    assert_eq!(engine.graph().wire_count(), 1);
}

#[test]
fn signal_cycles_fail_to_load() {
    let patch = "#X obj 0 0 +~;\n\
                 #X obj 0 0 +~;\n\
                 #X obj 0 0 dac~;\n\
                 #X connect 0 0 1 0;\n\
                 #X connect 1 0 0 1;\n\
                 #X connect 1 0 2 0;\n";
    let result = Engine::load(EngineConfig::default(), patch);
    assert!(matches!(result, Err(Error::SignalCycle { .. })));
}

#[test]
fn runaway_sink_stops_the_engine() {
    init_logging();
    let mut engine = Engine::new(EngineConfig::default())
        .with_output(NullSink::default())
        .load_str("#X obj 0 0 osc~ 440;\n#X obj 0 0 dac~;\n#X connect 0 0 1 0;\n")
        .unwrap();

    let err = engine.play().unwrap_err();
    assert!(matches!(err, Error::RunawayGraph { iterations: 100 }));
    assert_eq!(engine.state(), State::Stopped);
    assert_eq!(engine.write().unwrap(), 0);
    assert_eq!(engine.frame(), 100);
}

#[test]
fn overflow_is_offered_before_a_new_frame() {
    init_logging();
    let (sink, mut consumer) = RtrbSink::with_capacity(200);
    let mut engine = Engine::new(EngineConfig::default())
        .with_output(sink)
        .load_str("#X obj 0 0 osc~ 0;\n#X obj 0 0 dac~;\n#X connect 0 0 1 0;\n")
        .unwrap();

    // 128 samples per frame: the second frame only fits partially
    assert_eq!(engine.play().unwrap(), 2);
    assert_eq!(consumer.slots(), 200);

    for _ in 0..100 {
        consumer.pop().unwrap();
    }
    // 56 leftover samples go first, then one more frame
    assert_eq!(engine.write().unwrap(), 1);
    assert_eq!(engine.frame(), 3);
    assert_eq!(consumer.slots(), 200);

    engine.stop();
    assert_eq!(engine.state(), State::Stopped);
    assert_eq!(engine.write().unwrap(), 0);
}
