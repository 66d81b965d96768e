use criterion::{black_box, criterion_group, criterion_main, Criterion};
use patchwerk::{Engine, EngineConfig};

const VOICE: &str = "#X obj 0 0 osc~ 440;\n\
                     #X obj 0 0 *~ 0.25;\n\
                     #X obj 0 0 dac~;\n\
                     #X connect 0 0 1 0;\n\
                     #X connect 1 0 2 0;\n\
                     #X connect 1 0 2 1;\n";

/// `voices` oscillators, each through its own gain into one `dac~` via a `+~` chain.
fn chord(voices: usize) -> String {
    let mut patch = String::from("#X obj 0 0 dac~;\n");
    let mut last_sum = None;
    for v in 0..voices {
        let osc = 1 + v * 3;
        patch.push_str(&format!("#X obj 0 0 osc~ {};\n", 220 + v * 55));
        patch.push_str("#X obj 0 0 *~ 0.1;\n");
        patch.push_str("#X obj 0 0 +~;\n");
        patch.push_str(&format!("#X connect {} 0 {} 0;\n", osc, osc + 1));
        patch.push_str(&format!("#X connect {} 0 {} 0;\n", osc + 1, osc + 2));
        if let Some(prev) = last_sum {
            patch.push_str(&format!("#X connect {} 0 {} 1;\n", prev, osc + 2));
        }
        last_sum = Some(osc + 2);
    }
    if let Some(sum) = last_sum {
        patch.push_str(&format!("#X connect {} 0 0 0;\n#X connect {} 0 0 1;\n", sum, sum));
    }
    patch
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("render_frame osc~ -> *~ -> dac~", |b| {
        let mut engine = Engine::load(EngineConfig::new(48000, 64), VOICE).unwrap();
        b.iter(|| black_box(engine.render_frame()[0]))
    });

    c.bench_function("render_frame 16-voice chord", |b| {
        let mut engine = Engine::load(EngineConfig::new(48000, 64), &chord(16)).unwrap();
        b.iter(|| black_box(engine.render_frame()[0]))
    });

    c.bench_function("send into message box", |b| {
        let patch = "#X obj 0 0 r in;\n#X msg 0 0 \\$1 \\; out \\$1;\n#X obj 0 0 r out;\n#X connect 0 0 1 0;\n";
        let mut engine = Engine::load(EngineConfig::default(), patch).unwrap();
        b.iter(|| engine.send("in", black_box(1.0)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
