//! Load a patch file and render it, offline or to the sound card.
//!
//! Offline, prints the peak level of every rendered second:
//!
//!     cargo run --example render_patch -- tests/patches/sine.pd --seconds 2
//!
//! Live (needs the `cpal_sink` feature):
//!
//!     cargo run --example render_patch --features cpal_sink -- tests/patches/sine.pd --play
//!
//! `--send name=value` delivers a message to a receiver right after loading.
//! Set `RUST_LOG=debug` to see graph construction.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use patchwerk::loader::FsLoader;
use patchwerk::{Engine, EngineConfig};

#[derive(Parser, Debug)]
#[command(about = "Render a Pd-style patch")]
struct Args {
    /// Patch file to load
    patch: PathBuf,

    /// Seconds of audio to render
    #[arg(long, default_value_t = 1.0)]
    seconds: f32,

    /// Sample rate for offline rendering
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Samples per channel in one frame
    #[arg(long, default_value_t = 64)]
    buffer_size: usize,

    /// Messages to deliver after loading, as `receiver=message`
    #[arg(long = "send", value_parser = parse_send)]
    sends: Vec<(String, String)>,

    /// Play on the default output device instead of rendering offline
    #[arg(long)]
    play: bool,
}

fn parse_send(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected receiver=message, got '{}'", s))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if args.play {
        play(&args)
    } else {
        render(&args)
    }
}

fn load(config: EngineConfig, args: &Args) -> patchwerk::Result<Engine> {
    let location = args.patch.to_string_lossy();
    Engine::new(config).load_from(&FsLoader::new(), &location, |engine| {
        for (name, value) in &args.sends {
            engine.send(name, value.as_str());
        }
    })
}

fn render(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::new(args.sample_rate, args.buffer_size);
    let mut engine = load(config, args)?;
    println!("{} nodes, {} wires", engine.node_count(), engine.graph().wire_count());

    let frames_per_second = (config.sample_rate as usize / config.buffer_size).max(1);
    let total = (args.seconds * frames_per_second as f32) as usize;
    let mut peak = 0.0f32;
    for frame in 1..=total {
        peak = engine.render_frame().iter().fold(peak, |p, s| p.max(s.abs()));
        if frame % frames_per_second == 0 || frame == total {
            println!("{:>8.3}s  peak {:.4}", engine.time(), peak);
            peak = 0.0;
        }
    }
    Ok(())
}

#[cfg(feature = "cpal_sink")]
fn play(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    use std::thread::sleep;
    use std::time::{Duration, Instant};

    use patchwerk::output::CpalDevice;

    let device = CpalDevice::default_output().ok_or("no default output device")?;
    println!("Using: {} @ {}Hz", device.name(), device.sample_rate());

    let config = device.engine_config(args.buffer_size);
    let mut engine = load(config, args)?.with_output(device.create_sink(&config));

    engine.play()?;
    let start = Instant::now();
    while start.elapsed().as_secs_f32() < args.seconds {
        engine.write()?;
        sleep(Duration::from_millis(5));
    }
    engine.stop();
    Ok(())
}

#[cfg(not(feature = "cpal_sink"))]
fn play(_args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    Err("built without the cpal_sink feature".into())
}
