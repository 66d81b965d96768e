//! A small real-time patch runtime for Pd-style dataflow patches.
//!
//! A patch is text (the Pure Data `.pd` format) describing boxes and the
//! wires between them. [`Engine`] parses it once into a graph of nodes, then
//! renders that graph one frame of [`EngineConfig::buffer_size`] samples at a
//! time, while control messages travel between nodes and to named receivers.
//!
//! ```
//! use patchwerk::{Engine, EngineConfig};
//!
//! let patch = "\
//! #N canvas 0 0 450 300 10;
//! #X obj 10 10 r gain;
//! #X obj 10 40 osc~ 0;
//! #X obj 10 70 *~ 0;
//! #X obj 10 100 dac~;
//! #X connect 0 0 2 1;
//! #X connect 1 0 2 0;
//! #X connect 2 0 3 0;
//! #X connect 2 0 3 1;
//! ";
//! let mut engine = Engine::load(EngineConfig::new(48000, 64), patch).unwrap();
//! engine.send("gain", 0.5);
//!
//! let frame = engine.render_frame();
//! assert!(frame.iter().all(|&s| s == 0.5));
//! ```
//!
//! Signal wires carry buffers that are recomputed once per frame, pulled from
//! the sinks (`dac~`) upstream. Message wires carry [`Message`]s delivered
//! synchronously, depth first. Kinds live in a [`registry::KindRegistry`];
//! add your own through [`nodes::Object::Custom`].

pub mod config;
pub mod error;
pub mod graph;
pub mod loader;
pub mod message;
pub mod node;
pub mod nodes;
pub mod output;
pub mod parser;
pub mod registry;
pub mod scheduler;
pub mod table;

mod engine;
mod router;

pub use config::EngineConfig;
pub use engine::{Engine, State};
pub use error::{Error, Result};
pub use message::{Atom, Message};
pub use router::Receivers;
