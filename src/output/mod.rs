//! Output sinks the engine hands rendered frames to.
//!
//! A sink reports whether it wants more data and accepts interleaved
//! samples. It may take fewer samples than offered; the engine keeps the
//! rest and offers them again before rendering a new frame.
//!
//! - [`RtrbSink`] - lock-free ring buffer, for a consumer on another thread
//! - [`NullSink`] - always hungry, discards everything
//! - [`CpalSink`] - system audio device (requires the `cpal_sink` feature)

mod null;
mod ring;

#[cfg(feature = "cpal_sink")]
mod device;

pub use self::null::NullSink;
pub use self::ring::RtrbSink;

#[cfg(feature = "cpal_sink")]
pub use self::device::{CpalDevice, CpalSink};

/// Destination for interleaved output frames.
pub trait OutputSink: Send {
    /// Whether the sink wants more samples right now.
    fn is_ready(&self) -> bool;

    /// Offer interleaved samples. Returns how many were accepted, from the front.
    fn write(&mut self, samples: &[f32]) -> usize;
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn write(&mut self, samples: &[f32]) -> usize {
        (**self).write(samples)
    }
}
