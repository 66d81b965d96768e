//! Ring buffer sink for handing audio to another thread

use rtrb::{Consumer, Producer, RingBuffer};

use super::OutputSink;

/// A sink that pushes interleaved audio into an rtrb ring buffer
///
/// Useful for:
/// - Feeding an audio callback running on another thread
/// - Recording/analysis
///
/// The sink wants data for as long as the ring buffer has free slots.
pub struct RtrbSink {
    producer: Producer<f32>,
}

impl RtrbSink {
    /// Create a sink that writes to the given producer
    pub fn new(producer: Producer<f32>) -> Self {
        Self { producer }
    }

    /// Create a ring buffer of `capacity` samples and a sink feeding it
    pub fn with_capacity(capacity: usize) -> (Self, Consumer<f32>) {
        let (producer, consumer) = RingBuffer::<f32>::new(capacity);
        (Self::new(producer), consumer)
    }

    /// Returns how many sample slots are available
    #[inline]
    pub fn available(&self) -> usize {
        self.producer.slots()
    }
}

impl OutputSink for RtrbSink {
    fn is_ready(&self) -> bool {
        !self.producer.is_full()
    }

    fn write(&mut self, samples: &[f32]) -> usize {
        let n = samples.len().min(self.producer.slots());
        for &sample in &samples[..n] {
            // Can't fail: we checked slots above
            let _ = self.producer.push(sample);
        }
        n
    }
}
