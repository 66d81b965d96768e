use super::OutputSink;

/// A sink that is always ready and throws samples away.
///
/// Counts what it was given, which makes it handy for offline rendering
/// and for exercising the runaway guard.
#[derive(Clone, Debug, Default)]
pub struct NullSink {
    written: usize,
}

impl NullSink {
    /// Samples accepted so far.
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }
}

impl OutputSink for NullSink {
    fn is_ready(&self) -> bool {
        true
    }

    fn write(&mut self, samples: &[f32]) -> usize {
        self.written += samples.len();
        samples.len()
    }
}
