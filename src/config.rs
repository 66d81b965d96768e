//! Engine configuration.

use serde::Deserialize;

use crate::error::Result;

/// Settings fixed for the lifetime of an [`Engine`](crate::Engine).
///
/// Build one with the builder methods, or read it from TOML:
///
/// ```
/// use patchwerk::EngineConfig;
///
/// let config = EngineConfig::from_toml("sample_rate = 48000\nbuffer_size = 128").unwrap();
/// assert_eq!(config.sample_rate, 48000);
/// assert_eq!(config.channels, 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per channel in one frame.
    pub buffer_size: usize,
    /// Interleaved output channels. `dac~` writes the first two.
    pub channels: usize,
    /// Upper bound on frames produced by one `write()` call.
    pub max_writes_per_drive: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 64,
            channels: 2,
            max_writes_per_drive: 100,
        }
    }
}

impl EngineConfig {
    /// Config with the given rate and buffer size, defaults elsewhere.
    pub fn new(sample_rate: u32, buffer_size: usize) -> Self {
        Self {
            sample_rate,
            buffer_size,
            ..Self::default()
        }
    }

    /// Parse a config from TOML. Missing keys keep their defaults.
    pub fn from_toml(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels.max(2);
        self
    }

    pub fn with_max_writes_per_drive(mut self, max: usize) -> Self {
        self.max_writes_per_drive = max.max(1);
        self
    }

    /// Length of one interleaved output frame.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.buffer_size * self.channels
    }

    /// Ring size, in samples, for a sink fed by `write()`.
    ///
    /// Roughly 100ms of audio, but never more than half of
    /// `max_writes_per_drive` frames, so filling it from empty cannot trip
    /// the runaway guard. Always at least one frame.
    pub fn sink_capacity(&self) -> usize {
        let latency = (self.sample_rate as usize / 10) * self.channels;
        let budget = (self.max_writes_per_drive / 2).max(1) * self.frame_len();
        latency.min(budget).max(self.frame_len())
    }

    /// Absolute time in seconds at the start of `frame`.
    #[inline]
    pub fn frame_time(&self, frame: u64) -> f64 {
        frame as f64 * self.buffer_size as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.frame_len(), 128);
        assert_eq!(c.max_writes_per_drive, 100);
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let c = EngineConfig::from_toml("buffer_size = 32\nmax_writes_per_drive = 5").unwrap();
        assert_eq!(c.buffer_size, 32);
        assert_eq!(c.sample_rate, 44100);
        assert_eq!(c.max_writes_per_drive, 5);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = EngineConfig::from_toml("sample_rate = \"fast\"").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn sink_capacity_fits_inside_one_drive() {
        let c = EngineConfig::new(48000, 64);
        assert_eq!(c.sink_capacity(), 50 * 128);

        let c = EngineConfig::new(8000, 64);
        assert_eq!(c.sink_capacity(), 1600);

        let c = EngineConfig::new(48000, 4096).with_max_writes_per_drive(1);
        assert_eq!(c.sink_capacity(), c.frame_len());
    }

    #[test]
    fn frame_time_uses_buffer_and_rate() {
        let c = EngineConfig::new(1000, 10);
        assert!((c.frame_time(3) - 0.03).abs() < 1e-12);
    }
}
