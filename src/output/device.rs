//! CPAL device discovery and output sink

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SupportedStreamConfig};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{error, warn};

use super::OutputSink;
use crate::config::EngineConfig;

/// A discovered audio output device
pub struct CpalDevice {
    device: cpal::Device,
    config: SupportedStreamConfig,
    name: String,
}

impl CpalDevice {
    /// Get the default output device
    pub fn default_output() -> Option<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device()?;
        let config = device.default_output_config().ok()?;
        let name = device.name().unwrap_or_else(|_| "Unknown".into());
        Some(Self { device, config, name })
    }

    /// List all available output devices
    pub fn list_outputs() -> Vec<Self> {
        let host = cpal::default_host();
        host.output_devices()
            .map(|devices| {
                devices
                    .filter_map(|device| {
                        let config = device.default_output_config().ok()?;
                        let name = device.name().unwrap_or_else(|_| "Unknown".into());
                        Some(Self { device, config, name })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels()
    }

    /// Engine settings matching this device's rate and channel count.
    pub fn engine_config(&self, buffer_size: usize) -> EngineConfig {
        EngineConfig::new(self.sample_rate(), buffer_size).with_channels(self.channels() as usize)
    }

    /// Create a sink that plays on this device, with a ring sized for
    /// `engine` (see [`EngineConfig::sink_capacity`]).
    pub fn create_sink(&self, engine: &EngineConfig) -> CpalSink {
        CpalSink::new(&self.device, &self.config, engine.sink_capacity())
    }
}

/// A sink that plays interleaved audio on a CPAL device
///
/// The CPAL stream runs on its own thread; this sink feeds samples into a
/// ring buffer that the stream consumes. It wants data whenever that ring
/// buffer has room.
pub struct CpalSink {
    buffer: Producer<f32>,
    channels: usize,
    /// Tracks how many samples CPAL has consumed
    samples_consumed: Arc<AtomicUsize>,
    /// Tracks underrun state for diagnostics
    had_underrun: Arc<AtomicBool>,
    stream_thread: StreamThread,
}

impl CpalSink {
    /// Create a new sink for the given device and config, buffering up to
    /// `capacity` interleaved samples
    pub fn new(device: &cpal::Device, config: &SupportedStreamConfig, capacity: usize) -> Self {
        let channels = config.channels() as usize;
        let sample_format = config.sample_format();
        let stream_config = config.config();
        let (producer, consumer) = RingBuffer::<f32>::new(capacity.max(channels));

        let samples_consumed = Arc::new(AtomicUsize::new(0));
        let samples_consumed_clone = samples_consumed.clone();

        let had_underrun = Arc::new(AtomicBool::new(false));
        let had_underrun_clone = had_underrun.clone();

        let device = device.clone();
        let stream_thread = StreamThread::spawn(move || {
            let stream = match build_stream(
                &device,
                sample_format,
                &stream_config,
                consumer,
                samples_consumed_clone,
                had_underrun_clone,
            ) {
                Ok(stream) => stream,
                Err(err) => {
                    error!("Failed to build output stream: {}", err);
                    return None;
                }
            };

            if let Err(err) = stream.play() {
                error!("Failed to start audio stream: {}", err);
                return None;
            }
            Some(stream)
        });

        Self {
            buffer: producer,
            channels,
            samples_consumed,
            had_underrun,
            stream_thread,
        }
    }

    /// Interleaved channel count of the device
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns how many samples have been played
    #[inline]
    pub fn samples_consumed(&self) -> usize {
        self.samples_consumed.load(Ordering::Relaxed)
    }

    /// Returns available space in the buffer (in samples)
    #[inline]
    pub fn buffer_available(&self) -> usize {
        self.buffer.slots()
    }

    /// Check and clear the underrun flag
    pub fn check_underrun(&self) -> bool {
        self.had_underrun.swap(false, Ordering::Relaxed)
    }
}

/// Thread owning a value that must not leave it, such as a `cpal::Stream`.
///
/// The value is built on the thread and dropped there when the handle is
/// dropped.
struct StreamThread {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StreamThread {
    fn spawn<T, F>(start: F) -> Self
    where
        F: FnOnce() -> Option<T> + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let handle = thread::spawn(move || {
            let Some(keep) = start() else {
                return;
            };
            while !shutdown_clone.load(Ordering::Acquire) {
                thread::park();
            }
            drop(keep);
        });
        Self {
            shutdown,
            handle: Some(handle),
        }
    }
}

impl Drop for StreamThread {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl OutputSink for CpalSink {
    fn is_ready(&self) -> bool {
        !self.buffer.is_full()
    }

    fn write(&mut self, samples: &[f32]) -> usize {
        let n = samples.len().min(self.buffer.slots());
        for &sample in &samples[..n] {
            let _ = self.buffer.push(sample);
        }
        n
    }
}

fn pop_or_silence(consumer: &mut Consumer<f32>, underrun: &mut bool) -> f32 {
    consumer.pop().unwrap_or_else(|_| {
        *underrun = true;
        0.0
    })
}

fn build_stream(
    device: &cpal::Device,
    sample_format: SampleFormat,
    stream_config: &cpal::StreamConfig,
    mut consumer: Consumer<f32>,
    samples_consumed: Arc<AtomicUsize>,
    had_underrun: Arc<AtomicBool>,
) -> Result<cpal::Stream, cpal::BuildStreamError> {
    let on_error = |err: cpal::StreamError| warn!("CPAL stream error: {:?}", err);
    match sample_format {
        SampleFormat::F32 => device.build_output_stream(
            stream_config,
            move |data: &mut [f32], _| {
                let mut underrun = false;
                for sample in data.iter_mut() {
                    *sample = pop_or_silence(&mut consumer, &mut underrun);
                }
                if underrun {
                    had_underrun.store(true, Ordering::Relaxed);
                }
                samples_consumed.fetch_add(data.len(), Ordering::Relaxed);
            },
            on_error,
            None,
        ),
        SampleFormat::I16 => device.build_output_stream(
            stream_config,
            move |data: &mut [i16], _| {
                let mut underrun = false;
                for sample in data.iter_mut() {
                    let s = pop_or_silence(&mut consumer, &mut underrun);
                    *sample = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                }
                if underrun {
                    had_underrun.store(true, Ordering::Relaxed);
                }
                samples_consumed.fetch_add(data.len(), Ordering::Relaxed);
            },
            on_error,
            None,
        ),
        SampleFormat::U16 => device.build_output_stream(
            stream_config,
            move |data: &mut [u16], _| {
                let mut underrun = false;
                for sample in data.iter_mut() {
                    let s = pop_or_silence(&mut consumer, &mut underrun);
                    *sample = ((s.clamp(-1.0, 1.0) + 1.0) * 0.5 * u16::MAX as f32) as u16;
                }
                if underrun {
                    had_underrun.store(true, Ordering::Relaxed);
                }
                samples_consumed.fetch_add(data.len(), Ordering::Relaxed);
            },
            on_error,
            None,
        ),
        other => {
            error!("Unsupported sample format: {:?}", other);
            Err(cpal::BuildStreamError::StreamConfigNotSupported)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flag(Arc<AtomicBool>);

    impl Drop for Flag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::Release);
        }
    }

    #[test]
    fn stream_thread_releases_its_value_on_drop() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = dropped.clone();
        let thread = StreamThread::spawn(move || Some(Flag(flag)));
        assert!(!dropped.load(Ordering::Acquire));
        drop(thread);
        assert!(dropped.load(Ordering::Acquire));
    }

    #[test]
    fn failed_start_ends_the_thread() {
        let thread = StreamThread::spawn(|| None::<()>);
        drop(thread);
    }
}
