//! Audio output endpoint

use crate::node::{Input, ObjectKind, ProcessContext};

/// `dac~`: adds inlet 0 into the left channel and inlet 1 into the right
/// channel of the engine's interleaved output frame.
#[derive(Clone, Debug, Default)]
pub struct Dac;

impl ObjectKind for Dac {
    fn process(&mut self, cx: &mut ProcessContext<'_>, inputs: &[Input<'_>], _outputs: &mut [Vec<f32>]) {
        for (channel, input) in inputs.iter().take(2).enumerate() {
            for i in 0..cx.buffer_size {
                cx.mix(channel, i, input.at(i));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::table::Tables;

    #[test]
    fn accumulates_into_interleaved_frame() {
        let config = EngineConfig::new(44100, 3);
        let tables = Tables::default();
        let mut output = vec![1.0; config.frame_len()];
        let left = [0.25, 0.5, 0.75];
        let right = 0.5;
        {
            let mut cx = ProcessContext::new(&config, 1, &mut output, &tables);
            Dac.process(&mut cx, &[Input::signal(&left), Input::constant(&right)], &mut []);
        }
        assert_eq!(output, vec![1.25, 1.5, 1.5, 1.5, 1.75, 1.5]);
    }
}
