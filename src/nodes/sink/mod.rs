mod dac;

pub use dac::Dac;

use crate::registry::{KindDecl, KindRegistry};

use super::Object;

pub(crate) fn register(registry: &mut KindRegistry) {
    registry.register(
        KindDecl::new("dac~", |_| Object::Dac(Dac))
            .inlets(2)
            .signal_inlets(&[0, 1])
            .endpoint()
            .describe("stereo audio output"),
    );
}
