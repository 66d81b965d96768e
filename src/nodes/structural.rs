//! Kinds that only occupy a graph slot: placeholders and table holders.

use crate::node::{InitContext, ObjectKind};

/// Inert placeholder for comments, empty boxes and unknown kinds.
#[derive(Clone, Debug, Default)]
pub struct Null;

impl ObjectKind for Null {}

/// Graph node standing in for a `#X array` table. The samples live in the
/// engine's table registry under [`TableNode::name`].
#[derive(Clone, Debug, Default)]
pub struct TableNode {
    name: String,
}

impl TableNode {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ObjectKind for TableNode {
    fn init(&mut self, cx: &mut InitContext<'_>) {
        if let Some(name) = cx.arg(0) {
            self.name = name.to_string();
        }
    }
}
