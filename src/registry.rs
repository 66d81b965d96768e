//! Registry of object kinds, resolved by name while building a patch.
//!
//! Every built-in kind is registered by [`KindRegistry::new`]. Patches may
//! use any registered name or alias; unknown names become inert `null`
//! placeholders so that node indices stay aligned with the patch file.
//!
//! # Example
//!
//! ```rust
//! use patchwerk::node::{ObjectKind, Rate};
//! use patchwerk::nodes::Object;
//! use patchwerk::registry::{KindDecl, KindRegistry};
//!
//! struct Silence;
//! impl ObjectKind for Silence {}
//!
//! let mut registry = KindRegistry::new();
//! registry.register(
//!     KindDecl::new("silence~", |_| Object::Custom(Box::new(Silence)))
//!         .outlets(&[Rate::Signal])
//!         .describe("outputs zeros"),
//! );
//! assert!(registry.get("silence~").is_some());
//! assert_eq!(registry.resolve("osc~").name, "osc~");
//! ```

use hashbrown::HashMap;
use tracing::warn;

use crate::node::{Rate, SlotLayout};
use crate::nodes::{self, Null, Object};

/// Builds a fresh object from its construction arguments.
pub type Factory = Box<dyn Fn(&[String]) -> Object + Send + Sync>;

/// Broad grouping of kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindCategory {
    /// Has signal outlets or feeds the output.
    Signal,
    /// Message-only processing.
    Control,
    /// Tables, comments and placeholders.
    Structural,
}

/// Declaration of one object kind.
pub struct KindDecl {
    /// Name used in patch files.
    pub name: String,
    /// Short human-readable description.
    pub description: &'static str,
    pub category: KindCategory,
    /// Default inlet count.
    pub inlets: usize,
    /// Default outlet rates.
    pub outlets: Vec<Rate>,
    /// Inlets that carry a signal buffer.
    pub signal_inlets: Vec<usize>,
    /// Whether the engine pulls the graph from this node every frame.
    pub endpoint: bool,
    factory: Factory,
}

impl KindDecl {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&[String]) -> Object + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: "",
            category: KindCategory::Control,
            inlets: 0,
            outlets: Vec::new(),
            signal_inlets: Vec::new(),
            endpoint: false,
            factory: Box::new(factory),
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn category(mut self, category: KindCategory) -> Self {
        self.category = category;
        self
    }

    pub fn inlets(mut self, inlets: usize) -> Self {
        self.inlets = inlets;
        self
    }

    pub fn outlets(mut self, outlets: &[Rate]) -> Self {
        self.outlets = outlets.to_vec();
        self
    }

    /// Mark inlets as signal-rate. Also marks the kind as [`KindCategory::Signal`].
    pub fn signal_inlets(mut self, inlets: &[usize]) -> Self {
        self.signal_inlets = inlets.to_vec();
        self.category = KindCategory::Signal;
        self
    }

    pub fn endpoint(mut self) -> Self {
        self.endpoint = true;
        self.category = KindCategory::Signal;
        self
    }

    /// Construct an object and its default slot layout.
    pub fn build(&self, args: &[String]) -> (Object, SlotLayout) {
        let object = (self.factory)(args);
        let inlets = self
            .signal_inlets
            .iter()
            .map(|i| i + 1)
            .max()
            .unwrap_or(0)
            .max(self.inlets);
        let layout = SlotLayout {
            inlets,
            outlets: self.outlets.clone(),
        };
        (object, layout)
    }

    /// Rate of inlet `i` in a node of this kind.
    pub fn inlet_rate(&self, i: usize) -> Rate {
        if self.signal_inlets.contains(&i) {
            Rate::Signal
        } else {
            Rate::Message
        }
    }
}

impl core::fmt::Debug for KindDecl {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KindDecl")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("inlets", &self.inlets)
            .field("outlets", &self.outlets)
            .field("signal_inlets", &self.signal_inlets)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Name-to-kind lookup with aliases.
pub struct KindRegistry {
    kinds: HashMap<String, KindDecl>,
    aliases: HashMap<String, String>,
    fallback: KindDecl,
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KindRegistry {
    /// A registry holding every built-in kind.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        nodes::register_builtins(&mut registry);
        registry
    }

    /// A registry with no kinds. Every name resolves to the placeholder.
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
            aliases: HashMap::new(),
            fallback: KindDecl::new("null", |_| Object::Null(Null))
                .category(KindCategory::Structural)
                .describe("inert placeholder"),
        }
    }

    /// Add a kind, replacing any kind of the same name.
    pub fn register(&mut self, decl: KindDecl) {
        self.kinds.insert(decl.name.clone(), decl);
    }

    /// Make `alias` resolve to the kind registered as `target`.
    pub fn alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(alias.to_string(), target.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&KindDecl> {
        let name = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.kinds.get(name)
    }

    /// Look up `name`, falling back to the `null` placeholder.
    pub fn resolve(&self, name: &str) -> &KindDecl {
        match self.get(name) {
            Some(decl) => decl,
            None => {
                if name != self.fallback.name {
                    warn!("{} ... couldn't create", name);
                }
                &self.fallback
            }
        }
    }

    /// Registered kind names, aliases excluded.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    pub fn in_category(&self, category: KindCategory) -> impl Iterator<Item = &KindDecl> {
        self.kinds.values().filter(move |decl| decl.category == category)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_builtins() {
        let r = KindRegistry::new();
        for (alias, kind) in [("r", "receive"), ("t", "trigger"), ("f", "float"), ("i", "int"), ("sel", "select"), ("b", "bang")] {
            assert_eq!(r.get(alias).map(|d| d.name.as_str()), Some(kind), "{}", alias);
        }
    }

    #[test]
    fn unknown_kinds_fall_back_to_null() {
        let r = KindRegistry::new();
        let decl = r.resolve("definitely-not-a-kind~");
        assert_eq!(decl.name, "null");
        let (object, layout) = decl.build(&[]);
        assert!(matches!(object, Object::Null(_)));
        assert_eq!(layout.inlets, 0);
    }

    #[test]
    fn signal_inlets_widen_the_layout() {
        let r = KindRegistry::new();
        let decl = r.resolve("tabread~");
        let (_, layout) = decl.build(&["t".to_string()]);
        assert_eq!(layout.inlets, 1);
        assert_eq!(decl.inlet_rate(0), Rate::Signal);
        assert_eq!(decl.category, KindCategory::Signal);
    }

    #[test]
    fn dac_is_the_only_builtin_endpoint() {
        let r = KindRegistry::new();
        let endpoints: Vec<_> = r.names().filter(|n| r.get(n).is_some_and(|d| d.endpoint)).collect();
        assert_eq!(endpoints, vec!["dac~"]);
    }

    #[test]
    fn empty_registry_has_nothing() {
        let r = KindRegistry::empty();
        assert!(r.is_empty());
        assert_eq!(r.resolve("osc~").name, "null");
    }
}
