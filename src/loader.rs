//! Fetching patch text.
//!
//! [`Engine::load_from`](crate::Engine::load_from) takes anything that
//! implements [`PatchLoader`]. [`FsLoader`] reads from disk; a closure works
//! for in-memory patches and tests.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Resolves a patch location to its source text.
pub trait PatchLoader {
    fn fetch(&self, location: &str) -> Result<String>;
}

impl<F> PatchLoader for F
where
    F: Fn(&str) -> Result<String>,
{
    fn fetch(&self, location: &str) -> Result<String> {
        self(location)
    }
}

/// Reads patches from the filesystem, optionally relative to a root directory.
#[derive(Clone, Debug, Default)]
pub struct FsLoader {
    root: Option<PathBuf>,
}

impl FsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locations against `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn resolve(&self, location: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(location),
            None => Path::new(location).to_path_buf(),
        }
    }
}

impl PatchLoader for FsLoader {
    fn fetch(&self, location: &str) -> Result<String> {
        let path = self.resolve(location);
        debug!("reading patch {}", path.display());
        std::fs::read_to_string(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => Error::NoSuchPatch(location.to_string()),
            _ => Error::Io(err),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_no_such_patch() {
        let loader = FsLoader::new().with_root(env!("CARGO_MANIFEST_DIR"));
        let err = loader.fetch("does/not/exist.pd").unwrap_err();
        assert!(matches!(err, Error::NoSuchPatch(ref name) if name == "does/not/exist.pd"));
    }

    #[test]
    fn reads_relative_to_root() {
        let loader = FsLoader::new().with_root(env!("CARGO_MANIFEST_DIR"));
        let text = loader.fetch("Cargo.toml").unwrap();
        assert!(text.contains("patchwerk"));
    }

    #[test]
    fn closures_are_loaders() {
        let loader = |location: &str| -> Result<String> {
            match location {
                "sine" => Ok("#X obj 0 0 osc~ 440;\n".into()),
                other => Err(Error::NoSuchPatch(other.into())),
            }
        };
        assert!(loader.fetch("sine").unwrap().contains("osc~"));
        assert!(matches!(loader.fetch("saw"), Err(Error::NoSuchPatch(_))));
    }
}
