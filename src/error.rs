//! Error taxonomy for loading and driving patches.
//!
//! Patch-level failures are returned to the caller: a patch that cannot be
//! fetched or read, a signal cycle at load time, and [`Error::RunawayGraph`]
//! while driving. Problems inside a patch (bad directives, wrong message
//! types, out-of-range tables) are logged through `tracing` and the offending
//! directive or message is skipped.

use thiserror::Error;

/// Errors produced by the patch runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// A directive had too few tokens, unparsable numbers, or referenced
    /// something that does not exist.
    #[error("malformed directive on line {line}: {reason}")]
    MalformedDirective {
        /// 1-based line the directive starts on.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A message handler got an atom of the wrong kind.
    #[error("{kind}: expected {expected} but got '{got}'")]
    TypeMismatch {
        /// Kind name of the receiving node.
        kind: String,
        /// What the handler wanted (`float`, `symbol`, `bang`).
        expected: &'static str,
        /// The offending message text.
        got: String,
    },

    /// A `$N` placeholder pointed past the end of the inbound message.
    #[error("${index}: argument number out of range")]
    ArgumentOutOfRange {
        /// The 1-based index that was requested.
        index: usize,
    },

    /// A table write landed outside the table's fixed length.
    #[error("table '{name}' has {len} slots, index {index} is out of range")]
    TableIndex {
        /// Table name.
        name: String,
        /// Fixed table length.
        len: usize,
        /// Offending index.
        index: usize,
    },

    /// Signal edges form a loop, which the pull-based tick cannot evaluate.
    #[error("signal connections form a cycle through node {node}")]
    SignalCycle {
        /// Graph index of a node on the cycle.
        node: usize,
    },

    /// The drive loop hit its iteration cap while the sink still wanted data.
    #[error("overflowed {iterations} write() iterations - the patch is probably too heavy")]
    RunawayGraph {
        /// The cap that was hit.
        iterations: usize,
    },

    /// The engine already holds a patch. Its graph is fixed once built.
    #[error("a patch is already loaded")]
    AlreadyLoaded,

    /// The patch loader could not find the requested patch.
    #[error("no such patch: {0}")]
    NoSuchPatch(String),

    /// Reading a patch failed.
    #[error("failed to read patch: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Create a malformed directive error.
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Error::MalformedDirective {
            line,
            reason: reason.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(kind: impl Into<String>, expected: &'static str, got: impl ToString) -> Self {
        Error::TypeMismatch {
            kind: kind.into(),
            expected,
            got: got.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_like_pd_console_output() {
        assert_eq!(
            Error::ArgumentOutOfRange { index: 3 }.to_string(),
            "$3: argument number out of range"
        );
        assert_eq!(
            Error::type_mismatch("float", "float", "foo").to_string(),
            "float: expected float but got 'foo'"
        );
    }

    #[test]
    fn malformed_factory_keeps_line() {
        let err = Error::malformed(7, "connect needs four indices");
        assert!(matches!(err, Error::MalformedDirective { line: 7, .. }));
    }
}
