//! Error types for collection passes.
//!
//! A [`PoolError`] is one pool's fatal failure: either the `zpool`
//! invocation itself (spawn, read, exit status, invalid output) or a value
//! that could not be transformed under its declared type. A
//! [`CollectError`] aggregates every per-pool failure of one pass; metrics
//! already emitted by the pools that succeeded stay delivered.

use thiserror::Error;

use crate::collector::transform::TransformError;
use crate::zpool::ZpoolError;

/// Fatal failure of a single pool's collection.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool '{pool}': {source}")]
    Command {
        pool: String,
        #[source]
        source: ZpoolError,
    },

    #[error("pool '{pool}': property '{property}': {source}")]
    Transform {
        pool: String,
        property: String,
        #[source]
        source: TransformError,
    },
}

impl PoolError {
    /// The pool whose collection failed.
    pub fn pool(&self) -> &str {
        match self {
            PoolError::Command { pool, .. } | PoolError::Transform { pool, .. } => pool,
        }
    }
}

/// One or more pools failed during a collection pass.
///
/// Carries every per-pool failure in the order they were reported, so
/// operators can diagnose simultaneous failures instead of only the first
/// one observed.
#[derive(Debug)]
pub struct CollectError {
    errors: Vec<PoolError>,
}

impl CollectError {
    pub(super) fn new(errors: Vec<PoolError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self { errors }
    }

    /// All per-pool failures of the pass.
    pub fn errors(&self) -> &[PoolError] {
        &self.errors
    }
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "collection failed for {} pool(s): ", self.errors.len())?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .first()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}
