//! Error types for `zpool` command execution and output validation.
//!
//! [`ZpoolError`] covers two failure classes that are both fatal for the
//! pool being collected:
//!
//! - executor failures: the command could not be spawned, its stdout could
//!   not be captured or read, or it exited with a non-zero status;
//! - invalid output: a line failed the field-count or pool-identity check.
//!
//! Either way the partially accumulated property map is discarded by the
//! caller; a pool is never reported from garbage output.

use thiserror::Error;

use super::PoolKind;

#[derive(Debug, Error)]
pub enum ZpoolError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to capture stdout of '{program}'")]
    Stdout { program: String },

    #[error("'{program}' exited with non-zero status (code {code:?})")]
    Exit { program: String, code: Option<i32> },

    #[error("{kind} line for pool '{pool}' has {got} fields, expected {expected}")]
    FieldCount {
        kind: PoolKind,
        pool: String,
        expected: usize,
        got: usize,
    },

    #[error("{kind} line for pool '{pool}' names pool '{found}'")]
    PoolMismatch {
        kind: PoolKind,
        pool: String,
        found: String,
    },

    #[error("error reading command output: {0}")]
    Io(#[from] std::io::Error),
}
