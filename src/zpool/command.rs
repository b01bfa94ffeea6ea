//! Execution of `zpool` commands and streaming of their output.
//!
//! Every [`PoolKind`] maps to one fixed program invocation; the pool name is
//! the only resource-dependent argument. Output is never buffered whole:
//! stdout is streamed line by line, each line split on the tab delimiter
//! that `zpool -H` scripting mode guarantees, and handed to the kind's
//! [`LineHandler`].

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::error::ZpoolError;
use super::handler::{handler_for, LineHandler, PropertyMap};
use super::PoolKind;

const ZPOOL: &str = "zpool";

/// Executes queries against the storage subsystem.
///
/// This is the seam between metric collection and process execution; tests
/// substitute a fake implementation to exercise collection without a `zpool`
/// binary.
pub trait Client: Clone + Send + Sync + 'static {
    /// Queries the raw properties of one pool.
    fn pool_properties(
        &self,
        pool: &str,
        kind: PoolKind,
        props: &[String],
    ) -> impl Future<Output = Result<PropertyMap, ZpoolError>> + Send;

    /// Lists the names of all imported pools.
    fn pool_names(&self) -> impl Future<Output = Result<Vec<String>, ZpoolError>> + Send;
}

/// [`Client`] implementation backed by the real `zpool` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZpoolClient;

impl Client for ZpoolClient {
    async fn pool_properties(
        &self,
        pool: &str,
        kind: PoolKind,
        props: &[String],
    ) -> Result<PropertyMap, ZpoolError> {
        let args = invocation(kind, props, pool);
        let mut handler = handler_for(kind);
        execute(ZPOOL, &args, pool, handler.as_mut()).await?;
        Ok(handler.into_properties())
    }

    async fn pool_names(&self) -> Result<Vec<String>, ZpoolError> {
        let mut child = Command::new(ZPOOL)
            .args(["list", "-Ho", "name"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ZpoolError::Spawn {
                program: ZPOOL.to_owned(),
                source,
            })?;
        let stdout = child.stdout.take().ok_or(ZpoolError::Stdout {
            program: ZPOOL.to_owned(),
        })?;

        let mut pools = Vec::new();
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if !line.is_empty() {
                pools.push(line);
            }
        }
        wait(ZPOOL, &mut child).await?;
        Ok(pools)
    }
}

/// Returns the fixed argument list for the given query kind.
fn invocation(kind: PoolKind, props: &[String], pool: &str) -> Vec<String> {
    match kind {
        PoolKind::Properties => vec![
            "get".to_owned(),
            "-Hpo".to_owned(),
            "name,property,value".to_owned(),
            props.join(","),
            pool.to_owned(),
        ],
        PoolKind::Iostat => vec!["iostat".to_owned(), "-Hyp".to_owned(), pool.to_owned()],
    }
}

/// Runs `program` and feeds every tab-split stdout line to `handler`.
///
/// A fresh invocation is a fresh sequence of lines; nothing is rewound or
/// retried. Any handler rejection or process failure aborts the pool.
async fn execute(
    program: &str,
    args: &[String],
    pool: &str,
    handler: &mut (dyn LineHandler + Send),
) -> Result<(), ZpoolError> {
    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ZpoolError::Spawn {
            program: program.to_owned(),
            source,
        })?;
    let stdout = child.stdout.take().ok_or(ZpoolError::Stdout {
        program: program.to_owned(),
    })?;

    let mut lines = BufReader::new(stdout).lines();
    while let Some(line) = lines.next_line().await? {
        let fields: Vec<&str> = line.split('\t').collect();
        handler.process_line(pool, &fields)?;
    }
    wait(program, &mut child).await
}

async fn wait(program: &str, child: &mut tokio::process::Child) -> Result<(), ZpoolError> {
    let status = child.wait().await?;
    if !status.success() {
        return Err(ZpoolError::Exit {
            program: program.to_owned(),
            code: status.code(),
        });
    }
    Ok(())
}
