//! Per-kind validation and extraction of `zpool` output lines.
//!
//! A [`LineHandler`] consumes one tokenized line at a time and accumulates a
//! map of raw property keys to raw string values. Every handler enforces two
//! checks before extracting anything:
//!
//! - the line must have exactly [`LineHandler::fields_per_record`] fields;
//! - field 0 must name the pool currently being collected, guarding against
//!   output from another pool leaking into this accumulation.
//!
//! A violation of either check fails the whole pool, not just the line.
//!
//! There is one concrete handler per [`PoolKind`], selected once at
//! construction via [`handler_for`].

use std::collections::HashMap;

use super::error::ZpoolError;
use super::PoolKind;

/// Raw property key to raw value, accumulated for one pool in one pass.
///
/// A repeated key overwrites the earlier value (last write wins).
pub type PropertyMap = HashMap<String, String>;

/// Validates and extracts fields from one line of `zpool` output.
pub trait LineHandler {
    /// Exact number of fields every record of this kind must have.
    fn fields_per_record(&self) -> usize;

    /// Validates `fields` against `pool` and folds the line into the
    /// accumulated property map.
    fn process_line(&mut self, pool: &str, fields: &[&str]) -> Result<(), ZpoolError>;

    /// Consumes the handler, returning the accumulated properties.
    fn into_properties(self: Box<Self>) -> PropertyMap;
}

/// Returns the handler for the given query kind.
pub fn handler_for(kind: PoolKind) -> Box<dyn LineHandler + Send> {
    match kind {
        PoolKind::Properties => Box::new(PropertiesHandler::default()),
        PoolKind::Iostat => Box::new(IostatHandler::default()),
    }
}

fn validate(
    kind: PoolKind,
    pool: &str,
    fields: &[&str],
    expected: usize,
) -> Result<(), ZpoolError> {
    if fields.len() != expected {
        return Err(ZpoolError::FieldCount {
            kind,
            pool: pool.to_owned(),
            expected,
            got: fields.len(),
        });
    }
    if fields[0] != pool {
        return Err(ZpoolError::PoolMismatch {
            kind,
            pool: pool.to_owned(),
            found: fields[0].to_owned(),
        });
    }
    Ok(())
}

/// Handler for `zpool get -Hpo name,property,value` output.
///
/// Each record is `(pool, property, value)`; the property name and value are
/// stored verbatim.
#[derive(Debug, Default)]
pub struct PropertiesHandler {
    properties: PropertyMap,
}

impl LineHandler for PropertiesHandler {
    fn fields_per_record(&self) -> usize {
        3
    }

    fn process_line(&mut self, pool: &str, fields: &[&str]) -> Result<(), ZpoolError> {
        validate(PoolKind::Properties, pool, fields, self.fields_per_record())?;
        self.properties
            .insert(fields[1].to_owned(), fields[2].to_owned());
        Ok(())
    }

    fn into_properties(self: Box<Self>) -> PropertyMap {
        self.properties
    }
}

/// Handler for `zpool iostat -Hyp` output.
///
/// Each record has seven fields: pool name, two capacity columns, then read
/// operations, write operations, read bandwidth and write bandwidth. The
/// capacity columns are ignored; the remaining four are stored under fixed
/// keys.
#[derive(Debug, Default)]
pub struct IostatHandler {
    properties: PropertyMap,
}

impl LineHandler for IostatHandler {
    fn fields_per_record(&self) -> usize {
        7
    }

    fn process_line(&mut self, pool: &str, fields: &[&str]) -> Result<(), ZpoolError> {
        validate(PoolKind::Iostat, pool, fields, self.fields_per_record())?;
        self.properties.insert("opread".to_owned(), fields[3].to_owned());
        self.properties.insert("opwrite".to_owned(), fields[4].to_owned());
        self.properties.insert("bwread".to_owned(), fields[5].to_owned());
        self.properties.insert("bwwrite".to_owned(), fields[6].to_owned());
        Ok(())
    }

    fn into_properties(self: Box<Self>) -> PropertyMap {
        self.properties
    }
}
