//! Literal string coercion
//!
//! Configuration values resolved from stored-literal components arrive as
//! strings; constructor-injection parameters declare the [`LiteralKind`]
//! they expect and the raw string is coerced here. List kinds split on a
//! comma and trim whitespace from each element.

use std::sync::Arc;

use crate::definition::ComponentInstance;
use crate::error::{ContainerError, Result};

/// Delimiter used when decomposing a literal into list elements
pub const LIST_DELIMITER: char = ',';

/// Target shape of a coerced configuration value
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LiteralKind {
    /// Keep the string as-is (`String`)
    Str,
    /// Signed integer (`i64`)
    I64,
    /// Floating point (`f64`)
    F64,
    /// Boolean, `true`/`false` (`bool`)
    Bool,
    /// Comma-separated list of trimmed strings (`Vec<String>`)
    StrList,
    /// Comma-separated list of integers (`Vec<i64>`)
    I64List,
}

/// Coerce a literal string to the requested kind.
///
/// `key` is the name of the literal component the value came from and is
/// only used in error messages.
pub fn coerce(kind: LiteralKind, key: &str, raw: &str) -> Result<ComponentInstance> {
    match kind {
        LiteralKind::Str => Ok(Arc::new(raw.to_string())),
        LiteralKind::I64 => {
            let value: i64 = raw.trim().parse().map_err(|e| parse_error(key, raw, e))?;
            Ok(Arc::new(value))
        }
        LiteralKind::F64 => {
            let value: f64 = raw.trim().parse().map_err(|e| parse_error(key, raw, e))?;
            Ok(Arc::new(value))
        }
        LiteralKind::Bool => match raw.trim() {
            "true" => Ok(Arc::new(true)),
            "false" => Ok(Arc::new(false)),
            other => Err(ContainerError::processing(format!(
                "config value is not a boolean. key = [{key}], value = [{other}]"
            ))),
        },
        LiteralKind::StrList => Ok(Arc::new(split_list(raw))),
        LiteralKind::I64List => {
            let mut values = Vec::new();
            for element in split_list(raw) {
                values.push(element.parse::<i64>().map_err(|e| parse_error(key, &element, e))?);
            }
            Ok(Arc::new(values))
        }
    }
}

/// Split a literal into trimmed elements; the empty string yields no elements
pub fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(LIST_DELIMITER)
        .map(|element| element.trim().to_string())
        .collect()
}

fn parse_error(key: &str, value: &str, cause: impl std::error::Error + Send + Sync + 'static) -> ContainerError {
    ContainerError::processing_with_source(
        format!("config value is not a number. key = [{key}], value = [{value}]"),
        cause,
    )
}
