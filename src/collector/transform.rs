//! Pure conversions from raw `zpool` value strings to metric values.
//!
//! Every transform is a plain `fn(&str) -> Result<f64, TransformError>`; a
//! property descriptor carries exactly one of them. A transform failure is
//! fatal for the owning pool's pass — a silently wrong value is worse than a
//! dropped scrape — and is a distinct failure class from an unregistered
//! property key, which is merely skipped.

use std::num::ParseFloatError;
use std::str::FromStr;

use thiserror::Error;

use crate::zpool::PoolStatus;

/// A raw value could not be converted under its declared type.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid numeric value '{value}': {source}")]
    InvalidNumeric {
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("invalid boolean value '{value}', expected 'on' or 'off'")]
    InvalidBool { value: String },

    #[error(transparent)]
    InvalidHealth(#[from] crate::zpool::UnknownPoolStatus),
}

/// A pure string-to-metric-value conversion.
pub type Transform = fn(&str) -> Result<f64, TransformError>;

fn parse_numeric(value: &str) -> Result<f64, TransformError> {
    value
        .parse::<f64>()
        .map_err(|source| TransformError::InvalidNumeric {
            value: value.to_owned(),
            source,
        })
}

/// Base-10 integer or float, passed through unchanged.
pub fn numeric(value: &str) -> Result<f64, TransformError> {
    parse_numeric(value)
}

/// An already-computed ratio such as a "1.50x" deduplication ratio, passed
/// through unscaled. Tolerates the trailing `x` some tool versions print.
pub fn multiplier(value: &str) -> Result<f64, TransformError> {
    parse_numeric(value.strip_suffix('x').unwrap_or(value))
}

/// A percentage in 0..=100, normalized to a 0.0..=1.0 fraction.
pub fn percentage(value: &str) -> Result<f64, TransformError> {
    Ok(parse_numeric(value)? / 100.0)
}

/// Maps "on"/"off" to 1/0.
pub fn bool_on_off(value: &str) -> Result<f64, TransformError> {
    match value {
        "on" => Ok(1.0),
        "off" => Ok(0.0),
        other => Err(TransformError::InvalidBool {
            value: other.to_owned(),
        }),
    }
}

/// Maps a pool health token to its stable numeric code.
pub fn health_code(value: &str) -> Result<f64, TransformError> {
    let status = PoolStatus::from_str(value)?;
    Ok(f64::from(status.code()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_parses_integers_and_floats() {
        assert_eq!(numeric("1099511627776").unwrap(), 1_099_511_627_776.0);
        assert_eq!(numeric("1.5").unwrap(), 1.5);
        assert_eq!(numeric("0").unwrap(), 0.0);
    }

    #[test]
    fn test_numeric_rejects_garbage() {
        assert!(matches!(
            numeric("1,5").unwrap_err(),
            TransformError::InvalidNumeric { .. }
        ));
        assert!(numeric("").is_err());
    }

    #[test]
    fn test_multiplier_passes_ratio_through_unscaled() {
        assert_eq!(multiplier("1.50").unwrap(), 1.5);
        assert_eq!(multiplier("1.5x").unwrap(), 1.5);
        assert!(multiplier("x").is_err());
    }

    #[test]
    fn test_percentage_normalizes_to_fraction() {
        assert_eq!(percentage("42").unwrap(), 0.42);
        assert_eq!(percentage("0").unwrap(), 0.0);
        assert_eq!(percentage("100").unwrap(), 1.0);
        assert!(percentage("full").is_err());
    }

    #[test]
    fn test_bool_maps_on_off() {
        assert_eq!(bool_on_off("on").unwrap(), 1.0);
        assert_eq!(bool_on_off("off").unwrap(), 0.0);
    }

    #[test]
    fn test_bool_rejects_unknown_tokens() {
        assert!(matches!(
            bool_on_off("enabled").unwrap_err(),
            TransformError::InvalidBool { .. }
        ));
    }

    #[test]
    fn test_health_code_covers_the_documented_range() {
        assert_eq!(health_code("ONLINE").unwrap(), 0.0);
        assert_eq!(health_code("DEGRADED").unwrap(), 1.0);
        assert_eq!(health_code("FAULTED").unwrap(), 2.0);
        assert_eq!(health_code("OFFLINE").unwrap(), 3.0);
        assert_eq!(health_code("UNAVAIL").unwrap(), 4.0);
        assert_eq!(health_code("REMOVED").unwrap(), 5.0);
        assert_eq!(health_code("SUSPENDED").unwrap(), 6.0);
    }

    #[test]
    fn test_health_code_rejects_unknown_tokens() {
        assert!(matches!(
            health_code("HEALTHY").unwrap_err(),
            TransformError::InvalidHealth(_)
        ));
    }
}
