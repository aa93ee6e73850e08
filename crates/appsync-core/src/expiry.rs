//! API key expiry normalization.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{CoreError, Result};

/// Numbers at or above this value are read as epoch milliseconds.
pub const MILLISECONDS_THRESHOLD: f64 = 1e12;

/// Declared expiry of an API key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expiry {
    /// Epoch seconds, or epoch milliseconds when `>= 1e12`.
    Epoch(f64),
    /// RFC 3339 timestamp, e.g. `2030-01-01T00:00:00Z`.
    Timestamp(String),
}

impl Expiry {
    /// Epoch seconds, rounded, as sent to the provider.
    pub fn to_epoch_seconds(&self) -> Result<i64> {
        match self {
            Self::Epoch(value) => epoch_seconds(*value),
            Self::Timestamp(text) => {
                if let Ok(number) = text.trim().parse::<f64>() {
                    return epoch_seconds(number);
                }
                OffsetDateTime::parse(text.trim(), &Rfc3339)
                    .map(|ts| ts.unix_timestamp())
                    .map_err(|e| CoreError::invalid_expiry(format!("{text}: {e}")))
            }
        }
    }
}

fn epoch_seconds(value: f64) -> Result<i64> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::invalid_expiry(value.to_string()));
    }
    let seconds = if value < MILLISECONDS_THRESHOLD {
        value
    } else {
        value / 1000.0
    };
    Ok(seconds.round() as i64)
}

/// Normalizes an optional expiry; `None` means "provider default".
pub fn normalize_expiry(expires: Option<&Expiry>) -> Result<Option<i64>> {
    expires.map(Expiry::to_epoch_seconds).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_and_milliseconds_agree() {
        let seconds = Expiry::Epoch(1_700_000_000.0).to_epoch_seconds().unwrap();
        let millis = Expiry::Epoch(1_700_000_000_000.0)
            .to_epoch_seconds()
            .unwrap();
        assert_eq!(seconds, 1_700_000_000);
        assert_eq!(millis, 1_700_000_000);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(
            Expiry::Epoch(1_700_000_000_600.0).to_epoch_seconds().unwrap(),
            1_700_000_001
        );
        assert_eq!(
            Expiry::Epoch(1_700_000_000.4).to_epoch_seconds().unwrap(),
            1_700_000_000
        );
    }

    #[test]
    fn test_timestamp() {
        let expiry = Expiry::Timestamp("2023-11-14T22:13:20Z".to_string());
        assert_eq!(expiry.to_epoch_seconds().unwrap(), 1_700_000_000);

        let numeric = Expiry::Timestamp("1700000000000".to_string());
        assert_eq!(numeric.to_epoch_seconds().unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Expiry::Epoch(-5.0).to_epoch_seconds().is_err());
        assert!(Expiry::Epoch(f64::NAN).to_epoch_seconds().is_err());
        assert!(
            Expiry::Timestamp("next tuesday".to_string())
                .to_epoch_seconds()
                .is_err()
        );
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_expiry(None).unwrap(), None);
        assert_eq!(
            normalize_expiry(Some(&Expiry::Epoch(10.0))).unwrap(),
            Some(10)
        );
    }
}
