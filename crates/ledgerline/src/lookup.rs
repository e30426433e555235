//! Outcome of a best-effort lookup.

use ledgerline_data::DataError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Result of one degradable part of a report.
///
/// Serialises as the value when found and as `{}` otherwise, so consumers see
/// the same shape whether the registry had nothing or could not be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The value was retrieved
    Found(T),
    /// The registry has nothing for this company
    Absent,
    /// Retrieval failed
    Unavailable {
        /// Cause, for logs
        reason: String,
    },
}

impl<T> Lookup<T> {
    /// Classify a data-layer result.
    pub fn from_result(result: ledgerline_data::Result<T>) -> Self {
        match result {
            Ok(value) => Self::Found(value),
            Err(e) => Self::from_error(&e),
        }
    }

    /// Classify a data-layer failure.
    pub fn from_error(error: &DataError) -> Self {
        if error.is_absence() {
            Self::Absent
        } else {
            Self::Unavailable {
                reason: error.to_string(),
            }
        }
    }

    /// Returns true if a value was retrieved.
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The retrieved value, if any.
    pub const fn found(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Consume into the retrieved value, if any.
    pub fn into_found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for Lookup<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Found(value) => value.serialize(serializer),
            _ => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classification() {
        let absent: Lookup<u32> = Lookup::from_result(Err(DataError::RegistryNotFound("x".into())));
        assert_eq!(absent, Lookup::Absent);

        let failed: Lookup<u32> = Lookup::from_result(Err(DataError::RegistryUnavailable {
            url: "http://registry.test".into(),
            status: Some(503),
            reason: "down".into(),
        }));
        assert!(matches!(failed, Lookup::Unavailable { .. }));
        assert!(!failed.is_found());

        let found = Lookup::from_result(Ok(7));
        assert_eq!(found.found(), Some(&7));
        assert_eq!(found.into_found(), Some(7));
    }

    #[test]
    fn test_serialises_value_or_empty_object() {
        let found = Lookup::Found(json!({"company_name": "ACME LTD"}));
        assert_eq!(serde_json::to_value(&found).unwrap(), json!({"company_name": "ACME LTD"}));

        let absent: Lookup<serde_json::Value> = Lookup::Absent;
        assert_eq!(serde_json::to_value(&absent).unwrap(), json!({}));

        let failed: Lookup<Vec<u8>> = Lookup::Unavailable {
            reason: "timeout".into(),
        };
        assert_eq!(serde_json::to_string(&failed).unwrap(), "{}");
    }
}
