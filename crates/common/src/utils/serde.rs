//! Serialization utilities for common data types
//!
//! This module provides reusable serde serialization and deserialization
//! utilities that are used across multiple crates in the workspace.

use chrono::TimeDelta;
use serde::{Deserialize, Deserializer, Serializer};

/// Custom serialization module for [`TimeDelta`] as signed milliseconds
///
/// Configuration values are allowed to be negative on the wire so that
/// validation can report them instead of the deserializer rejecting them.
///
/// # Usage
/// ```rust
/// use chrono::TimeDelta;
/// use propgrid_common::time_delta_millis;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(with = "time_delta_millis")]
///     wait: TimeDelta,
/// }
/// ```
pub mod time_delta_millis {
    use super::*;

    /// Serde serialization result type
    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// Serialize a TimeDelta as milliseconds (i64)
    pub fn serialize<S>(delta: &TimeDelta, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        serializer.serialize_i64(delta.num_milliseconds())
    }

    /// Deserialize milliseconds (i64) into a TimeDelta
    pub fn deserialize<'de, D>(deserializer: D) -> Result<TimeDelta, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        TimeDelta::try_milliseconds(millis)
            .ok_or_else(|| serde::de::Error::custom(format!("{millis}ms is out of range")))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct TestStruct {
        #[serde(with = "time_delta_millis")]
        wait: TimeDelta,
        name: String,
    }

    #[test]
    fn test_time_delta_millis_serialize() {
        let data = TestStruct { wait: TimeDelta::milliseconds(1500), name: "test".to_string() };

        let json = serde_json::to_string(&data).expect("Should serialize valid struct");
        assert_eq!(json, r#"{"wait":1500,"name":"test"}"#);
    }

    #[test]
    fn test_time_delta_millis_accepts_negative_values() {
        let data: TestStruct =
            serde_json::from_str(r#"{"wait":-250,"name":"neg"}"#).expect("Should deserialize");

        assert_eq!(data.wait, TimeDelta::milliseconds(-250));
    }

    #[test]
    fn test_time_delta_millis_rejects_non_integer() {
        let result: Result<TestStruct, _> = serde_json::from_str(r#"{"wait":"soon","name":"x"}"#);
        assert!(result.is_err());
    }
}
