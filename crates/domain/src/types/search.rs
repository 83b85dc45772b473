//! Property search by name, hostname or edge hostname

use std::fmt;

use propgrid_common::validation::{OneOfValidator, RequiredValidator, Validate, Validator};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Keys the find-by-value endpoint accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    PropertyName,
    Hostname,
    EdgeHostname,
}

impl SearchKey {
    pub const ALL: &'static [&'static str] = &["propertyName", "hostname", "edgeHostname"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PropertyName => "propertyName",
            Self::Hostname => "hostname",
            Self::EdgeHostname => "edgeHostname",
        }
    }
}

impl fmt::Display for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search request, serialized as a single-entry object `{"<key>": "<value>"}`
///
/// The key is kept as a string so requests assembled from user input are
/// checked by validation rather than rejected at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub key: String,
    pub value: String,
}

impl SearchRequest {
    pub fn new(key: SearchKey, value: impl Into<String>) -> Self {
        Self { key: key.as_str().to_string(), value: value.into() }
    }
}

const SEARCH_KEYS: OneOfValidator = OneOfValidator::new(SearchKey::ALL);

impl Validate for SearchRequest {
    fn validate_into(&self, v: &mut Validator) {
        v.validate_field("SearchKey", self.key.as_str(), &RequiredValidator)
            .validate_field("SearchKey", self.key.as_str(), &SEARCH_KEYS)
            .validate_field("SearchValue", self.value.as_str(), &RequiredValidator);
    }
}

impl Serialize for SearchRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.value)?;
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub versions: SearchItems,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItems {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

/// One matching property version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default)]
    pub contract_id: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub production_status: String,
    #[serde(default)]
    pub property_id: String,
    #[serde(default)]
    pub property_name: String,
    #[serde(default)]
    pub property_version: i32,
    #[serde(default)]
    pub staging_status: String,
    #[serde(default)]
    pub updated_by_user: String,
    #[serde(default)]
    pub updated_date: String,
}
