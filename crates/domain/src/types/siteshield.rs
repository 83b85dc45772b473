//! Site shield map models

use propgrid_common::validation::{RequiredValidator, Validate, Validator};
use serde::{Deserialize, Serialize};

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Identifies a single site shield map
///
/// Also sent as the acknowledge body, hence the serialized field name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SiteShieldMapRequest {
    #[serde(rename = "UniqueID")]
    pub unique_id: i64,
}

impl Validate for SiteShieldMapRequest {
    fn validate_into(&self, v: &mut Validator) {
        v.validate_field("UniqueID", &self.unique_id, &RequiredValidator);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSiteShieldMapsResponse {
    #[serde(default)]
    pub site_shield_maps: Vec<SiteShieldMap>,
}

/// Current and proposed CIDR blocks for a map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteShieldMap {
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub contacts: Vec<String>,
    #[serde(default)]
    pub current_cidrs: Vec<String>,
    #[serde(default)]
    pub proposed_cidrs: Vec<String>,
    #[serde(default)]
    pub rule_name: String,
    #[serde(rename = "type", default)]
    pub map_type: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub shared: bool,
    /// Epoch milliseconds
    #[serde(default)]
    pub acknowledge_required_by: i64,
    /// Epoch milliseconds
    #[serde(default)]
    pub previously_acknowledged_on: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub latest_ticket_id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub map_alias: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub mcm_map_rule_id: i64,
}
