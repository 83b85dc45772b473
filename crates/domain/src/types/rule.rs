//! Rule tree models
//!
//! A rule tree is a recursive structure of named rules, each carrying
//! behaviors, criteria, variables and child rules. Behavior and criterion
//! options are schema-less and kept as ordered JSON maps.

use once_cell::sync::Lazy;
use propgrid_common::validation::{
    OneOfValidator, RequiredValidator, StringValidator, Validate, Validator,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::RULE_VALIDATE_MODES;

/// Open key/value bag of behavior or criterion options
pub type RuleOptionsMap = Map<String, Value>;

#[allow(clippy::expect_used)]
static RULE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(latest|v\d{4}-\d{2}-\d{2})$").expect("rule format pattern is valid"));

const VALIDATE_MODE: OneOfValidator = OneOfValidator::new(RULE_VALIDATE_MODES);

fn is_false(value: &bool) -> bool {
    !*value
}

/// Path and query parameters for fetching a rule tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetRuleTreeRequest {
    pub property_id: String,
    pub property_version: i32,
    pub contract_id: String,
    pub group_id: String,
    /// `fast` or `full`; empty leaves the server default
    pub validate_mode: String,
    pub validate_rules: bool,
    /// `latest` or a dated format such as `v2023-01-05`
    pub rule_format: String,
}

impl Validate for GetRuleTreeRequest {
    fn validate_into(&self, v: &mut Validator) {
        v.validate_field("PropertyID", self.property_id.as_str(), &RequiredValidator)
            .validate_field("PropertyVersion", &self.property_version, &RequiredValidator)
            .validate_field("ValidateMode", self.validate_mode.as_str(), &VALIDATE_MODE)
            .validate_field(
                "RuleFormat",
                self.rule_format.as_str(),
                &StringValidator::new().regex(RULE_FORMAT.clone()),
            );
    }
}

/// Rule tree as returned by the fetch endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRuleTreeResponse {
    #[serde(default)]
    pub property_id: String,
    #[serde(default)]
    pub property_version: i32,
    #[serde(default)]
    pub etag: String,
    #[serde(default)]
    pub rule_format: String,
    #[serde(default)]
    pub rules: Rules,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comments: String,
}

/// A single rule and, recursively, its children
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub advanced_override: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behaviors: Vec<RuleBehavior>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Rules>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comments: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criteria: Vec<RuleBehavior>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub criteria_locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_override: Option<RuleCustomOverride>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: RuleOptions,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_uuid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_link: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<RuleVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria_must_satisfy: Option<RuleCriteriaMustSatisfy>,
}

impl Validate for Rules {
    fn validate_into(&self, v: &mut Validator) {
        v.validate_field("Name", self.name.as_str(), &RequiredValidator)
            .validate_nested("CustomOverride", &self.custom_override)
            .validate_each("Children", &self.children)
            .validate_each("Variables", &self.variables);
    }
}

/// Behavior or criterion: a name plus an open options bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBehavior {
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: RuleOptionsMap,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_uuid: String,
}

impl RuleBehavior {
    pub fn new(name: impl Into<String>, options: RuleOptionsMap) -> Self {
        Self { name: name.into(), options, ..Self::default() }
    }
}

/// Reference to an advanced override defined outside the tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCustomOverride {
    pub name: String,
    pub override_id: String,
}

impl Validate for RuleCustomOverride {
    fn validate_into(&self, v: &mut Validator) {
        v.validate_field("Name", self.name.as_str(), &RequiredValidator)
            .validate_field("OverrideID", self.override_id.as_str(), &RequiredValidator);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOptions {
    #[serde(rename = "is_secure", default, skip_serializing_if = "is_false")]
    pub is_secure: bool,
}

/// Property variable declared on a rule
///
/// `description` distinguishes absent (`None`), explicit `null`
/// (`Some(None)`) and a string value. `value` must be present once the
/// variable is, though it may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleVariable {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub value: Option<String>,
}

impl Validate for RuleVariable {
    fn validate_into(&self, v: &mut Validator) {
        v.validate_field("Name", self.name.as_str(), &RequiredValidator)
            .validate_not_nil("Value", self.value.as_ref());
    }
}

/// How a rule's criteria combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCriteriaMustSatisfy {
    All,
    Any,
}

/// Parameters and body for replacing a rule tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRulesRequest {
    pub property_id: String,
    pub property_version: i32,
    pub contract_id: String,
    pub dry_run: bool,
    pub group_id: String,
    pub validate_mode: String,
    pub validate_rules: bool,
    pub rules: RulesUpdate,
}

impl Validate for UpdateRulesRequest {
    fn validate_into(&self, v: &mut Validator) {
        v.validate_field("PropertyID", self.property_id.as_str(), &RequiredValidator)
            .validate_field("PropertyVersion", &self.property_version, &RequiredValidator)
            .validate_field("ValidateMode", self.validate_mode.as_str(), &VALIDATE_MODE)
            .validate_nested("Rules", &self.rules);
    }
}

/// Request body of the rule tree update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesUpdate {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comments: String,
    pub rules: Rules,
}

impl Validate for RulesUpdate {
    fn validate_into(&self, v: &mut Validator) {
        v.validate_nested("Rules", &self.rules);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRulesResponse {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub contract_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comments: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub property_id: String,
    #[serde(default)]
    pub property_version: i32,
    #[serde(default)]
    pub etag: String,
    #[serde(default)]
    pub rule_format: String,
    #[serde(default)]
    pub rules: Rules,
    #[serde(default)]
    pub errors: Vec<RuleError>,
    #[serde(default)]
    pub warnings: Vec<RuleWarnings>,
}

/// Validation error reported against the submitted tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleError {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub behavior_name: String,
    #[serde(default)]
    pub error_location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleWarnings {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub warning_type: String,
    #[serde(default)]
    pub error_location: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub current_rule_format: String,
    #[serde(default)]
    pub suggested_rule_format: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn variable(name: &str, value: Option<&str>) -> RuleVariable {
        RuleVariable {
            name: name.to_string(),
            value: value.map(str::to_string),
            hidden: true,
            ..RuleVariable::default()
        }
    }

    fn get_request() -> GetRuleTreeRequest {
        GetRuleTreeRequest {
            property_id: "prp_1".into(),
            property_version: 2,
            contract_id: "ctr_1".into(),
            group_id: "grp_1".into(),
            validate_mode: "fast".into(),
            validate_rules: false,
            rule_format: String::new(),
        }
    }

    #[test]
    fn test_get_request_valid() {
        assert!(get_request().validate().is_ok());

        let mut dated = get_request();
        dated.rule_format = "v2021-01-01".into();
        assert!(dated.validate().is_ok());
    }

    #[test]
    fn test_get_request_reports_every_field() {
        let request = GetRuleTreeRequest {
            validate_mode: "test".into(),
            rule_format: "invalid".into(),
            ..GetRuleTreeRequest::default()
        };
        let err = request.validate().unwrap_err();
        let fields: Vec<&str> = err.fields().collect();
        assert_eq!(fields, vec!["PropertyID", "PropertyVersion", "ValidateMode", "RuleFormat"]);
    }

    #[test]
    fn test_update_request_nested_variable_path() {
        let request = UpdateRulesRequest {
            property_id: "prp_id".into(),
            property_version: 1,
            contract_id: "ctr_id".into(),
            group_id: "grp_id".into(),
            rules: RulesUpdate {
                comments: "version comment".into(),
                rules: Rules {
                    name: "default".into(),
                    variables: vec![
                        variable("TEST_EMPTY_FIELDS", Some("")),
                        variable("TEST_NIL_FIELDS", None),
                    ],
                    ..Rules::default()
                },
            },
            ..UpdateRulesRequest::default()
        };

        let err = request.validate().unwrap_err();
        assert_eq!(err.error_count(), 1);
        assert_eq!(err.field_errors("Rules.Rules.Variables[1].Value")[0].message, "is required");
    }

    #[test]
    fn test_children_and_override_validated() {
        let rules = Rules {
            name: "default".into(),
            custom_override: Some(RuleCustomOverride::default()),
            children: vec![Rules {
                name: String::new(),
                children: vec![Rules { name: "leaf".into(), ..Rules::default() }],
                ..Rules::default()
            }],
            ..Rules::default()
        };

        let err = rules.validate().unwrap_err();
        let fields: Vec<&str> = err.fields().collect();
        assert_eq!(
            fields,
            vec!["CustomOverride.Name", "CustomOverride.OverrideID", "Children[0].Name"]
        );
    }

    #[test]
    fn test_rules_serialization_omits_empty() {
        let rules = Rules { name: "default".into(), ..Rules::default() };
        assert_eq!(
            serde_json::to_value(&rules).unwrap(),
            json!({"name": "default", "options": {}})
        );

        let secure = Rules {
            name: "default".into(),
            options: RuleOptions { is_secure: true },
            criteria_must_satisfy: Some(RuleCriteriaMustSatisfy::All),
            ..Rules::default()
        };
        assert_eq!(
            serde_json::to_value(&secure).unwrap(),
            json!({"name": "default", "options": {"is_secure": true}, "criteriaMustSatisfy": "all"})
        );
    }

    #[test]
    fn test_variable_description_three_states() {
        let absent: RuleVariable =
            serde_json::from_value(json!({"name": "A", "value": "", "hidden": false, "sensitive": false}))
                .unwrap();
        let null: RuleVariable = serde_json::from_value(
            json!({"name": "A", "value": "", "description": null, "hidden": false, "sensitive": false}),
        )
        .unwrap();
        let empty: RuleVariable = serde_json::from_value(
            json!({"name": "A", "value": "", "description": "", "hidden": false, "sensitive": false}),
        )
        .unwrap();

        assert_eq!(absent.description, None);
        assert_eq!(null.description, Some(None));
        assert_eq!(empty.description, Some(Some(String::new())));

        assert!(serde_json::to_value(&absent).unwrap().get("description").is_none());
        assert_eq!(serde_json::to_value(&null).unwrap()["description"], Value::Null);
        assert_eq!(serde_json::to_value(&empty).unwrap()["description"], json!(""));
    }

    #[test]
    fn test_variable_value_null_is_serialized() {
        let value = serde_json::to_value(variable("V", None)).unwrap();
        assert_eq!(value["value"], Value::Null);
    }

    #[test]
    fn test_behavior_options_keep_order() {
        let behavior: RuleBehavior = serde_json::from_str(
            r#"{"name":"origin","options":{"originType":"CUSTOMER","hostname":"a.example.com","ports":""}}"#,
        )
        .unwrap();
        let keys: Vec<&String> = behavior.options.keys().collect();
        assert_eq!(keys, vec!["originType", "hostname", "ports"]);
    }
}
