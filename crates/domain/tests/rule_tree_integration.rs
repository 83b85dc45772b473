//! Integration tests for rule tree types
//!
//! Wire compatibility of nested rule trees and their validation

use propgrid_common::validation::Validate;
use propgrid_domain::types::rule::{
    RuleBehavior, RuleCriteriaMustSatisfy, RuleVariable, Rules, RulesUpdate, UpdateRulesRequest,
    UpdateRulesResponse,
};
use serde_json::json;

const UPDATE_BODY: &str = r#"{"comments":"version comment","rules":{"behaviors":[{"name":"origin","options":{"cacheKeyHostname":"REQUEST_HOST_HEADER","compress":true,"enableTrueClientIp":true,"forwardHostHeader":"REQUEST_HOST_HEADER","hostname":"httpbin.smth.online","httpPort":80,"httpsPort":443,"originCertificate":"","originSni":true,"originType":"CUSTOMER","ports":"","trueClientIpClientSetting":false,"trueClientIpHeader":"True-Client-IP","verificationMode":"PLATFORM_SETTINGS"}}],"children":[{"behaviors":[{"name":"baseDirectory","options":{"value":"/smth/"}}],"criteria":[{"name":"requestHeader","options":{"headerName":"Accept-Encoding","matchCaseSensitiveValue":true,"matchOperator":"IS_ONE_OF","matchWildcardName":false,"matchWildcardValue":false}}],"name":"change fwd path","options":{},"criteriaMustSatisfy":"all"},{"behaviors":[{"name":"caching","options":{"behavior":"MAX_AGE","mustRevalidate":false,"ttl":"1m"}}],"name":"caching","options":{},"criteriaMustSatisfy":"any"}],"comments":"The behaviors in the Default Rule apply to all requests for the property hostname(s) unless another rule overrides the Default Rule settings.","name":"default","options":{},"variables":[{"description":"","hidden":true,"name":"TEST_EMPTY_FIELDS","sensitive":false,"value":""},{"description":null,"hidden":true,"name":"TEST_NIL_DESCRIPTION","sensitive":false,"value":""}]}}"#;

/// A tree decoded from the wire encodes back to the same bytes
#[test]
fn test_update_body_round_trip() {
    let update: RulesUpdate = serde_json::from_str(UPDATE_BODY).unwrap();

    assert_eq!(update.rules.name, "default");
    assert_eq!(update.rules.children.len(), 2);
    assert_eq!(update.rules.children[0].criteria_must_satisfy, Some(RuleCriteriaMustSatisfy::All));
    assert_eq!(update.rules.variables[0].description, Some(Some(String::new())));
    assert_eq!(update.rules.variables[1].description, Some(None));

    assert_eq!(serde_json::to_string(&update).unwrap(), UPDATE_BODY);
}

/// Building a tree in code and decoding its encoding yields the same value
#[test]
fn test_constructed_tree_round_trip() {
    let options = json!({"behavior": "MAX_AGE", "mustRevalidate": false, "ttl": "1m"});
    let tree = Rules {
        name: "default".into(),
        behaviors: vec![RuleBehavior::new("caching", options.as_object().cloned().unwrap())],
        children: vec![Rules {
            name: "child".into(),
            criteria_locked: true,
            ..Rules::default()
        }],
        variables: vec![RuleVariable {
            name: "PMUSER_A".into(),
            value: Some("1".into()),
            description: Some(Some("first".into())),
            ..RuleVariable::default()
        }],
        ..Rules::default()
    };

    let encoded = serde_json::to_string(&tree).unwrap();
    let decoded: Rules = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, tree);
}

/// Errors and warnings in the update response are decoded
#[test]
fn test_update_response_with_findings() {
    let body = json!({
        "accountId": "act_1",
        "contractId": "ctr_1",
        "groupId": "grp_1",
        "propertyId": "prp_1",
        "propertyVersion": 2,
        "etag": "etag",
        "ruleFormat": "v2020-09-16",
        "rules": {"name": "default", "options": {"is_secure": false}},
        "errors": [{
            "type": "https://problems.luna.akamaiapis.net/papi/v0/validation/required_feature_any",
            "errorLocation": "#/rules",
            "detail": "Add a Content Provider Code behavior in any rule."
        }],
        "warnings": [{
            "title": "Unstable rule format",
            "type": "https://problems.luna.akamaiapis.net/papi/v0/unstable_rule_format",
            "currentRuleFormat": "latest",
            "suggestedRuleFormat": "v2023-01-05"
        }]
    });

    let response: UpdateRulesResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].error_location, "#/rules");
    assert_eq!(response.warnings[0].suggested_rule_format, "v2023-01-05");
    assert!(!response.rules.options.is_secure);
}

/// Violations deep in the tree are reported with their full path
#[test]
fn test_deep_validation_paths() {
    let mut update: RulesUpdate = serde_json::from_str(UPDATE_BODY).unwrap();
    update.rules.children[1].name = String::new();
    update.rules.variables[1].value = None;

    let request = UpdateRulesRequest {
        property_id: "prp_1".into(),
        property_version: 1,
        validate_mode: "full".into(),
        rules: update,
        ..UpdateRulesRequest::default()
    };

    let err = request.validate().unwrap_err();
    let fields: Vec<&str> = err.fields().collect();
    assert_eq!(fields, vec!["Rules.Rules.Children[1].Name", "Rules.Rules.Variables[1].Value"]);
}
