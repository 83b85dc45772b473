//! Rule format listing

use serde::{Deserialize, Serialize};

/// Available rule formats, newest schemas included
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRuleFormatsResponse {
    #[serde(default)]
    pub rule_formats: RuleFormatItems,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFormatItems {
    #[serde(default)]
    pub items: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_formats() {
        let body = r#"{"ruleFormats":{"items":["latest","v2015-08-08","v2016-11-15"]}}"#;
        let response: GetRuleFormatsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.rule_formats.items, vec!["latest", "v2015-08-08", "v2016-11-15"]);
    }
}
