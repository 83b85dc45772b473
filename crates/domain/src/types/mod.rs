//! Request and response models
//!
//! Path/query request structs are plain Rust; bodies follow the remote JSON
//! contract through serde.

pub mod rule;
pub mod rule_format;
pub mod search;
pub mod siteshield;

pub use rule::{
    GetRuleTreeRequest, GetRuleTreeResponse, RuleBehavior, RuleCriteriaMustSatisfy,
    RuleCustomOverride, RuleError, RuleOptions, RuleOptionsMap, RuleVariable, RuleWarnings, Rules,
    RulesUpdate, UpdateRulesRequest, UpdateRulesResponse,
};
pub use rule_format::{GetRuleFormatsResponse, RuleFormatItems};
pub use search::{SearchItem, SearchItems, SearchKey, SearchRequest, SearchResponse};
pub use siteshield::{GetSiteShieldMapsResponse, SiteShieldMap, SiteShieldMapRequest};
