//! Wire-level constants
//!
//! Paths, header names and media types shared by the session and the
//! endpoint clients.

// Path prefixes
pub const PAPI_PREFIX: &str = "/papi/";
pub const SITESHIELD_PREFIX: &str = "/siteshield/";

// Headers consumed by the retry policy
pub const HEADER_RATE_LIMIT_NEXT: &str = "X-RateLimit-Next";
pub const HEADER_RETRY_AFTER: &str = "Retry-After";

// Media types
pub const MEDIA_TYPE_JSON: &str = "application/json";

/// Validation modes accepted by rule tree endpoints
pub const RULE_VALIDATE_MODES: &[&str] = &[RULE_VALIDATE_MODE_FAST, RULE_VALIDATE_MODE_FULL];
pub const RULE_VALIDATE_MODE_FAST: &str = "fast";
pub const RULE_VALIDATE_MODE_FULL: &str = "full";

/// `Accept` media type selecting a rule format, e.g. `latest` or `v2023-01-05`
pub fn rule_format_media_type(format: &str) -> String {
    format!("application/vnd.akamai.papirules.{format}+json")
}

// Sentinel error bodies
pub const LIMIT_KEY_DEFAULT_CERTS: &str = "DEFAULT_CERTS_PER_CONTRACT";
pub const TYPE_SBD_NOT_ENABLED: &str = "https://problems.luna.akamaiapis.net/papi/v0/property-version-hostname/default-cert-provisioning-unavailable";
