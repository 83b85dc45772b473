// Field Validators - Reusable validation components

/// Trait for field validators
pub trait FieldValidator<T: ?Sized> {
    /// Validate a field value, returning the violation message on failure
    fn validate(&self, value: &T) -> Result<(), String>;
}

/// Requires a value to differ from its type's zero value
///
/// Strings must be non-blank, numbers non-zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

impl RequiredValidator {
    pub fn new() -> Self {
        Self
    }
}

impl FieldValidator<str> for RequiredValidator {
    fn validate(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Err("cannot be blank".to_string());
        }
        Ok(())
    }
}

impl FieldValidator<String> for RequiredValidator {
    fn validate(&self, value: &String) -> Result<(), String> {
        FieldValidator::<str>::validate(self, value.as_str())
    }
}

macro_rules! required_number {
    ($($t:ty),*) => {
        $(
            impl FieldValidator<$t> for RequiredValidator {
                fn validate(&self, value: &$t) -> Result<(), String> {
                    if *value == 0 {
                        return Err("cannot be blank".to_string());
                    }
                    Ok(())
                }
            }
        )*
    };
}

required_number!(i32, i64, u32, u64, usize);

/// String validator with various constraints
///
/// Pattern and length constraints are skipped for empty input unless
/// `not_empty` is also set, so optional fields can share the same rules.
#[derive(Debug, Clone, Default)]
pub struct StringValidator {
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<regex::Regex>,
    not_empty: bool,
}

impl StringValidator {
    /// Create a new string validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Require non-empty string
    pub fn not_empty(mut self) -> Self {
        self.not_empty = true;
        self
    }

    /// Set minimum length
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Set maximum length
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Set pattern to match
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(regex::Regex::new(pattern)?);
        Ok(self)
    }

    /// Use an already compiled pattern
    pub fn regex(mut self, regex: regex::Regex) -> Self {
        self.pattern = Some(regex);
        self
    }
}

impl FieldValidator<str> for StringValidator {
    fn validate(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            if self.not_empty {
                return Err("cannot be blank".to_string());
            }
            return Ok(());
        }

        if let Some(min) = self.min_length {
            if value.chars().count() < min {
                return Err(format!("the length must be at least {min}"));
            }
        }

        if let Some(max) = self.max_length {
            if value.chars().count() > max {
                return Err(format!("the length must be no more than {max}"));
            }
        }

        if let Some(ref pattern) = self.pattern {
            if !pattern.is_match(value) {
                return Err("must be in a valid format".to_string());
            }
        }

        Ok(())
    }
}

impl FieldValidator<String> for StringValidator {
    fn validate(&self, value: &String) -> Result<(), String> {
        FieldValidator::<str>::validate(self, value.as_str())
    }
}

/// Enum membership: the value must be one of a fixed literal set
///
/// Empty input passes; combine with [`RequiredValidator`] when the field is
/// mandatory.
#[derive(Debug, Clone, Copy)]
pub struct OneOfValidator {
    allowed: &'static [&'static str],
}

impl OneOfValidator {
    pub const fn new(allowed: &'static [&'static str]) -> Self {
        Self { allowed }
    }
}

impl FieldValidator<str> for OneOfValidator {
    fn validate(&self, value: &str) -> Result<(), String> {
        if value.is_empty() || self.allowed.contains(&value) {
            return Ok(());
        }
        Err(format!("value '{}' is invalid. Must be one of: {}", value, self.allowed.join(", ")))
    }
}

impl FieldValidator<String> for OneOfValidator {
    fn validate(&self, value: &String) -> Result<(), String> {
        FieldValidator::<str>::validate(self, value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;
    use regex::Regex;

    use super::*;

    static DATE_STAMP: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(latest|v\d{4}-\d{2}-\d{2})$").expect("valid regex"));

    #[test]
    fn test_required_strings_and_numbers() {
        let v = RequiredValidator::new();
        assert!(v.validate("prp_1").is_ok());
        assert!(FieldValidator::<str>::validate(&v, "   ").is_ok());
        assert!(FieldValidator::<str>::validate(&v, "").is_err());
        assert!(v.validate(&3_i32).is_ok());
        assert_eq!(v.validate(&0_i32), Err("cannot be blank".to_string()));
    }

    #[test]
    fn test_string_pattern_skips_empty_unless_required() {
        let optional = StringValidator::new().regex(DATE_STAMP.clone());
        assert!(optional.validate("").is_ok());
        assert!(optional.validate("latest").is_ok());
        assert!(optional.validate("v2023-01-05").is_ok());
        assert!(optional.validate("v2023-1-5").is_err());

        let required = StringValidator::new().not_empty().regex(DATE_STAMP.clone());
        assert_eq!(required.validate(""), Err("cannot be blank".to_string()));
    }

    #[test]
    fn test_string_length_bounds() {
        let v = StringValidator::new().min_length(2).max_length(4);
        assert!(v.validate("ab").is_ok());
        assert!(v.validate("a").is_err());
        assert!(v.validate("abcde").is_err());
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        assert!(StringValidator::new().pattern("(").is_err());
    }

    #[test]
    fn test_one_of() {
        const MODES: OneOfValidator = OneOfValidator::new(&["fast", "full"]);
        assert!(MODES.validate("fast").is_ok());
        assert!(MODES.validate("").is_ok());
        let err = MODES.validate("slow").unwrap_err();
        assert!(err.contains("fast, full"));
    }
}
