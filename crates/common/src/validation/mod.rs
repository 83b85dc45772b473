// Validation Module - aggregated, path-aware request validation
use std::fmt;

mod validators;

pub use validators::{FieldValidator, OneOfValidator, RequiredValidator, StringValidator};

/// Type alias for validation results
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error carrying every field-level violation found in one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Create a new, empty validation error
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Create with a single field error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.add_field_error(field, message);
        err
    }

    /// Add a field-level error
    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get error count
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Get errors for a specific field path
    pub fn field_errors(&self, field: &str) -> Vec<&FieldError> {
        self.errors.iter().filter(|e| e.field == field).collect()
    }

    /// Whether any violation was reported for `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Field paths in the order they were reported
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.field.as_str())
    }

    /// Merge another validation error into this one
    pub fn merge(&mut self, other: ValidationError) {
        self.errors.extend(other.errors);
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "Validation error with no specific field errors")?;
        } else if self.errors.len() == 1 {
            write!(f, "{}: {}", self.errors[0].field, self.errors[0].message)?;
        } else {
            write!(f, "{} errors: ", self.errors.len())?;
            for (i, error) in self.errors.iter().enumerate() {
                if i > 0 {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", error.field, error.message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Individual field error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Full path of the offending field, e.g. `Rules.Variables[1].Value`
    pub field: String,
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Types that know how to report their own violations into a [`Validator`].
///
/// Implementations must not short-circuit: every rule is evaluated so the
/// caller sees all invalid fields at once.
pub trait Validate {
    /// Report violations, relative to the validator's current path
    fn validate_into(&self, validator: &mut Validator);

    /// Validate from the root and return the aggregate
    fn validate(&self) -> ValidationResult<()> {
        let mut validator = Validator::new();
        self.validate_into(&mut validator);
        validator.finalize()
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate_into(&self, validator: &mut Validator) {
        if let Some(inner) = self {
            inner.validate_into(validator);
        }
    }
}

/// Collects violations while walking a (possibly nested) structure
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationError,
    path: Vec<String>,
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    fn qualify(&self, field: &str) -> String {
        if self.path.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.path.join("."), field)
        }
    }

    /// Current nested path, joined with `.`
    pub fn current_path(&self) -> String {
        self.path.join(".")
    }

    /// Add an error for `field` under the current path
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        let field = self.qualify(field);
        self.errors.add_field_error(field, message);
    }

    /// Validate a field with a specific validator
    pub fn validate_field<T, V>(&mut self, field: &str, value: &T, validator: &V) -> &mut Self
    where
        T: ?Sized,
        V: FieldValidator<T> + ?Sized,
    {
        if let Err(msg) = validator.validate(value) {
            self.add_error(field, msg);
        }
        self
    }

    /// Validate string is not blank
    pub fn validate_not_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add_error(field, "cannot be blank");
        }
        self
    }

    /// Validate an optional-but-structurally-required value is present
    pub fn validate_not_nil<T>(&mut self, field: &str, value: Option<&T>) -> &mut Self {
        if value.is_none() {
            self.add_error(field, "is required");
        }
        self
    }

    /// Validate a nested structure, reporting its errors under `field`
    pub fn validate_nested<T>(&mut self, field: &str, value: &T) -> &mut Self
    where
        T: Validate + ?Sized,
    {
        self.path.push(field.to_string());
        value.validate_into(self);
        self.path.pop();
        self
    }

    /// Validate every element of a slice, reporting under `field[i]`
    pub fn validate_each<T>(&mut self, field: &str, items: &[T]) -> &mut Self
    where
        T: Validate,
    {
        for (index, item) in items.iter().enumerate() {
            self.path.push(format!("{field}[{index}]"));
            item.validate_into(self);
            self.path.pop();
        }
        self
    }

    /// Check if validation has errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get error count
    pub fn error_count(&self) -> usize {
        self.errors.error_count()
    }

    /// Get errors without consuming validator
    pub fn errors(&self) -> &ValidationError {
        &self.errors
    }

    /// Finalize and return result
    pub fn finalize(self) -> ValidationResult<()> {
        self.errors.into_result()
    }
}
