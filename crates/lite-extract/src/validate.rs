//! Validation hook.
//!
//! After binding, request types that opt in with `#[lite(validate)]` are
//! passed to the app's [`RequestValidator`]. Failures become a 400 whose
//! `violations` list one entry per failed rule.

use lite_core::Violation;
use validator::{ValidationErrors, ValidationErrorsKind};

pub use validator::Validate;

/// Validates bound request values. Shared across requests.
pub trait RequestValidator: Send + Sync {
    /// Checks `target`, returning every violation found.
    fn validate(&self, target: &dyn Validate) -> Result<(), Vec<Violation>>;
}

/// Runs the `validator` crate rules declared on the type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl RequestValidator for DefaultValidator {
    fn validate(&self, target: &dyn Validate) -> Result<(), Vec<Violation>> {
        target.validate().map_err(|errors| violations(&errors))
    }
}

/// Flattens `validator` errors into violations with dotted property paths.
#[must_use]
pub fn violations(errors: &ValidationErrors) -> Vec<Violation> {
    let mut out = Vec::new();
    collect(errors, "", &mut out);
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<Violation>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errors) => {
                for error in errors {
                    let message = error
                        .message
                        .as_ref()
                        .map_or_else(
                            || format!("validation failed for field '{path}'"),
                            ToString::to_string,
                        );
                    out.push(Violation::new(path.clone(), message, error.code.to_string()));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    struct Named {
        name: String,
    }

    impl Validate for Named {
        fn validate(&self) -> Result<(), ValidationErrors> {
            let mut errors = ValidationErrors::new();
            if self.name.is_empty() {
                let mut error = ValidationError::new("required");
                error.message = Some("name must not be empty".into());
                errors.add("name", error);
            }
            if self.name.len() > 3 {
                errors.add("name", ValidationError::new("length"));
            }
            if errors.is_empty() {
                Ok(())
            } else {
                Err(errors)
            }
        }
    }

    #[test]
    fn valid_values_pass() {
        let ok = Named { name: "rex".into() };
        assert!(DefaultValidator.validate(&ok).is_ok());
    }

    #[test]
    fn failures_become_violations() {
        let violations = DefaultValidator
            .validate(&Named { name: String::new() })
            .unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].property_path, "name");
        assert_eq!(violations[0].message, "name must not be empty");
        assert_eq!(violations[0].code, "required");

        let violations = DefaultValidator
            .validate(&Named { name: "too long".into() })
            .unwrap_err();
        assert_eq!(violations[0].message, "validation failed for field 'name'");
        assert_eq!(violations[0].code, "length");
    }
}
