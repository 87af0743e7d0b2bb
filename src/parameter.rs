//! Local precondition checks shared by both facades.

use thiserror::Error;

/// Raised before any remote call when a required parameter cannot be
/// resolved from either the call arguments or the stored defaults.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("missing required parameter: {field}")]
pub struct MissingParameterError {
    /// Name of the parameter that could not be resolved.
    pub field: String,
}

impl MissingParameterError {
    /// Creates an error naming the missing field.
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

/// Picks the per-call value when present and non-blank, otherwise the stored
/// default, failing when neither is usable.
///
/// Both candidates are trimmed; a whitespace-only value counts as absent.
///
/// # Errors
///
/// Returns [`MissingParameterError`] naming `field` when neither value is
/// usable.
pub fn resolve<'a>(
    field: &str,
    explicit: Option<&'a str>,
    default: Option<&'a str>,
) -> Result<&'a str, MissingParameterError> {
    explicit
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| default.map(str::trim).filter(|value| !value.is_empty()))
        .ok_or_else(|| MissingParameterError::new(field))
}

/// Ensures a required value is non-blank.
///
/// # Errors
///
/// Returns [`MissingParameterError`] naming `field` when `value` is empty
/// after trimming.
pub fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, MissingParameterError> {
    resolve(field, Some(value), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("explicit"), Some("default"), "explicit")]
    #[case(None, Some("default"), "default")]
    #[case(Some("   "), Some("default"), "default")]
    #[case(Some(" padded "), None, "padded")]
    fn resolve_prefers_explicit_values(
        #[case] explicit: Option<&str>,
        #[case] default: Option<&str>,
        #[case] expected: &str,
    ) {
        let resolved = resolve("field", explicit, default)
            .unwrap_or_else(|err| panic!("value should resolve: {err}"));
        assert_eq!(resolved, expected);
    }

    #[test]
    fn resolve_names_the_missing_field() {
        let err = resolve("instance_name", None, Some(" ")).expect_err("blank default is absent");
        assert_eq!(err, MissingParameterError::new("instance_name"));
        assert_eq!(err.to_string(), "missing required parameter: instance_name");
    }
}
