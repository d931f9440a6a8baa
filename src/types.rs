/// A result type that can contain warnings alongside the successful result.
///
/// The binder uses this to hand back the columns it created together with the
/// diagnostics for quantities that could not be resolved.
///
/// # Type Parameters
///
/// * `T` - The success result type
/// * `W` - The warning type (typically `String` for warning messages)
///
/// # Examples
///
/// ```rust
/// use simout::types::WithWarnings;
///
/// let result = WithWarnings::Warning(3, vec!["Zone(id=4).Flux unavailable".to_string()]);
/// assert!(result.is_warning());
/// assert_eq!(result.clone().unwrap(), 3);
///
/// let warnings = result.warnings();
/// assert_eq!(warnings.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum WithWarnings<T, W> {
    /// Successful result without warnings
    Ok(T),
    /// Successful result with warnings
    Warning(T, Vec<W>),
}

impl<T, W> WithWarnings<T, W> {
    /// Builds `Ok` when `warnings` is empty, `Warning` otherwise.
    pub fn new(value: T, warnings: Vec<W>) -> Self {
        if warnings.is_empty() {
            WithWarnings::Ok(value)
        } else {
            WithWarnings::Warning(value, warnings)
        }
    }

    /// Checks if the result is successful without warnings.
    pub fn is_ok(&self) -> bool {
        matches!(self, WithWarnings::Ok(_))
    }

    /// Checks if the result has warnings.
    pub fn is_warning(&self) -> bool {
        matches!(self, WithWarnings::Warning(_, _))
    }

    /// Borrows the result value.
    pub fn value(&self) -> &T {
        match self {
            WithWarnings::Ok(data) => data,
            WithWarnings::Warning(data, _) => data,
        }
    }

    /// Extracts the result value, discarding any warnings.
    pub fn unwrap(self) -> T {
        match self {
            WithWarnings::Ok(data) => data,
            WithWarnings::Warning(data, _) => data,
        }
    }

    /// Extracts the warnings, discarding the result value.
    ///
    /// Returns an empty vector if there were no warnings.
    pub fn warnings(self) -> Vec<W> {
        match self {
            WithWarnings::Ok(_) => Vec::new(),
            WithWarnings::Warning(_, warnings) => warnings,
        }
    }
}

impl<T, W> From<WithWarnings<T, W>> for (T, Vec<W>) {
    /// Converts `WithWarnings` into a tuple of (result, warnings).
    fn from(value: WithWarnings<T, W>) -> Self {
        match value {
            WithWarnings::Ok(data) => (data, Vec::new()),
            WithWarnings::Warning(data, warnings) => (data, warnings),
        }
    }
}

/// Outcome of validating a declarative structure.
///
/// Warnings never make a structure unusable; errors always do.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult<T = ()> {
    /// No findings.
    Valid(T),
    /// Usable, with warnings.
    Warnings(T, Vec<String>),
    /// Not usable: (warnings, errors).
    Invalid(Vec<String>, Vec<String>),
}

impl<T> ValidationResult<T> {
    pub fn is_valid(&self) -> bool {
        !self.is_invalid()
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationResult::Invalid(_, _))
    }

    /// All error messages, empty unless invalid.
    pub fn errors(&self) -> &[String] {
        match self {
            ValidationResult::Invalid(_, errors) => errors,
            _ => &[],
        }
    }

    /// All warning messages.
    pub fn warnings(&self) -> &[String] {
        match self {
            ValidationResult::Valid(_) => &[],
            ValidationResult::Warnings(_, warnings) => warnings,
            ValidationResult::Invalid(warnings, _) => warnings,
        }
    }
}

/// Structures that can check their own consistency.
pub trait Validate {
    fn validate(&self) -> ValidationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_warnings_new_picks_variant() {
        let ok: WithWarnings<u8, String> = WithWarnings::new(1, Vec::new());
        assert!(ok.is_ok());

        let warned = WithWarnings::new(1, vec!["w".to_string()]);
        assert!(warned.is_warning());
        let (value, warnings): (u8, Vec<String>) = warned.into();
        assert_eq!(value, 1);
        assert_eq!(warnings, vec!["w".to_string()]);
    }

    #[test]
    fn test_validation_result_accessors() {
        let invalid: ValidationResult =
            ValidationResult::Invalid(vec!["w".to_string()], vec!["e".to_string()]);
        assert!(invalid.is_invalid());
        assert_eq!(invalid.errors(), ["e".to_string()]);
        assert_eq!(invalid.warnings(), ["w".to_string()]);

        let valid: ValidationResult = ValidationResult::Valid(());
        assert!(valid.is_valid());
        assert!(valid.errors().is_empty());
    }
}
