use crate::types::ValidationResult;

pub fn _chain<T>(
    result: ValidationResult<T>,
    warnings: &mut Vec<String>,
    errors: &mut Vec<String>,
) {
    match result {
        ValidationResult::Valid(_) => {}
        ValidationResult::Warnings(_, warns) => {
            warnings.extend(warns);
        }
        ValidationResult::Invalid(warns, errs) => {
            warnings.extend(warns);
            errors.extend(errs);
        }
    }
}

pub fn _return(warnings: Vec<String>, errors: Vec<String>) -> ValidationResult {
    if !errors.is_empty() {
        ValidationResult::Invalid(warnings, errors)
    } else if !warnings.is_empty() {
        ValidationResult::Warnings((), warnings)
    } else {
        ValidationResult::Valid(())
    }
}

/// Relative tolerance used when comparing simulation time points.
const FUZZY_TOLERANCE: f64 = 1e-10;

/// Compares two time points with a tolerance relative to their magnitude.
pub fn fuzzy_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= FUZZY_TOLERANCE * scale
}

/// `a <= b` within [`fuzzy_eq`] tolerance.
pub fn fuzzy_le(a: f64, b: f64) -> bool {
    a < b || fuzzy_eq(a, b)
}

pub fn validate_finite(value: f64, what: &str) -> ValidationResult {
    let warnings = Vec::new();
    let mut errors = Vec::new();

    if value.is_nan() || value.is_infinite() {
        errors.push(format!("{} is not a valid number: {}", what, value));
    }

    _return(warnings, errors)
}

pub fn validate_name(name: &str, what: &str) -> ValidationResult {
    let warnings = Vec::new();
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push(format!("{} has an empty name.", what));
    }

    _return(warnings, errors)
}
