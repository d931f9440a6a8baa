//! Error types for output setup and file handling.
//!
//! Setup failures are fatal and carry a chain of messages: each layer that
//! wraps an error adds its own context via [`ResultExt::context`], and
//! [`OutputError::chain`] renders the whole chain for the user.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::ValidationResult;
use crate::units::UnitError;

/// Fatal error raised while setting up or writing outputs.
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error while creating directories or writing stream files.
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration document could not be read or deserialized.
    #[error("Configuration error{context}: {message}")]
    Config {
        message: String,
        context: ErrorContext,
    },

    /// An output definition is missing a grid or object list name.
    #[error("Output definition #{index} has an empty/invalid {what} name")]
    EmptyReference { index: usize, what: &'static str },

    /// An output definition references an output grid that does not exist.
    #[error("Output definition #{index} references unknown/undefined output grid '{name}'")]
    UnknownSchedule { index: usize, name: String },

    /// An output definition references an object list that does not exist.
    #[error("Output definition #{index} references unknown/undefined object list '{name}'")]
    UnknownEntityFilter { index: usize, name: String },

    /// Two output definitions share a file name but use different grids.
    #[error(
        "Output definition #{index} requests output file '{stream}' with output grid '{schedule}', \
         but previous output definitions for the same file use output grid '{previous}'"
    )]
    ConflictingSchedule {
        index: usize,
        stream: String,
        schedule: String,
        previous: String,
    },

    /// A declarative structure failed validation.
    #[error("Validation error{context}: {message}")]
    Validation {
        message: String,
        context: ErrorContext,
        warnings: Vec<String>,
        errors: Vec<String>,
    },

    /// Unknown or malformed unit.
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// The configured output time unit does not measure time.
    #[error("Output time unit '{0}' is not a unit of time")]
    NotATimeUnit(String),

    /// A quantity requested as time integral has a unit that cannot be integrated.
    #[error("Cannot obtain time integral unit for unit '{unit}' of output '{column}'")]
    IntegralUnit { column: String, unit: String },

    /// A lower-level error with an explanation of what was being done.
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: Box<OutputError>,
    },

    /// Multiple errors occurred.
    #[error("Multiple errors occurred:\n{}", format_errors(.0))]
    Multiple(Vec<OutputError>),
}

fn format_errors(errors: &[OutputError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(idx, error)| format!("  {}. {}", idx + 1, error))
        .collect::<Vec<_>>()
        .join("\n")
}

impl OutputError {
    /// Renders this error and all of its sources, outermost first.
    pub fn chain(&self) -> String {
        let mut lines = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            lines.push(format!("  caused by: {}", err));
            source = err.source();
        }
        lines.join("\n")
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OutputError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Context information for error reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    /// The file path where the error occurred (if available).
    pub file_path: Option<PathBuf>,
    /// Additional context about what was being processed.
    pub parsing: Option<String>,
}

impl ErrorContext {
    /// Create a new empty error context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error context with file path.
    pub fn with_file_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            file_path: Some(path.into()),
            parsing: None,
        }
    }

    /// Add parsing context information.
    pub fn with_parsing<S: Into<String>>(mut self, parsing: S) -> Self {
        self.parsing = Some(parsing.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(ref path) = self.file_path {
            parts.push(format!(" in file '{}'", path.display()));
        }

        if let Some(ref parsing) = self.parsing {
            parts.push(format!(" while processing {}", parsing));
        }

        write!(f, "{}", parts.join(","))
    }
}

/// Attaches a context message to the error of a `Result`.
pub trait ResultExt<T> {
    fn context<S: Into<String>>(self, message: S) -> Result<T, OutputError>;
}

impl<T, E: Into<OutputError>> ResultExt<T> for Result<T, E> {
    fn context<S: Into<String>>(self, message: S) -> Result<T, OutputError> {
        self.map_err(|err| OutputError::Context {
            message: message.into(),
            source: Box::new(err.into()),
        })
    }
}

/// Helper trait for converting validation results to `OutputError`.
pub trait IntoOutputError {
    /// Returns `Some` only for invalid results.
    fn into_output_error(self, context: ErrorContext) -> Option<OutputError>;
}

impl IntoOutputError for ValidationResult {
    fn into_output_error(self, context: ErrorContext) -> Option<OutputError> {
        match self {
            ValidationResult::Valid(_) | ValidationResult::Warnings(_, _) => None,
            ValidationResult::Invalid(warnings, errors) => {
                let message = if errors.len() == 1 {
                    errors[0].clone()
                } else {
                    format!("{} validation errors", errors.len())
                };
                Some(OutputError::Validation {
                    message,
                    context,
                    warnings,
                    errors,
                })
            }
        }
    }
}
