use std::fmt;

/// Compilation error
///
/// Returned by [`compile`](super::compile) and the reference table when a
/// document cannot be turned into routes. All variants are fatal to startup;
/// nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// The document failed the version gate or is structurally unusable.
    Validation {
        /// What was wrong with the document
        message: String,
    },
    /// A `$ref` could not be resolved against the bundled document.
    ///
    /// The document handed to the compiler must be bundled: every reference
    /// target reachable by URI lookup. A miss here means the bundling
    /// collaborator left a dangling reference.
    UnresolvedReference {
        /// The reference that failed to resolve
        reference: String,
    },
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::Validation { message } => {
                write!(f, "invalid OpenAPI document: {message}")
            }
            SpecError::UnresolvedReference { reference } => {
                write!(f, "unresolvable reference `{reference}` in OpenAPI document")
            }
        }
    }
}

impl std::error::Error for SpecError {}
