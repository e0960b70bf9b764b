use std::fmt;

use super::core::ResolutionMode;

/// Handler resolution error
///
/// Every variant is fatal to startup. The one deliberately missing case is
/// "no mode produced a handler": that is not an error here, it becomes the
/// not-implemented fallback handler and surfaces per-request with a 501.
#[derive(Debug)]
pub enum ResolutionError {
    /// A required option is missing for a selected resolution mode.
    MissingOption {
        /// The mode that needs the option
        mode: ResolutionMode,
        /// The option name, in configuration-surface spelling
        option: &'static str,
    },
    /// No `resolution` list was given and none of the options imply a mode.
    NoModeDetermined,
    /// A manual-resolution key failed to compile as a regular expression.
    InvalidPattern {
        /// The offending mapping key
        key: String,
        /// Compile error from the regex engine
        source: regex::Error,
    },
    /// A named controller module could not be located or loaded.
    ControllerImport {
        /// The identifier handed to the module resolver
        identifier: String,
        /// Underlying loader failure
        cause: anyhow::Error,
    },
    /// A controller value never materialized into a handler map.
    ControllerShape {
        /// What went wrong during materialization
        detail: String,
    },
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::MissingOption { mode, option } => {
                write!(f, "the `{mode}` resolution mode needs a `{option}` option")
            }
            ResolutionError::NoModeDetermined => {
                write!(f, "cannot determine the default controller resolution mode")
            }
            ResolutionError::InvalidPattern { key, source } => {
                write!(f, "invalid resolution pattern `{key}`: {source}")
            }
            ResolutionError::ControllerImport { identifier, cause } => {
                write!(f, "error while importing controller \"{identifier}\": {cause}")
            }
            ResolutionError::ControllerShape { detail } => {
                write!(
                    f,
                    "the controller should be a handler map, a factory or a constructor: {detail}"
                )
            }
        }
    }
}

impl std::error::Error for ResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolutionError::InvalidPattern { source, .. } => Some(source),
            ResolutionError::ControllerImport { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}
