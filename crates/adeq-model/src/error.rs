//! Errors of the expression mini-language.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    /// An identifier that is neither a model parameter nor a variable.
    #[error("No parameter or variable found for this identifier: {0}")]
    NoParameterOrVariableWithThisName(String),

    /// An identifier the evaluator cannot resolve to a value.
    #[error("no value bound to identifier: {0}")]
    UnknownIdentifier(String),

    /// A grammar construct the converter does not support yet. Names the
    /// construct so the caller can report what exactly is missing.
    #[error("construct `{0}` is not implemented")]
    UnimplementedConstruct(&'static str),

    /// Malformed expression text.
    #[error("parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },
}
