use std::fmt::{self, Display};

/// Errors produced by model constructors and parsing routines.
#[derive(Debug)]
pub enum ModelError {
    InvalidId(String),
    InvalidOption(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidId(msg) => write!(f, "invalid id: {msg}"),
            ModelError::InvalidOption(msg) => {
                write!(f, "invalid option: {msg}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
