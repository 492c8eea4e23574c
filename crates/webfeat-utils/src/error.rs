use std::{error::Error, fmt};

#[derive(Debug)]
pub enum PathError {
    CurrentDir { source: std::io::Error },

    Empty,

    MissingEnvVar { var: String, input: String },

    UnclosedVariable { input: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => write!(f, "Path is empty"),
            PathError::CurrentDir { source } => {
                write!(f, "Failed to get current directory: {source}")
            }
            PathError::UnclosedVariable { input } => {
                write!(f, "Unclosed variable expression starting at `{input}`")
            }
            PathError::MissingEnvVar { var, input } => {
                write!(f, "Environment variable `{var}` not set in `{input}`")
            }
        }
    }
}

impl Error for PathError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PathError::CurrentDir { source } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum DurationError {
    Empty,

    MissingNumber { input: String },

    UnknownUnit { unit: String, input: String },

    Overflow { input: String },
}

impl fmt::Display for DurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationError::Empty => write!(f, "Duration is empty"),
            DurationError::MissingNumber { input } => {
                write!(f, "Expected a number before the unit in `{input}`")
            }
            DurationError::UnknownUnit { unit, input } => {
                write!(f, "Unknown duration unit `{unit}` in `{input}`")
            }
            DurationError::Overflow { input } => write!(f, "Duration `{input}` is too large"),
        }
    }
}

impl Error for DurationError {}

pub type PathResult<T> = std::result::Result<T, PathError>;
pub type DurationResult<T> = std::result::Result<T, DurationError>;
