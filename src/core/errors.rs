/*!
# Error Types

Typed errors for the PSI engine.

Programmer errors (use before setup, bad arguments) fail fast with
`InvalidState`/`InvalidArgument`. Expected-absence conditions (an
unresolvable class name, a missing virtual file) are modeled as `None`
results by the calling APIs and never pass through this enum.
*/

use thiserror::Error;

/// Errors raised by the PSI engine.
#[derive(Debug, Error)]
pub enum PsiError {
    /// A component was used outside of its open window, or a tree node
    /// was asked for something it cannot provide in its current shape.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A caller-supplied value violates the contract of the operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Source text could not be turned into an element tree.
    #[error("parse error: {0}")]
    Parse(String),

    /// An I/O failure while reading source files or packed images.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The operation is not supported by the receiver, for example
    /// writing into the read-only runtime image.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl PsiError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, PsiError>;
