//! Entity creation failures.

use thiserror::Error;

/// Why an entity could not be created.
///
/// `Skip` and `UnsupportedValue` are intentional gaps (unions, variadics,
/// complex constants, gated availability) and are dropped quietly. The other
/// variants are surfaced with their full chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreationError {
    /// Intentionally unsupported construct.
    #[error("{0}")]
    Skip(String),

    /// Unexpected or malformed construct.
    #[error("{0}")]
    Invalid(String),

    /// Constant initializer of a kind that cannot be represented.
    #[error("unsupported value kind: {0}")]
    UnsupportedValue(String),

    /// A dependency of the entity failed.
    #[error("cannot build dependency {dependency}: {cause}")]
    Dependency {
        dependency: String,
        cause: Box<CreationError>,
    },
}

pub type CreationResult<T> = Result<T, CreationError>;

impl CreationError {
    pub fn skip(reason: impl Into<String>) -> Self {
        CreationError::Skip(reason.into())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        CreationError::Invalid(reason.into())
    }

    /// Wrap a failure of `dependency` as a failure of the requesting entity.
    pub fn dependency(dependency: impl Into<String>, cause: CreationError) -> Self {
        CreationError::Dependency {
            dependency: dependency.into(),
            cause: Box::new(cause),
        }
    }

    /// True when the root cause is intentional and should not be reported.
    pub fn is_skip(&self) -> bool {
        match self {
            CreationError::Skip(_) | CreationError::UnsupportedValue(_) => true,
            CreationError::Invalid(_) => false,
            CreationError::Dependency { cause, .. } => cause.is_skip(),
        }
    }

    /// Messages from the outermost failure down to the root cause.
    pub fn chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = self;
        loop {
            match current {
                CreationError::Dependency { dependency, cause } => {
                    chain.push(format!("cannot build dependency {dependency}"));
                    current = cause;
                }
                root => {
                    chain.push(root.to_string());
                    return chain;
                }
            }
        }
    }
}
