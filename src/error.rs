//! Describes container errors

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A path segment is empty, contains forbidden characters or is reserved
    InvalidKey { key: String, reason: &'static str },
    /// A mutation was attempted after the container has been frozen
    Frozen(String),
    /// The name is already taken within its namespace
    AlreadyRegistered(String),
    /// The final path segment does not exist
    DependencyNotFound(String),
    /// An intermediate path segment does not exist
    NamespaceNotFound(String),
    /// The path points to a namespace where a dependency was expected
    DependencyExpected(String),
    /// An intermediate path segment points to a dependency
    NamespaceExpected(String),
    /// The resolved instance has a different type than requested
    ResolveFailed { path: String, type_name: &'static str },
    /// A failure raised by a factory or an observer
    Other(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidKey { key, reason } => write!(f, "Container Error: invalid key \"{key}\": {reason}"),
            Error::Frozen(path) if path.is_empty() => write!(f, "Container Error: container is frozen"),
            Error::Frozen(path) => write!(f, "Container Error: can not register \"{path}\": container is frozen"),
            Error::AlreadyRegistered(path) => write!(f, "Container Error: \"{path}\" is already registered"),
            Error::DependencyNotFound(path) => write!(f, "Container Error: dependency not found: {path}"),
            Error::NamespaceNotFound(path) => write!(f, "Container Error: namespace not found: {path}"),
            Error::DependencyExpected(path) => write!(f, "Container Error: \"{path}\" is a namespace, not a dependency"),
            Error::NamespaceExpected(path) => write!(f, "Container Error: \"{path}\" is a dependency, not a namespace"),
            Error::ResolveFailed { path, type_name } => write!(f, "Container Error: unable to resolve \"{path}\" as {type_name}"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Creates a custom error, typically returned from a factory or an observer
    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Returns `true` if this error describes a path that could not be walked,
    /// as opposed to a malformed path or a failed factory.
    #[inline]
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Error::DependencyNotFound(_)
                | Error::NamespaceNotFound(_)
                | Error::DependencyExpected(_)
                | Error::NamespaceExpected(_)
        )
    }
}
