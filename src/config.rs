//! Container configuration

/// Describes what happens when a dependency is registered under a name that is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fails with [`Error::AlreadyRegistered`](crate::error::Error::AlreadyRegistered)
    #[default]
    Reject,
    /// Replaces the existing dependency, keeping its position.
    ///
    /// A dependency still can not replace a namespace or vice versa.
    Override,
}

/// Represents a container configuration
#[derive(Debug, Clone, Copy)]
pub struct ContainerConfig {
    /// Specifies whether [`Container::register`](crate::Container::register)
    /// memoizes the produced value
    ///
    /// Default: `true`
    memoize: bool,

    /// Specifies how name collisions are handled
    ///
    /// Default: [`DuplicatePolicy::Reject`]
    duplicates: DuplicatePolicy,
}

impl Default for ContainerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            memoize: true,
            duplicates: DuplicatePolicy::Reject,
        }
    }
}

impl ContainerConfig {
    /// Creates a default container configuration
    ///
    /// Defaults:
    /// - memoize: `true`
    /// - duplicates: [`DuplicatePolicy::Reject`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures whether dependencies registered without
    /// an explicit memoization mode are memoized
    ///
    /// Default: `true`
    pub fn with_memoization(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Configures how name collisions are handled
    ///
    /// Default: [`DuplicatePolicy::Reject`]
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    #[inline]
    pub fn memoize(&self) -> bool {
        self.memoize
    }

    #[inline]
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }
}
