//! Construction of a fresh container state

use super::Registry;
use crate::watcher::DependencyWatcher;

/// Builds an empty [`Registry`] together with an empty [`DependencyWatcher`].
///
/// A container installs the pair when it is created and replaces it on every reload,
/// so nothing registered or observed before survives.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryBuilder;

impl RegistryBuilder {
    #[inline]
    pub fn build() -> (Registry, DependencyWatcher) {
        (Registry::new(), DependencyWatcher::new())
    }
}

#[cfg(test)]
mod tests {
    use super::RegistryBuilder;

    #[test]
    fn it_builds_empty_state() {
        let (registry, watcher) = RegistryBuilder::build();

        assert!(registry.root().is_empty());
        assert!(!registry.is_frozen());
        assert!(watcher.is_empty());
    }
}
