//! Path resolution over the registry tree

use crate::{
    Container,
    error::Error,
    key::KeyGuard,
    registry::{DependencySlot, Entity, Instance, NamespaceNode},
};
use std::sync::Arc;

/// Walks the registry tree along dotted paths.
///
/// Holds no state: lookups operate on a tree root, resolutions on a container.
pub struct DependencyResolver;

impl DependencyResolver {
    /// Resolves the dependency registered at `path`.
    ///
    /// The factory runs while the container lock is held, but the tree itself
    /// is not borrowed, so the factory may use the container freely.
    pub fn resolve(container: &Container, path: &str) -> Result<Instance, Error> {
        container.execute_exclusively(|state| {
            let slot = Self::dependency(state.borrow().registry.root(), path)?.clone();
            slot.resolve(container)
        })
    }

    /// Resolves a slot that has already been found
    #[inline]
    pub(crate) fn resolve_slot(container: &Container, slot: &DependencySlot) -> Result<Instance, Error> {
        container.execute_exclusively(|_| slot.resolve(container))
    }

    /// Finds an entity of any kind
    pub fn find<'a>(root: &'a NamespaceNode, path: &str) -> Result<&'a Entity, Error> {
        let segments = KeyGuard::split(path)?;
        let Some((&name, parents)) = segments.split_last() else {
            return Err(Error::DependencyNotFound(path.into()));
        };

        let mut node = root;
        for (index, segment) in parents.iter().enumerate() {
            node = match node.get(segment) {
                Some(Entity::Namespace(ns)) => ns.as_ref(),
                Some(Entity::Dependency(_)) => {
                    return Err(Error::NamespaceExpected(parents[..=index].join(".")));
                }
                None => return Err(Error::NamespaceNotFound(parents[..=index].join("."))),
            };
        }

        node.get(name).ok_or_else(|| Error::DependencyNotFound(path.into()))
    }

    /// Finds the dependency slot at `path`
    pub fn dependency<'a>(root: &'a NamespaceNode, path: &str) -> Result<&'a Arc<DependencySlot>, Error> {
        match Self::find(root, path)? {
            Entity::Dependency(slot) => Ok(slot),
            Entity::Namespace(_) => Err(Error::DependencyExpected(path.into())),
        }
    }

    /// Finds the namespace at `path`
    pub fn namespace<'a>(root: &'a NamespaceNode, path: &str) -> Result<&'a Arc<NamespaceNode>, Error> {
        match Self::find(root, path) {
            Ok(Entity::Namespace(ns)) => Ok(ns),
            Ok(Entity::Dependency(_)) => Err(Error::NamespaceExpected(path.into())),
            Err(Error::DependencyNotFound(_)) => Err(Error::NamespaceNotFound(path.into())),
            Err(err) => Err(err),
        }
    }

    /// Checks whether anything is registered at `path`
    #[inline]
    pub fn contains_key(root: &NamespaceNode, path: &str) -> Result<bool, Error> {
        Self::exists(Self::find(root, path), |_| true)
    }

    /// Checks whether a namespace is registered at `path`
    #[inline]
    pub fn is_namespace(root: &NamespaceNode, path: &str) -> Result<bool, Error> {
        Self::exists(Self::find(root, path), Entity::is_namespace)
    }

    /// Checks whether a dependency is registered at `path`,
    /// optionally with a specific memoization mode
    pub fn is_dependency(root: &NamespaceNode, path: &str, memoized: Option<bool>) -> Result<bool, Error> {
        Self::exists(Self::find(root, path), |entity| {
            entity
                .as_dependency()
                .is_some_and(|slot| memoized.is_none_or(|memoized| slot.is_memoized() == memoized))
        })
    }

    /// Turns lookup failures into `false`, keeping validation errors
    #[inline]
    fn exists(lookup: Result<&Entity, Error>, matches: impl FnOnce(&Entity) -> bool) -> Result<bool, Error> {
        match lookup {
            Ok(entity) => Ok(matches(entity)),
            Err(err) if err.is_lookup_failure() => Ok(false),
            Err(err) => Err(err),
        }
    }
}
