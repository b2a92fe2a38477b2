//! Nodes of the registry tree

use crate::{Container, error::Error, key::join};
use indexmap::IndexMap;
use std::{
    any::Any,
    fmt::{Debug, Formatter},
    sync::{Arc, OnceLock}
};

/// A type-erased instance produced by a factory
pub type Instance = Arc<
    dyn Any
    + Send
    + Sync
>;

pub(crate) type Producer = Arc<
    dyn Fn(&Container) -> Result<Instance, Error>
    + Send
    + Sync
>;

#[inline]
pub(crate) fn producer<F>(f: F) -> Producer
where
    F: Fn(&Container) -> Result<Instance, Error> + Send + Sync + 'static
{
    Arc::new(f)
}

/// A named factory together with its memoization state
pub struct DependencySlot {
    name: String,
    path: String,
    memoize: bool,
    producer: Producer,
    cached: OnceLock<Instance>,
}

impl Debug for DependencySlot {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencySlot")
            .field("path", &self.path)
            .field("memoize", &self.memoize)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl DependencySlot {
    pub(crate) fn new(name: &str, path: String, memoize: bool, producer: Producer) -> Self {
        Self {
            name: name.to_owned(),
            path,
            memoize,
            producer,
            cached: OnceLock::new(),
        }
    }

    /// Creates an already resolved memoized slot
    pub(crate) fn with_instance(name: &str, path: String, instance: Instance) -> Self {
        let value = instance.clone();
        Self {
            name: name.to_owned(),
            path,
            memoize: true,
            producer: producer(move |_| Ok(value.clone())),
            cached: OnceLock::from(instance),
        }
    }

    /// Name of the dependency within its namespace
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified path of the dependency
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn is_memoized(&self) -> bool {
        self.memoize
    }

    /// Returns `true` if a memoized value has already been computed
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.cached().is_some()
    }

    /// The memoized value, if it has already been computed.
    ///
    /// Never runs the producer.
    #[inline]
    pub fn cached(&self) -> Option<&Instance> {
        self.cached.get()
    }

    /// Produces the instance.
    ///
    /// Must only be called while the container lock is held, which is what
    /// makes the producer of a memoized slot run at most once.
    pub(crate) fn resolve(&self, container: &Container) -> Result<Instance, Error> {
        if !self.memoize {
            return (self.producer)(container);
        }
        if let Some(instance) = self.cached() {
            return Ok(instance.clone());
        }

        let instance = (self.producer)(container)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(path = %self.path, "memoized dependency resolved");

        // a reentrant resolution of the same slot may have filled the cell first
        Ok(self.cached.get_or_init(|| instance).clone())
    }
}

/// A named group of dependencies and nested namespaces
#[derive(Debug, Clone, Default)]
pub struct NamespaceNode {
    name: String,
    path: String,
    pub(crate) children: IndexMap<String, Entity>,
}

impl NamespaceNode {
    pub(crate) fn new(name: &str, path: String) -> Self {
        Self {
            name: name.to_owned(),
            path,
            children: IndexMap::new(),
        }
    }

    /// Name of the namespace, empty for the root
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified path of the namespace, empty for the root
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of immediate children
    #[inline]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.children.get(name)
    }

    /// Fully-qualified path of a child
    #[inline]
    pub(crate) fn child_path(&self, name: &str) -> String {
        join(&self.path, name)
    }
}

/// A child of a [`NamespaceNode`], also handed to observers as the registered definition
#[derive(Debug, Clone)]
pub enum Entity {
    Dependency(Arc<DependencySlot>),
    Namespace(Arc<NamespaceNode>),
}

impl Entity {
    #[inline]
    pub fn is_namespace(&self) -> bool {
        matches!(self, Entity::Namespace(_))
    }

    #[inline]
    pub fn as_dependency(&self) -> Option<&Arc<DependencySlot>> {
        match self {
            Entity::Dependency(slot) => Some(slot),
            Entity::Namespace(_) => None,
        }
    }
}
