//! The tree of registered namespaces and dependencies

use crate::{config::DuplicatePolicy, error::Error, key::KeyGuard};
use std::sync::Arc;

pub use self::{
    builder::RegistryBuilder,
    entity::{DependencySlot, Entity, Instance, NamespaceNode},
    iter::{Dependencies, DependencyItem, Keys, NamespaceView},
    tree::TreeNode,
};

pub(crate) use self::entity::{Producer, producer};

pub mod builder;
pub mod entity;
pub mod iter;
pub mod tree;

/// Outcome of a single registration
#[derive(Debug, Default)]
pub(crate) struct Registered {
    /// Namespaces and dependencies added, in the order they have been created
    pub(crate) entities: Vec<(String, Entity)>,
    /// A dependency replaced under [`DuplicatePolicy::Override`]
    pub(crate) replaced: Option<Entity>,
}

/// Owns the namespace tree of one container
#[derive(Debug, Default)]
pub struct Registry {
    root: Arc<NamespaceNode>,
    frozen: bool,
}

impl Registry {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn root(&self) -> &NamespaceNode {
        &self.root
    }

    /// Returns a cheap copy of the current tree.
    ///
    /// Further registrations do not affect the snapshot.
    #[inline]
    pub fn snapshot(&self) -> Arc<NamespaceNode> {
        self.root.clone()
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    #[inline]
    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Inserts a dependency slot at `path`, creating missing namespaces on the way.
    ///
    /// Nothing is changed if the registration fails.
    pub(crate) fn register_dependency<F>(
        &mut self,
        path: &str,
        policy: DuplicatePolicy,
        make_slot: F
    ) -> Result<Registered, Error>
    where
        F: FnOnce(&str, String) -> DependencySlot
    {
        self.ensure_mutable(path)?;
        let segments = KeyGuard::split(path)?;
        let Some((&name, parents)) = segments.split_last() else {
            return Err(Error::InvalidKey { key: path.into(), reason: "path can not be empty" });
        };

        let parent = self.find_parent(parents)?;
        if let Some(parent) = parent {
            match parent.get(name) {
                Some(Entity::Namespace(_)) => return Err(Error::AlreadyRegistered(path.into())),
                Some(Entity::Dependency(_)) if policy == DuplicatePolicy::Reject => {
                    return Err(Error::AlreadyRegistered(path.into()));
                }
                _ => {}
            }
        }

        let mut created = 0;
        let parent = self.namespace_mut(parents, &mut created)?;
        let slot = make_slot(name, parent.child_path(name));
        let replaced = parent.children.insert(name.to_owned(), Entity::Dependency(Arc::new(slot)));

        Ok(Registered {
            entities: self.trailing_entities(&segments, created + 1),
            replaced,
        })
    }

    /// Creates the namespace at `path` together with missing parents.
    ///
    /// An existing namespace is reused, so only newly created namespaces are reported.
    pub(crate) fn register_namespace(&mut self, path: &str) -> Result<Registered, Error> {
        self.ensure_mutable(path)?;
        let segments = KeyGuard::split(path)?;

        let mut created = 0;
        self.namespace_mut(&segments, &mut created)?;

        Ok(Registered {
            entities: self.trailing_entities(&segments, created),
            replaced: None,
        })
    }

    #[inline]
    fn ensure_mutable(&self, path: &str) -> Result<(), Error> {
        if self.frozen {
            Err(Error::Frozen(path.into()))
        } else {
            Ok(())
        }
    }

    /// Walks existing namespaces along `parents`.
    ///
    /// Returns `None` if some of them are still to be created and fails if
    /// one of the segments is taken by a dependency.
    fn find_parent(&self, parents: &[&str]) -> Result<Option<&NamespaceNode>, Error> {
        let mut node = self.root();
        for (index, segment) in parents.iter().enumerate() {
            match node.get(segment) {
                Some(Entity::Namespace(ns)) => node = ns.as_ref(),
                Some(Entity::Dependency(_)) => {
                    return Err(Error::AlreadyRegistered(parents[..=index].join(".")));
                }
                None => return Ok(None),
            }
        }
        Ok(Some(node))
    }

    /// Walks namespaces along `segments` creating the missing ones,
    /// `created` is increased for every new namespace
    fn namespace_mut(
        &mut self,
        segments: &[&str],
        created: &mut usize
    ) -> Result<&mut NamespaceNode, Error> {
        let mut node = Arc::make_mut(&mut self.root);
        for segment in segments {
            let path = node.child_path(segment);
            let entity = node.children
                .entry((*segment).to_owned())
                .or_insert_with(|| {
                    *created += 1;
                    Entity::Namespace(Arc::new(NamespaceNode::new(segment, path.clone())))
                });
            node = match entity {
                Entity::Namespace(ns) => Arc::make_mut(ns),
                Entity::Dependency(_) => return Err(Error::AlreadyRegistered(path)),
            };
        }
        Ok(node)
    }

    /// The last `count` entities along `segments` with their paths.
    ///
    /// Entities created by a registration are always the tail of its path.
    fn trailing_entities(&self, segments: &[&str], count: usize) -> Vec<(String, Entity)> {
        let mut node = self.root();
        let mut entities = Vec::with_capacity(segments.len());
        for segment in segments {
            let Some(entity) = node.get(segment) else {
                break;
            };
            entities.push((node.child_path(segment), entity.clone()));
            if let Entity::Namespace(ns) = entity {
                node = ns.as_ref();
            }
        }
        entities.split_off(entities.len().saturating_sub(count))
    }
}
