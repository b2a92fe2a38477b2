//! Lazy enumeration of the registry tree

use super::{Entity, Instance, NamespaceNode};
use crate::{Container, error::Error, resolver::DependencyResolver};
use std::sync::Arc;

/// A namespace that is being walked and the index of its next child
type Frame = (Arc<NamespaceNode>, usize);

/// An iterator over registered keys.
///
/// Walks a snapshot taken when the iterator was created,
/// registrations made afterwards are not visible.
#[derive(Debug, Clone)]
pub struct Keys {
    stack: Vec<Frame>,
    all_variants: bool,
}

impl Keys {
    #[inline]
    pub(crate) fn new(node: Arc<NamespaceNode>, all_variants: bool) -> Self {
        Self { stack: vec![(node, 0)], all_variants }
    }
}

impl Iterator for Keys {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, index) = self.stack.last_mut()?;
            let Some((name, entity)) = node.children.get_index(*index) else {
                self.stack.pop();
                continue;
            };
            *index += 1;

            if !self.all_variants {
                return Some(name.clone());
            }
            match entity {
                Entity::Dependency(slot) => return Some(slot.path().to_owned()),
                Entity::Namespace(ns) => {
                    let ns = ns.clone();
                    self.stack.push((ns, 0));
                }
            }
        }
    }
}

/// A value yielded by [`Dependencies`]
#[derive(Debug, Clone)]
pub enum DependencyItem {
    /// A resolved dependency
    Instance(Instance),
    /// A nested namespace, yielded only when the walk is not recursive
    Namespace(NamespaceView),
}

impl DependencyItem {
    /// Returns the resolved instance downcast to `T`
    #[inline]
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        match self {
            DependencyItem::Instance(instance) => instance.clone().downcast::<T>().ok(),
            DependencyItem::Namespace(_) => None,
        }
    }

    #[inline]
    pub fn as_namespace(&self) -> Option<&NamespaceView> {
        match self {
            DependencyItem::Namespace(view) => Some(view),
            DependencyItem::Instance(_) => None,
        }
    }
}

/// An iterator over `(name, item)` pairs that resolves dependencies lazily,
/// one per call to [`Iterator::next`].
#[derive(Debug, Clone)]
pub struct Dependencies {
    container: Container,
    stack: Vec<Frame>,
    yield_all: bool,
}

impl Dependencies {
    #[inline]
    pub(crate) fn new(container: Container, node: Arc<NamespaceNode>, yield_all: bool) -> Self {
        Self { container, stack: vec![(node, 0)], yield_all }
    }
}

impl Iterator for Dependencies {
    type Item = Result<(String, DependencyItem), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, index) = self.stack.last_mut()?;
            let Some((name, entity)) = node.children.get_index(*index) else {
                self.stack.pop();
                continue;
            };
            *index += 1;

            match entity {
                Entity::Dependency(slot) => {
                    let key = if self.yield_all { slot.path().to_owned() } else { name.clone() };
                    let item = DependencyResolver::resolve_slot(&self.container, slot)
                        .map(|instance| (key, DependencyItem::Instance(instance)));
                    return Some(item);
                }
                Entity::Namespace(ns) if self.yield_all => {
                    let ns = ns.clone();
                    self.stack.push((ns, 0));
                }
                Entity::Namespace(ns) => {
                    let view = NamespaceView::new(self.container.clone(), ns.clone());
                    return Some(Ok((name.clone(), DependencyItem::Namespace(view))));
                }
            }
        }
    }
}

/// A traversable handle of a namespace
#[derive(Debug, Clone)]
pub struct NamespaceView {
    container: Container,
    node: Arc<NamespaceNode>,
}

impl NamespaceView {
    #[inline]
    pub(crate) fn new(container: Container, node: Arc<NamespaceNode>) -> Self {
        Self { container, node }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.node.name()
    }

    #[inline]
    pub fn path(&self) -> &str {
        self.node.path()
    }

    #[inline]
    pub fn node(&self) -> &NamespaceNode {
        &self.node
    }

    /// Keys of this namespace, see [`Container::keys`]
    #[inline]
    pub fn keys(&self, all_variants: bool) -> Keys {
        Keys::new(self.node.clone(), all_variants)
    }

    /// Dependencies of this namespace, see [`Container::dependencies`]
    #[inline]
    pub fn dependencies(&self, yield_all: bool) -> Dependencies {
        Dependencies::new(self.container.clone(), self.node.clone(), yield_all)
    }
}
