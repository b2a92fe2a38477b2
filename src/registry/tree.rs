//! Ordered structural dump of the registry tree

use super::{DependencySlot, Entity, Instance, NamespaceNode};
use crate::{Container, error::Error, resolver::DependencyResolver};
use indexmap::IndexMap;
use std::sync::Arc;

/// A node of the mapping built by [`Container::hash_tree`]
#[derive(Debug, Clone)]
pub enum TreeNode {
    /// A resolved dependency
    Value(Instance),
    /// An unresolved dependency slot
    Slot(Arc<DependencySlot>),
    /// A nested namespace
    Namespace(IndexMap<String, TreeNode>),
}

impl TreeNode {
    #[inline]
    pub fn as_namespace(&self) -> Option<&IndexMap<String, TreeNode>> {
        match self {
            TreeNode::Namespace(map) => Some(map),
            _ => None,
        }
    }
}

pub(crate) fn build(
    container: &Container,
    node: &NamespaceNode,
    resolve_dependencies: bool
) -> Result<IndexMap<String, TreeNode>, Error> {
    let mut tree = IndexMap::with_capacity(node.len());
    for (name, entity) in &node.children {
        let value = match entity {
            Entity::Dependency(slot) if resolve_dependencies => {
                TreeNode::Value(DependencyResolver::resolve_slot(container, slot)?)
            }
            Entity::Dependency(slot) => TreeNode::Slot(slot.clone()),
            Entity::Namespace(ns) => TreeNode::Namespace(build(container, ns, resolve_dependencies)?),
        };
        tree.insert(name.clone(), value);
    }
    Ok(tree)
}
