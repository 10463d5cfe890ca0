// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based scene graph.
//!
//! The [`SceneGraph`] owns every node in a slot map with stable,
//! generational keys. Nodes may have several parents: a shared instance
//! sub-graph hangs beneath every placement transform that uses it. An
//! upward index (child to parents) supports cycle checks and orphan
//! pruning.

use std::any::Any;

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::keys::{GraphId, NodeKey};
use crate::node::{Node, StateSet, UserData};

/// The arena that owns all scene nodes and their adjacency.
///
/// # Example
///
/// ```
/// use instancer_scene::{Node, SceneGraph};
///
/// let mut graph = SceneGraph::new();
/// let root = graph.add_node(Node::group());
/// let leaf = graph.add_node(Node::group());
/// graph.add_child(root, leaf).unwrap();
///
/// assert_eq!(graph.children(root), &[leaf]);
/// assert_eq!(graph.parents(leaf), &[root]);
/// ```
#[derive(Debug)]
pub struct SceneGraph {
    id: GraphId,
    pub(crate) nodes: SlotMap<NodeKey, Node>,
    pub(crate) parents: FxHashMap<NodeKey, SmallVec<[NodeKey; 2]>>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a new, empty graph with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: GraphId::next(),
            nodes: SlotMap::with_key(),
            parents: FxHashMap::default(),
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Adds a detached node. Children already set on `node` are ignored.
    pub fn add_node(&mut self, mut node: Node) -> NodeKey {
        node.children.clear();
        self.nodes.insert(node)
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    pub(crate) fn get(&self, key: NodeKey) -> Result<&Node> {
        self.nodes.get(key).ok_or(Error::NodeNotFound(key))
    }

    pub(crate) fn get_mut(&mut self, key: NodeKey) -> Result<&mut Node> {
        self.nodes.get_mut(key).ok_or(Error::NodeNotFound(key))
    }

    #[inline]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends `child` to `parent`'s children.
    ///
    /// A node may be attached under several parents, but never beneath
    /// itself.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.get(child)?;
        self.get(parent)?;
        if parent == child || self.is_ancestor(child, parent) {
            return Err(Error::Cycle { parent, child });
        }
        self.get_mut(parent)?.children.push(child);
        self.parents.entry(child).or_default().push(parent);
        Ok(())
    }

    /// Detaches the first occurrence of `child` from `parent`.
    ///
    /// Returns `false` if `child` was not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> bool {
        let Some(node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let Some(pos) = node.children.iter().position(|&c| c == child) else {
            return false;
        };
        node.children.remove(pos);

        if let Some(parents) = self.parents.get_mut(&child) {
            if let Some(pos) = parents.iter().position(|&p| p == parent) {
                parents.remove(pos);
            }
            if parents.is_empty() {
                self.parents.remove(&child);
            }
        }
        true
    }

    /// Detaches all children of `parent` and returns them in order.
    pub fn take_children(&mut self, parent: NodeKey) -> Result<Vec<NodeKey>> {
        let children: Vec<NodeKey> = self.get(parent)?.children.to_vec();
        for &child in children.iter().rev() {
            self.remove_child(parent, child);
        }
        Ok(children)
    }

    /// Children of a node, or an empty slice if it does not exist.
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map(|n| n.children()).unwrap_or(&[])
    }

    /// Parents of a node, or an empty slice for roots and unknown keys.
    pub fn parents(&self, key: NodeKey) -> &[NodeKey] {
        self.parents.get(&key).map(|p| p.as_slice()).unwrap_or(&[])
    }

    /// Whether `ancestor` is reachable upward from `key`.
    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut stack: Vec<NodeKey> = self.parents(key).to_vec();
        let mut seen = FxHashSet::default();
        while let Some(k) = stack.pop() {
            if k == ancestor {
                return true;
            }
            if seen.insert(k) {
                stack.extend_from_slice(self.parents(k));
            }
        }
        false
    }

    /// Removes a node, detaching it from its parents and children.
    pub fn remove_node(&mut self, key: NodeKey) -> Option<Node> {
        for parent in self.parents(key).to_vec() {
            self.remove_child(parent, key);
        }
        let node = self.nodes.remove(key)?;
        for &child in &node.children {
            if let Some(parents) = self.parents.get_mut(&child) {
                parents.retain(|p| *p != key);
                if parents.is_empty() {
                    self.parents.remove(&child);
                }
            }
        }
        Some(node)
    }

    /// Removes `roots` and everything beneath them that no remaining node
    /// still references. Roots that still have parents are kept.
    ///
    /// Returns the number of removed nodes.
    pub fn prune_orphans(&mut self, roots: &[NodeKey]) -> usize {
        let mut stack: Vec<NodeKey> = roots.to_vec();
        let mut removed = 0;
        while let Some(key) = stack.pop() {
            if !self.contains(key) || !self.parents(key).is_empty() {
                continue;
            }
            if let Some(node) = self.remove_node(key) {
                removed += 1;
                stack.extend(node.children.iter().copied());
            }
        }
        removed
    }

    pub fn name(&self, key: NodeKey) -> Option<&str> {
        self.nodes.get(key).and_then(|n| n.name.as_deref())
    }

    pub fn set_name(&mut self, key: NodeKey, name: &str) -> Result<()> {
        self.get_mut(key)?.name = Some(name.to_string());
        Ok(())
    }

    pub fn state(&self, key: NodeKey) -> Option<&StateSet> {
        self.nodes.get(key).map(|n| &n.state)
    }

    pub fn state_mut(&mut self, key: NodeKey) -> Result<&mut StateSet> {
        Ok(&mut self.get_mut(key)?.state)
    }

    /// Attaches an opaque payload, replacing any previous one.
    pub fn set_user_data(&mut self, key: NodeKey, data: UserData) -> Result<()> {
        self.get_mut(key)?.user_data = Some(data);
        Ok(())
    }

    /// Payload attached to a node, if it has one of type `T`.
    pub fn user_data<T: Any + Send + Sync>(&self, key: NodeKey) -> Option<&T> {
        self.nodes
            .get(key)?
            .user_data
            .as_deref()?
            .downcast_ref::<T>()
    }

    /// Iterates over all nodes in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter()
    }
}
