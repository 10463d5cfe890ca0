// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deep copies of sub-graphs, within a graph or across graphs.
//!
//! Node structure is copied, including shared children, which stay shared
//! in the copy. Mesh data is held in `Arc`s and is not duplicated.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::Result;
use crate::graph::SceneGraph;
use crate::keys::NodeKey;
use crate::node::Node;

impl SceneGraph {
    /// Copies the sub-graph rooted at `root` and returns the copy's root.
    /// The copy is detached.
    pub fn deep_clone(&mut self, root: NodeKey) -> Result<NodeKey> {
        let snapshot = self.snapshot(root)?;
        Ok(self.paste(root, snapshot))
    }

    /// Copies the sub-graph rooted at `root` in `source` into this graph and
    /// returns the copy's root. The copy is detached.
    pub fn import(&mut self, source: &SceneGraph, root: NodeKey) -> Result<NodeKey> {
        let snapshot = source.snapshot(root)?;
        Ok(self.paste(root, snapshot))
    }

    /// Pre-order copy of every node reachable from `root`, each once.
    fn snapshot(&self, root: NodeKey) -> Result<Vec<(NodeKey, Node)>> {
        self.get(root)?;
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            if !seen.insert(key) {
                continue;
            }
            let node = self.get(key)?;
            out.push((key, node.clone()));
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(out)
    }

    fn paste(&mut self, root: NodeKey, snapshot: Vec<(NodeKey, Node)>) -> NodeKey {
        let mut remap: FxHashMap<NodeKey, NodeKey> = FxHashMap::default();
        let mut links: Vec<(NodeKey, Vec<NodeKey>)> = Vec::with_capacity(snapshot.len());

        for (old, mut node) in snapshot {
            let children = std::mem::take(&mut node.children).into_vec();
            let new = self.nodes.insert(node);
            remap.insert(old, new);
            links.push((new, children));
        }

        for (parent, children) in links {
            for old_child in children {
                if let Some(&child) = remap.get(&old_child) {
                    if let Some(node) = self.nodes.get_mut(parent) {
                        node.children.push(child);
                    }
                    self.parents.entry(child).or_default().push(parent);
                }
            }
        }

        remap[&root]
    }
}
