// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Downward traversal of the scene graph.

use std::sync::Arc;

use instancer_geometry::Mesh;
use nalgebra::Matrix4;
use rustc_hash::FxHashSet;

use crate::graph::SceneGraph;
use crate::keys::NodeKey;
use crate::node::{Node, NodeKind};

/// A mesh reached during traversal, with the matrix accumulated from the
/// traversal root down to its drawable.
#[derive(Debug, Clone)]
pub struct PlacedMesh {
    pub matrix: Matrix4<f64>,
    pub mesh: Arc<Mesh>,
    pub billboard: bool,
}

impl SceneGraph {
    /// Every node reachable from `root`, pre-order, each once.
    pub fn descendants(&self, root: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            if !self.contains(key) || !seen.insert(key) {
                continue;
            }
            out.push(key);
            stack.extend(self.children(key).iter().rev().copied());
        }
        out
    }

    /// Nodes reachable from `root` that match `pred`.
    pub fn find_all<F>(&self, root: NodeKey, pred: F) -> Vec<NodeKey>
    where
        F: Fn(&Node) -> bool,
    {
        self.descendants(root)
            .into_iter()
            .filter(|&k| self.node(k).map(&pred).unwrap_or(false))
            .collect()
    }

    /// Count of nodes beneath `root` matching `pred`.
    pub fn count<F>(&self, root: NodeKey, pred: F) -> usize
    where
        F: Fn(&Node) -> bool,
    {
        self.find_all(root, pred).len()
    }

    /// All meshes beneath `root` with their accumulated matrices.
    ///
    /// `root`'s own transform is not applied. Shared sub-graphs are visited
    /// once per path, and instanced nodes once per instance matrix.
    pub fn collect_meshes(&self, root: NodeKey) -> Vec<PlacedMesh> {
        let mut out = Vec::new();
        for &child in self.children(root) {
            self.collect_into(child, Matrix4::identity(), &mut out);
        }
        out
    }

    fn collect_into(&self, key: NodeKey, parent: Matrix4<f64>, out: &mut Vec<PlacedMesh>) {
        let Some(node) = self.node(key) else {
            return;
        };
        match &node.kind {
            NodeKind::Geode(meshes) | NodeKind::Billboard(meshes) => {
                let billboard = node.kind.is_billboard();
                out.extend(meshes.iter().map(|mesh| PlacedMesh {
                    matrix: parent,
                    mesh: mesh.clone(),
                    billboard,
                }));
            }
            NodeKind::Transform(m) => {
                let matrix = parent * m;
                for &child in node.children() {
                    self.collect_into(child, matrix, out);
                }
            }
            NodeKind::Instanced(matrices) => {
                for m in matrices {
                    let matrix = parent * m;
                    for &child in node.children() {
                        self.collect_into(child, matrix, out);
                    }
                }
            }
            NodeKind::Group | NodeKind::AutoTransform { .. } | NodeKind::OcclusionQuery => {
                for &child in node.children() {
                    self.collect_into(child, parent, out);
                }
            }
        }
    }
}
