// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Post-processing and node construction services used by the
//! substitution engine.
//!
//! Renderers plug their own implementations in through these traits; the
//! defaults operate on the in-memory [`SceneGraph`] only.

use crate::error::Result;
use crate::flatten;
use crate::graph::SceneGraph;
use crate::instancing;
use crate::keys::NodeKey;
use crate::node::{Node, NodeKind};

/// Whole-graph rewrites applied after instances are placed.
pub trait ScenePostProcessor {
    /// Collapse per-instance transforms under `root` into instanced draws.
    fn convert_to_draw_instanced(&self, graph: &mut SceneGraph, root: NodeKey) -> Result<()>;

    /// Merge everything under `root` into as few drawables as possible.
    fn flatten_meshes(&self, graph: &mut SceneGraph, root: NodeKey) -> Result<()>;

    /// Enable or disable screen-space decluttering for `node`'s subtree.
    fn activate_declutter(
        &self,
        graph: &mut SceneGraph,
        node: NodeKey,
        enabled: bool,
    ) -> Result<()>;
}

/// Reference post-processor backed by [`instancing`] and [`flatten`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPostProcessor;

impl ScenePostProcessor for DefaultPostProcessor {
    fn convert_to_draw_instanced(&self, graph: &mut SceneGraph, root: NodeKey) -> Result<()> {
        instancing::convert_to_draw_instanced(graph, root)?;
        Ok(())
    }

    fn flatten_meshes(&self, graph: &mut SceneGraph, root: NodeKey) -> Result<()> {
        flatten::flatten_meshes(graph, root)?;
        Ok(())
    }

    fn activate_declutter(
        &self,
        graph: &mut SceneGraph,
        node: NodeKey,
        enabled: bool,
    ) -> Result<()> {
        graph.state_mut(node)?.declutter = enabled;
        Ok(())
    }
}

/// Builds occlusion-query nodes that skip drawing hidden subtrees.
pub trait OcclusionQueryFactory {
    fn create_query_node(&self, graph: &mut SceneGraph) -> NodeKey;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOcclusionQueryFactory;

impl OcclusionQueryFactory for DefaultOcclusionQueryFactory {
    fn create_query_node(&self, graph: &mut SceneGraph) -> NodeKey {
        graph.add_node(Node::new(NodeKind::OcclusionQuery))
    }
}
