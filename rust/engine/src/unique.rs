// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Deduplication of instance sub-graphs.
//!
//! Every placement of the same key shares one sub-graph. Models are keyed
//! by URI alone because their scale lives in the placement matrix; icons
//! also key on scale.

use instancer_core::Uri;
use instancer_scene::{GraphId, NodeKey, SceneGraph};
use rustc_hash::FxHashMap;

/// Identity of a shared instance sub-graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueNodeKey {
    uri: Uri,
    // f32 bit pattern of the scale
    scale: u32,
}

impl UniqueNodeKey {
    pub fn model(uri: Uri) -> Self {
        Self::new(uri, 1.0)
    }

    pub fn icon(uri: Uri, scale: f32) -> Self {
        Self::new(uri, scale)
    }

    fn new(uri: Uri, scale: f32) -> Self {
        // -0.0 and 0.0 are the same scale
        let scale = if scale == 0.0 { 0.0f32 } else { scale };
        Self {
            uri,
            scale: scale.to_bits(),
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn scale(&self) -> f32 {
        f32::from_bits(self.scale)
    }
}

/// Shared sub-graphs by key, bound to one scene graph at a time.
///
/// Entries persist across passes into the same graph. Switching graphs
/// clears the cache, and entries whose nodes were removed from the graph
/// are rebuilt on demand.
#[derive(Debug, Default)]
pub struct UniqueNodeCache {
    graph: Option<GraphId>,
    nodes: FxHashMap<UniqueNodeKey, NodeKey>,
}

impl UniqueNodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached node for `key`, or the node built by `create`.
    ///
    /// Returns the node and whether it was inserted by this call, or `None`
    /// if `create` produced nothing. Failed creations are not cached.
    pub fn get_or_insert<F, E>(
        &mut self,
        graph: &mut SceneGraph,
        key: UniqueNodeKey,
        create: F,
    ) -> Result<Option<(NodeKey, bool)>, E>
    where
        F: FnOnce(&mut SceneGraph) -> Result<Option<NodeKey>, E>,
    {
        self.bind(graph.id());

        if let Some(&node) = self.nodes.get(&key) {
            if graph.contains(node) {
                return Ok(Some((node, false)));
            }
        }

        let Some(node) = create(graph)? else {
            return Ok(None);
        };
        self.nodes.insert(key, node);
        Ok(Some((node, true)))
    }

    pub fn get(&self, key: &UniqueNodeKey) -> Option<NodeKey> {
        self.nodes.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    fn bind(&mut self, graph: GraphId) {
        if self.graph != Some(graph) {
            if self.graph.is_some() {
                tracing::debug!(
                    entries = self.nodes.len(),
                    "scene graph changed, dropping shared instances"
                );
            }
            self.nodes.clear();
            self.graph = Some(graph);
        }
    }
}
