// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clustering of placed instances into merged geometry.
//!
//! Billboards cannot be merged. They are split off first by deep-copying
//! the attach point and pruning every ordinary geode from the copy, since
//! a sub-graph's shape is only known once the loader has built it.

use instancer_scene::{NodeKey, NodeKind, SceneGraph, ScenePostProcessor};

use crate::error::Result;

/// Copy of `attach` holding only what cannot be flattened, or `None` if
/// there is nothing of the kind beneath it.
pub fn extract_unclusterables(graph: &mut SceneGraph, attach: NodeKey) -> Result<Option<NodeKey>> {
    let copy = graph.deep_clone(attach)?;

    let geodes = graph.find_all(copy, |n| matches!(n.kind, NodeKind::Geode(_)));
    for geode in geodes {
        for parent in graph.parents(geode).to_vec() {
            graph.remove_child(parent, geode);
        }
        graph.prune_orphans(&[geode]);
    }

    if graph.count(copy, |n| n.kind.is_billboard()) == 0 {
        graph.prune_orphans(&[copy]);
        return Ok(None);
    }
    graph.set_name(copy, "Unclusterables")?;
    Ok(Some(copy))
}

/// Flatten everything under `attach`, keeping unclusterable sub-graphs.
pub fn cluster(
    graph: &mut SceneGraph,
    attach: NodeKey,
    post: &dyn ScenePostProcessor,
) -> Result<()> {
    let unclusterables = extract_unclusterables(graph, attach)?;
    post.flatten_meshes(graph, attach)?;
    if let Some(kept) = unclusterables {
        graph.add_child(attach, kept)?;
    }
    Ok(())
}
