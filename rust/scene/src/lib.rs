// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Instancer Scene
//!
//! Arena-based scene graph that substituted instances are written into.
//!
//! Nodes live in a slot map with generational keys. A node may have
//! several parents, so one instance sub-graph can be shared by every
//! placement transform that uses it. The crate also ships reference
//! post-processors (draw-instanced conversion, mesh flattening, declutter
//! activation) and an occlusion-query node factory behind traits that a
//! renderer can replace.

pub mod clone;
pub mod error;
pub mod flatten;
pub mod graph;
pub mod instancing;
pub mod keys;
pub mod node;
pub mod postprocess;
pub mod traversal;

pub use error::{Error, Result};
pub use graph::SceneGraph;
pub use keys::{GraphId, NodeKey};
pub use node::{Node, NodeKind, StateSet, UserData};
pub use postprocess::{
    DefaultOcclusionQueryFactory, DefaultPostProcessor, OcclusionQueryFactory, ScenePostProcessor,
};
pub use traversal::PlacedMesh;
