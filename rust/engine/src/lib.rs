// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Instancer Engine
//!
//! Places instanced model representations at the vertices of vector
//! features, driven by a style's instance symbol.
//!
//! For each feature the engine evaluates the symbol's URL, scale and
//! heading expressions, resolves the URL to a shared resource descriptor,
//! builds (once per distinct resource) an instance sub-graph, and attaches
//! it under one placement transform per vertex. Placements follow the map:
//! flat maps translate in the map projection, geocentric maps also rotate
//! each instance onto the ellipsoid normal at its vertex.
//!
//! Output is either built directly into a [`SceneGraph`] or, in deferred
//! mode, recorded as an [`InstructionList`] for a later consumer.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use instancer_core::{Feature, Geometry, InstanceSymbol, SpatialReference, Style, Symbol};
//! use instancer_engine::{
//!     EngineConfig, FilterContext, MeshRegistry, ResourceCache, Session, SubstituteEngine,
//! };
//! use instancer_geometry::Mesh;
//! use instancer_scene::SceneGraph;
//!
//! let srs = SpatialReference::projected("local");
//! let registry = MeshRegistry::new().with_mesh("tree.osg", Mesh::block(1.0, 1.0, 4.0));
//! let cache = ResourceCache::new(registry);
//! let session = Arc::new(Session::new(srs.clone(), false, Arc::new(cache)));
//! let mut context = FilterContext::new(session, srs);
//!
//! let style = Style::new("trees").with_symbol(Symbol::Instance(
//!     InstanceSymbol::model().with_url("tree.osg").with_scale("1.5"),
//! ));
//! let mut engine = SubstituteEngine::new(style, EngineConfig::default());
//!
//! let features = vec![Feature::new(1, Geometry::point(10.0, 20.0, 0.0))];
//! let mut graph = SceneGraph::new();
//! let root = engine.push(&features, &mut context, &mut graph).unwrap();
//!
//! assert!(graph.contains(root));
//! assert_eq!(engine.last_pass_stats().instances_placed, 1);
//! ```

pub mod cluster;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod resolver;
pub mod resource_cache;
pub mod stats;
pub mod unique;

pub use config::{EngineConfig, FilterUsage};
pub use context::{Capabilities, FeatureIndex, FilterContext, Session};
pub use dispatch::{select_batch_mode, BatchMode, InstructionList, PlacementInstruction};
pub use error::{Error, Result};
pub use filter::SubstituteEngine;
pub use resolver::{MissingSet, ResourceResolver};
pub use resource_cache::{
    DefaultModelProvider, InstanceLoader, InstanceNodeFactory, MeshRegistry, PlaceholderModel,
    ResourceCache,
};
pub use stats::PassStats;
pub use unique::{UniqueNodeCache, UniqueNodeKey};
