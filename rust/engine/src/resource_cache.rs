// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instance sub-graph construction.
//!
//! The [`ResourceCache`] loads each resource once into a private prototype
//! graph and hands out deep copies, so nothing placed in an output graph is
//! shared with the cache.

use std::cell::RefCell;
use std::sync::Arc;

use instancer_core::{InstanceResource, ResourceKind, Uri};
use instancer_geometry::Mesh;
use instancer_scene::{Node, NodeKey, SceneGraph};
use rustc_hash::FxHashMap;

/// Builds the scene representation of an instance descriptor.
pub trait InstanceNodeFactory {
    /// Add a fresh, detached sub-graph for `resource` to `graph`.
    ///
    /// Returns `None` if the resource cannot be loaded.
    fn clone_or_create_instance_node(
        &self,
        resource: &InstanceResource,
        graph: &mut SceneGraph,
    ) -> Option<NodeKey>;
}

/// Loads a resource into a graph. Model file formats live behind this.
pub trait InstanceLoader {
    fn load(&self, resource: &InstanceResource, graph: &mut SceneGraph) -> Option<NodeKey>;
}

/// Fallback used when a resolved resource cannot be built.
pub trait DefaultModelProvider {
    fn create_default_model(
        &self,
        resource: &InstanceResource,
        graph: &mut SceneGraph,
    ) -> Option<NodeKey>;
}

/// Wrap a drawable mesh in a node of the kind matching the resource.
fn mesh_node(
    kind: ResourceKind,
    mesh: Arc<Mesh>,
    name: &str,
    graph: &mut SceneGraph,
) -> Option<NodeKey> {
    let root = graph.add_node(Node::group().with_name(name));
    let leaf = match kind {
        ResourceKind::Model => graph.add_node(Node::geode(vec![mesh])),
        ResourceKind::Icon => graph.add_node(Node::billboard(vec![mesh])),
    };
    graph.add_child(root, leaf).ok()?;
    Some(root)
}

/// Loader serving in-memory meshes registered by location.
///
/// Lookups try the resolved location first, then the location as written.
#[derive(Debug, Clone, Default)]
pub struct MeshRegistry {
    meshes: FxHashMap<String, Arc<Mesh>>,
}

impl MeshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mut self, location: &str, mesh: Mesh) -> Self {
        self.insert(location, mesh);
        self
    }

    pub fn insert(&mut self, location: &str, mesh: Mesh) {
        self.meshes.insert(location.to_string(), Arc::new(mesh));
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl InstanceLoader for MeshRegistry {
    fn load(&self, resource: &InstanceResource, graph: &mut SceneGraph) -> Option<NodeKey> {
        let uri = resource.uri();
        let mesh = self
            .meshes
            .get(uri.full())
            .or_else(|| self.meshes.get(uri.base()))?;
        mesh_node(resource.kind(), Arc::clone(mesh), uri.full(), graph)
    }
}

/// Default model: a unit block for models, a unit card for icons.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderModel;

impl DefaultModelProvider for PlaceholderModel {
    fn create_default_model(
        &self,
        resource: &InstanceResource,
        graph: &mut SceneGraph,
    ) -> Option<NodeKey> {
        let mesh = match resource.kind() {
            ResourceKind::Model => Mesh::block(1.0, 1.0, 1.0),
            ResourceKind::Icon => Mesh::quad(1.0, 1.0),
        };
        mesh_node(resource.kind(), Arc::new(mesh), "placeholder", graph)
    }
}

/// Loads each resource once and hands out deep copies.
pub struct ResourceCache {
    loader: Box<dyn InstanceLoader>,
    // Prototype storage, never attached to an output graph
    prototypes: RefCell<SceneGraph>,
    // None records a failed load
    loaded: RefCell<FxHashMap<Uri, Option<NodeKey>>>,
}

impl ResourceCache {
    pub fn new(loader: impl InstanceLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            prototypes: RefCell::new(SceneGraph::new()),
            loaded: RefCell::new(FxHashMap::default()),
        }
    }

    /// Number of resources loaded, including failed loads.
    pub fn len(&self) -> usize {
        self.loaded.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.borrow().is_empty()
    }

    fn prototype(&self, resource: &InstanceResource) -> Option<NodeKey> {
        if let Some(cached) = self.loaded.borrow().get(resource.uri()) {
            return *cached;
        }

        let prototype = self.loader.load(resource, &mut self.prototypes.borrow_mut());
        if prototype.is_none() {
            tracing::debug!(uri = %resource.uri(), "instance loader produced nothing");
        }
        self.loaded
            .borrow_mut()
            .insert(resource.uri().clone(), prototype);
        prototype
    }
}

impl InstanceNodeFactory for ResourceCache {
    fn clone_or_create_instance_node(
        &self,
        resource: &InstanceResource,
        graph: &mut SceneGraph,
    ) -> Option<NodeKey> {
        let prototype = self.prototype(resource)?;
        match graph.import(&self.prototypes.borrow(), prototype) {
            Ok(node) => Some(node),
            Err(e) => {
                tracing::warn!(
                    uri = %resource.uri(),
                    error = %e,
                    "failed to copy instance prototype"
                );
                None
            }
        }
    }
}
