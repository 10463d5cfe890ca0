// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session and per-call filter context.

use std::sync::Arc;

use instancer_core::{FeatureId, GeoExtent, SpatialReference, StyleSheet};
use instancer_scene::NodeKey;
use rustc_hash::FxHashMap;

use crate::resource_cache::InstanceNodeFactory;

/// What the rendering backend can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Instance substitution is available at all.
    pub substitution: bool,
    /// GPU draw-instancing is available.
    pub draw_instanced: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            substitution: true,
            draw_instanced: true,
        }
    }
}

/// Long-lived state shared by every pass against one map.
pub struct Session {
    map_srs: SpatialReference,
    geocentric: bool,
    styles: Option<Arc<StyleSheet>>,
    resource_cache: Arc<dyn InstanceNodeFactory>,
    capabilities: Capabilities,
}

impl Session {
    /// * `map_srs` - map spatial reference; geographic for geocentric maps
    /// * `geocentric` - whether the map renders in ECEF
    /// * `resource_cache` - builds instance sub-graphs from descriptors
    pub fn new(
        map_srs: SpatialReference,
        geocentric: bool,
        resource_cache: Arc<dyn InstanceNodeFactory>,
    ) -> Self {
        Self {
            map_srs,
            geocentric,
            styles: None,
            resource_cache,
            capabilities: Capabilities::default(),
        }
    }

    pub fn with_styles(mut self, styles: StyleSheet) -> Self {
        self.styles = Some(Arc::new(styles));
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn map_srs(&self) -> &SpatialReference {
        &self.map_srs
    }

    pub fn is_geocentric(&self) -> bool {
        self.geocentric
    }

    pub fn styles(&self) -> Option<&StyleSheet> {
        self.styles.as_deref()
    }

    pub fn resource_cache(&self) -> &dyn InstanceNodeFactory {
        self.resource_cache.as_ref()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

/// Maps placement nodes back to the features that produced them, for
/// picking.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    tags: FxHashMap<NodeKey, FeatureId>,
}

impl FeatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag_node(&mut self, node: NodeKey, feature: FeatureId) {
        self.tags.insert(node, feature);
    }

    pub fn feature_for(&self, node: NodeKey) -> Option<FeatureId> {
        self.tags.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Per-call context: the session plus the tile being built.
pub struct FilterContext {
    session: Arc<Session>,
    profile_srs: SpatialReference,
    extent: Option<GeoExtent>,
    feature_index: Option<FeatureIndex>,
}

impl FilterContext {
    /// `profile_srs` is the spatial reference of the incoming feature
    /// coordinates.
    pub fn new(session: Arc<Session>, profile_srs: SpatialReference) -> Self {
        Self {
            session,
            profile_srs,
            extent: None,
            feature_index: None,
        }
    }

    pub fn with_extent(mut self, extent: GeoExtent) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn with_feature_index(mut self) -> Self {
        self.feature_index = Some(FeatureIndex::new());
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn profile_srs(&self) -> &SpatialReference {
        &self.profile_srs
    }

    pub fn extent(&self) -> Option<&GeoExtent> {
        self.extent.as_ref()
    }

    pub fn feature_index(&self) -> Option<&FeatureIndex> {
        self.feature_index.as_ref()
    }

    pub fn feature_index_mut(&mut self) -> Option<&mut FeatureIndex> {
        self.feature_index.as_mut()
    }
}
