// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instance resource descriptors and named resource libraries.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::uri::Uri;

/// What kind of visual a resource produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceKind {
    /// Full 3D model.
    Model,
    /// Camera-facing image.
    Icon,
}

/// A loadable instance representation, identified by URI.
///
/// Descriptors are shared through `Arc`: the same descriptor is handed out
/// for every lookup of the same URI while it stays cached.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceResource {
    uri: Uri,
    kind: ResourceKind,
    name: Option<String>,
}

impl InstanceResource {
    pub fn new(kind: ResourceKind, uri: Uri) -> Self {
        Self {
            uri,
            kind,
            name: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn set_uri(&mut self, uri: Uri) {
        self.uri = uri;
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn is_icon(&self) -> bool {
        self.kind == ResourceKind::Icon
    }
}

/// Named collection of instance resources referenced from styles.
#[derive(Debug, Clone, Default)]
pub struct ResourceLibrary {
    name: String,
    instances: FxHashMap<String, Arc<InstanceResource>>,
}

impl ResourceLibrary {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            instances: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a resource under a lookup name.
    pub fn add_instance(&mut self, name: &str, resource: InstanceResource) {
        self.instances.insert(name.to_string(), Arc::new(resource));
    }

    /// Look up a resource by name.
    pub fn get_instance(&self, name: &str) -> Option<Arc<InstanceResource>> {
        self.instances.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_lookup_returns_shared_descriptor() {
        let mut library = ResourceLibrary::new("trees");
        library.add_instance(
            "oak.osg",
            InstanceResource::new(ResourceKind::Model, Uri::from("/lib/oak.osg")).with_name("oak"),
        );

        let a = library.get_instance("oak.osg").unwrap();
        let b = library.get_instance("oak.osg").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.uri().full(), "/lib/oak.osg");
        assert_eq!(a.name(), Some("oak"));
        assert!(library.get_instance("pine.osg").is_none());
    }
}
