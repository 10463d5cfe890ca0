// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolution of instance URIs to resource descriptors.
//!
//! Lookup order:
//!
//! 1. the bounded LRU cache of descriptors built by earlier lookups,
//! 2. the pass's resource library (by the URI as written), whose results
//!    are not cached here,
//! 3. a fresh descriptor built from the symbol and tagged with the URI.
//!
//! URIs that fail are recorded in the pass's [`MissingSet`] and reported
//! once.

use std::cell::{Cell, RefCell};
use std::num::NonZeroUsize;
use std::sync::Arc;

use instancer_core::{InstanceResource, InstanceSymbol, ResourceLibrary, Uri};
use lru::LruCache;
use rustc_hash::FxHashSet;

/// URIs already reported as unresolvable during one pass.
#[derive(Debug, Clone, Default)]
pub struct MissingSet {
    uris: FxHashSet<Uri>,
}

impl MissingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, uri: &Uri) -> bool {
        self.uris.contains(uri)
    }

    /// Record a URI. Returns `true` the first time it is seen.
    pub fn insert(&mut self, uri: &Uri) -> bool {
        if self.uris.contains(uri) {
            return false;
        }
        self.uris.insert(uri.clone())
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}

/// Maps URIs to shared instance descriptors.
pub struct ResourceResolver {
    cache: RefCell<LruCache<Uri, Arc<InstanceResource>>>,
    insertions: Cell<usize>,
    warnings: Cell<usize>,
}

impl ResourceResolver {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RefCell::new(LruCache::new(capacity)),
            insertions: Cell::new(0),
            warnings: Cell::new(0),
        }
    }

    /// Resolve `uri` for `symbol`.
    ///
    /// Returns `None` for empty or unresolvable URIs and for URIs already in
    /// `missing`. A warning is logged the first time a URI goes missing.
    pub fn resolve(
        &self,
        uri: &Uri,
        symbol: &InstanceSymbol,
        library: Option<&ResourceLibrary>,
        missing: &mut MissingSet,
    ) -> Option<Arc<InstanceResource>> {
        if missing.contains(uri) {
            return None;
        }

        if uri.is_empty() {
            if missing.insert(uri) {
                tracing::warn!("instance URL evaluated to an empty string");
                self.warned();
            }
            return None;
        }

        let cached = self.cache.borrow_mut().get(uri).cloned();
        let found = if cached.is_some() {
            cached
        } else if let Some(library) = library {
            library.get_instance(uri.base())
        } else {
            let mut resource = symbol.create_resource();
            resource.set_uri(uri.clone());
            let resource = Arc::new(resource);
            self.cache.borrow_mut().put(uri.clone(), Arc::clone(&resource));
            self.insertions.set(self.insertions.get() + 1);
            Some(resource)
        };

        if found.is_none() && missing.insert(uri) {
            tracing::warn!(uri = %uri, "failed to locate instance resource");
            self.warned();
        }
        found
    }

    fn warned(&self) {
        self.warnings.set(self.warnings.get() + 1);
    }

    /// Number of descriptors currently cached.
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    /// Total descriptors ever built and cached by this resolver.
    pub fn insertions(&self) -> usize {
        self.insertions.get()
    }

    /// Total warnings logged by [`resolve`](Self::resolve).
    pub fn warnings(&self) -> usize {
        self.warnings.get()
    }

    pub fn capacity(&self) -> usize {
        self.cache.borrow().cap().get()
    }
}
