// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node keys for arena-based storage.
//!
//! Keys are created by `slotmap::SlotMap` and stay valid, or detectably
//! stale, after other nodes are removed (generational indices).

use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::new_key_type;

new_key_type! {
    /// Key for a node in a [`SceneGraph`](crate::SceneGraph).
    pub struct NodeKey;
}

/// Process-unique identity of a scene graph.
///
/// Keys from one graph are meaningless in another; holders of cached keys
/// compare graph ids before trusting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u64);

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

impl GraphId {
    pub(crate) fn next() -> Self {
        Self(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}
