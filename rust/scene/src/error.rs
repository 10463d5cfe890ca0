// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for scene graph operations.

use crate::keys::NodeKey;

/// Result type alias for scene graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during scene graph operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced node was not found in the graph.
    #[error("scene node not found: {0:?}")]
    NodeNotFound(NodeKey),

    /// Attaching the child would make it its own ancestor.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeKey, child: NodeKey },
}
