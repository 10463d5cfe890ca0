// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::Serialize;

/// Counters for one substitution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub features_processed: usize,
    pub features_skipped: usize,
    /// Transforms attached, or instructions recorded in deferred mode.
    pub instances_placed: usize,
    pub unique_nodes_created: usize,
    pub missing_uris: usize,
    pub warnings: usize,
}
