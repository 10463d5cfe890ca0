// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch-mode selection and deferred placement records.

use instancer_core::Uri;
use nalgebra::Matrix4;

/// How a deferred consumer should batch the recorded placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchMode {
    Instanced,
    Clustered,
}

/// Instancing and clustering are exclusive. When both or neither are
/// requested, instancing wins.
pub fn select_batch_mode(use_draw_instanced: bool, cluster: bool) -> BatchMode {
    if cluster && !use_draw_instanced {
        BatchMode::Clustered
    } else {
        BatchMode::Instanced
    }
}

/// One recorded placement.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementInstruction {
    pub uri: Uri,
    /// World placement matrix; localization is left to the consumer.
    pub matrix: Matrix4<f64>,
}

/// Placements recorded in deferred mode, stored as user data on the
/// attach point.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionList {
    mode: BatchMode,
    records: Vec<PlacementInstruction>,
}

impl InstructionList {
    pub fn new(mode: BatchMode) -> Self {
        Self {
            mode,
            records: Vec::new(),
        }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn instanced(&self) -> bool {
        self.mode == BatchMode::Instanced
    }

    pub fn clustered(&self) -> bool {
        self.mode == BatchMode::Clustered
    }

    pub fn push(&mut self, uri: Uri, matrix: Matrix4<f64>) {
        self.records.push(PlacementInstruction { uri, matrix });
    }

    pub fn records(&self) -> &[PlacementInstruction] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
