// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for placement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while computing placements
#[derive(Error, Debug)]
pub enum Error {
    #[error("Spatial reference error: {0}")]
    Srs(#[from] instancer_core::Error),

    #[error("Degenerate transform: {0}")]
    DegenerateTransform(String),
}
