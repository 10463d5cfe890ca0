// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for substitution passes
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a substitution pass
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    #[error("Style '{0}' has no symbols")]
    EmptyStyle(String),

    #[error("Style '{0}' has no instance symbol")]
    NoInstanceSymbol(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] instancer_core::Error),

    #[error("Placement error: {0}")]
    Placement(#[from] instancer_geometry::Error),

    #[error("Scene error: {0}")]
    Scene(#[from] instancer_scene::Error),
}
