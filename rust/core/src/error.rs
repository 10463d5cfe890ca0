// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the feature and style model.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the feature, style and spatial reference model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// No conversion exists between the two spatial references.
    #[error("cannot transform from '{from}' to '{to}'")]
    UnsupportedTransform { from: String, to: String },

    /// A coordinate could not be represented in the target reference.
    #[error("coordinate ({x}, {y}) is outside the domain of '{srs}'")]
    OutOfDomain { x: f64, y: f64, srs: String },

    /// A numeric expression failed to parse.
    #[error("invalid numeric expression '{0}'")]
    InvalidExpression(String),

    /// Division by zero inside a numeric expression.
    #[error("division by zero in expression '{0}'")]
    DivisionByZero(String),
}

impl Error {
    pub fn unsupported_transform(from: impl Into<String>, to: impl Into<String>) -> Self {
        Error::UnsupportedTransform {
            from: from.into(),
            to: to.into(),
        }
    }
}
