// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resource locations with an optional referrer context.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A resource location.
///
/// `base` is the location as written in the style; `full` is the location
/// resolved against the referrer (for example the style sheet's path).
/// Two URIs are equal when their resolved locations are equal.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Uri {
    base: String,
    full: String,
}

impl Uri {
    /// Create a URI, resolving relative locations against `context`.
    pub fn new(location: &str, context: Option<&str>) -> Self {
        let base = location.trim().to_string();
        let full = match context {
            Some(referrer) if !base.is_empty() && Self::is_relative(&base) => {
                match referrer.rfind(&['/', '\\'][..]) {
                    Some(pos) => format!("{}/{}", &referrer[..pos], base),
                    None => base.clone(),
                }
            }
            _ => base.clone(),
        };
        Self { base, full }
    }

    /// Location as written.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Resolved location.
    pub fn full(&self) -> &str {
        &self.full
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }

    fn is_relative(location: &str) -> bool {
        !(location.starts_with('/')
            || location.starts_with('\\')
            || location.contains("://")
            || location.as_bytes().get(1) == Some(&b':'))
    }
}

impl PartialEq for Uri {
    fn eq(&self, other: &Self) -> bool {
        self.full == other.full
    }
}

impl Eq for Uri {}

impl Hash for Uri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full.hash(state);
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl From<&str> for Uri {
    fn from(location: &str) -> Self {
        Uri::new(location, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_location_uses_referrer_directory() {
        let uri = Uri::new("models/tree.osg", Some("/data/styles/forest.xml"));
        assert_eq!(uri.base(), "models/tree.osg");
        assert_eq!(uri.full(), "/data/styles/models/tree.osg");
    }

    #[test]
    fn absolute_locations_are_kept() {
        let referrer = Some("/data/styles/forest.xml");
        assert_eq!(Uri::new("/models/tree.osg", referrer).full(), "/models/tree.osg");
        assert_eq!(
            Uri::new("https://example.com/tree.glb", referrer).full(),
            "https://example.com/tree.glb"
        );
        assert_eq!(Uri::new("C:/models/tree.osg", referrer).full(), "C:/models/tree.osg");
    }

    #[test]
    fn equality_uses_resolved_location() {
        let a = Uri::new("tree.osg", Some("/data/a.xml"));
        let b = Uri::new("/data/tree.osg", None);
        let c = Uri::new("tree.osg", None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn empty_location_stays_empty() {
        assert!(Uri::new("  ", Some("/data/a.xml")).is_empty());
    }
}
