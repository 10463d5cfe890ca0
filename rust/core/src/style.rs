// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Styles, symbols and style sheets.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::expression::{NumericExpression, StringExpression};
use crate::resource::{InstanceResource, ResourceKind, ResourceLibrary};
use crate::uri::Uri;

/// Model-only placement expressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOptions {
    /// Heading in degrees about the local up axis.
    pub heading: Option<NumericExpression>,
    pub scale_x: Option<NumericExpression>,
    pub scale_y: Option<NumericExpression>,
    pub scale_z: Option<NumericExpression>,
}

/// Icon-only options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IconOptions {
    /// Enable screen-space decluttering instead of auto-rotating billboards.
    pub declutter: bool,
}

/// Instance symbol variant.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceSymbolKind {
    Model(ModelOptions),
    Icon(IconOptions),
}

/// Style rule selecting an instance representation and its placement.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSymbol {
    pub url: Option<StringExpression>,
    /// Uniform scale.
    pub scale: Option<NumericExpression>,
    /// Script run against each feature before evaluation.
    pub script: Option<String>,
    /// Name of the resource library in the session's style sheet.
    pub library: Option<StringExpression>,
    pub kind: InstanceSymbolKind,
}

impl InstanceSymbol {
    pub fn model() -> Self {
        Self::with_kind(InstanceSymbolKind::Model(ModelOptions::default()))
    }

    pub fn icon() -> Self {
        Self::with_kind(InstanceSymbolKind::Icon(IconOptions::default()))
    }

    fn with_kind(kind: InstanceSymbolKind) -> Self {
        Self {
            url: None,
            scale: None,
            script: None,
            library: None,
            kind,
        }
    }

    pub fn with_url(mut self, expr: &str) -> Self {
        self.url = Some(StringExpression::new(expr));
        self
    }

    pub fn with_url_expr(mut self, expr: StringExpression) -> Self {
        self.url = Some(expr);
        self
    }

    pub fn with_scale(mut self, expr: &str) -> Self {
        self.scale = Some(NumericExpression::new(expr));
        self
    }

    pub fn with_script(mut self, script: &str) -> Self {
        self.script = Some(script.to_string());
        self
    }

    pub fn with_library(mut self, name: &str) -> Self {
        self.library = Some(StringExpression::new(name));
        self
    }

    /// Set the heading expression. Ignored for icons.
    pub fn with_heading(mut self, expr: &str) -> Self {
        match &mut self.kind {
            InstanceSymbolKind::Model(options) => {
                options.heading = Some(NumericExpression::new(expr));
            }
            InstanceSymbolKind::Icon(_) => {
                tracing::warn!("heading is not supported by icon symbols");
            }
        }
        self
    }

    /// Set per-axis scale expressions. Ignored for icons.
    pub fn with_axis_scale(mut self, x: Option<&str>, y: Option<&str>, z: Option<&str>) -> Self {
        match &mut self.kind {
            InstanceSymbolKind::Model(options) => {
                options.scale_x = x.map(NumericExpression::new);
                options.scale_y = y.map(NumericExpression::new);
                options.scale_z = z.map(NumericExpression::new);
            }
            InstanceSymbolKind::Icon(_) => {
                tracing::warn!("axis scale is not supported by icon symbols");
            }
        }
        self
    }

    /// Enable or disable decluttering. Ignored for models.
    pub fn with_declutter(mut self, declutter: bool) -> Self {
        match &mut self.kind {
            InstanceSymbolKind::Icon(options) => options.declutter = declutter,
            InstanceSymbolKind::Model(_) => {
                tracing::warn!("declutter is not supported by model symbols");
            }
        }
        self
    }

    #[inline]
    pub fn is_icon(&self) -> bool {
        matches!(self.kind, InstanceSymbolKind::Icon(_))
    }

    pub fn model_options(&self) -> Option<&ModelOptions> {
        match &self.kind {
            InstanceSymbolKind::Model(options) => Some(options),
            InstanceSymbolKind::Icon(_) => None,
        }
    }

    pub fn icon_options(&self) -> Option<&IconOptions> {
        match &self.kind {
            InstanceSymbolKind::Icon(options) => Some(options),
            InstanceSymbolKind::Model(_) => None,
        }
    }

    pub fn declutter(&self) -> bool {
        self.icon_options().map(|o| o.declutter).unwrap_or(false)
    }

    /// Build a fresh descriptor with this symbol's default construction rules.
    /// The caller tags it with the resolved URI.
    pub fn create_resource(&self) -> InstanceResource {
        let kind = match self.kind {
            InstanceSymbolKind::Model(_) => ResourceKind::Model,
            InstanceSymbolKind::Icon(_) => ResourceKind::Icon,
        };
        InstanceResource::new(kind, Uri::default())
    }
}

/// Stroke styling for line geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSymbol {
    pub color: [f32; 4],
    pub width: f32,
}

/// Fill styling for polygon geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonSymbol {
    pub fill: [f32; 4],
}

/// Any symbol a style can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Instance(InstanceSymbol),
    Line(LineSymbol),
    Polygon(PolygonSymbol),
}

/// A named set of symbols.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub name: String,
    symbols: Vec<Symbol>,
}

impl Style {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            symbols: Vec::new(),
        }
    }

    pub fn with_symbol(mut self, symbol: Symbol) -> Self {
        self.add(symbol);
        self
    }

    pub fn add(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// First instance symbol, if any.
    pub fn instance_symbol(&self) -> Option<&InstanceSymbol> {
        self.symbols.iter().find_map(|s| match s {
            Symbol::Instance(symbol) => Some(symbol),
            _ => None,
        })
    }
}

/// Styles and resource libraries shared by a session.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: FxHashMap<String, Style>,
    libraries: FxHashMap<String, Arc<ResourceLibrary>>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_style(&mut self, style: Style) {
        self.styles.insert(style.name.clone(), style);
    }

    pub fn style(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }

    pub fn add_resource_library(&mut self, library: ResourceLibrary) {
        self.libraries
            .insert(library.name().to_string(), Arc::new(library));
    }

    pub fn resource_library(&self, name: &str) -> Option<Arc<ResourceLibrary>> {
        self.libraries.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_finds_first_instance_symbol() {
        let style = Style::new("trees")
            .with_symbol(Symbol::Line(LineSymbol {
                color: [1.0; 4],
                width: 2.0,
            }))
            .with_symbol(Symbol::Instance(InstanceSymbol::model().with_url("tree.osg")))
            .with_symbol(Symbol::Instance(InstanceSymbol::icon().with_url("pin.png")));

        let symbol = style.instance_symbol().unwrap();
        assert!(!symbol.is_icon());
        assert_eq!(symbol.url.as_ref().unwrap().expr(), "tree.osg");
    }

    #[test]
    fn style_without_instance_symbol() {
        let style =
            Style::new("roads").with_symbol(Symbol::Polygon(PolygonSymbol { fill: [0.5; 4] }));
        assert!(!style.is_empty());
        assert!(style.instance_symbol().is_none());
        assert!(Style::new("empty").is_empty());
    }

    #[test]
    fn model_only_options_are_ignored_for_icons() {
        let icon = InstanceSymbol::icon().with_heading("45").with_declutter(true);
        assert!(icon.model_options().is_none());
        assert!(icon.declutter());

        let model = InstanceSymbol::model()
            .with_heading("[dir]")
            .with_axis_scale(Some("2"), None, Some("3"))
            .with_declutter(true);
        let options = model.model_options().unwrap();
        assert_eq!(options.heading.as_ref().unwrap().expr(), "[dir]");
        assert!(options.scale_y.is_none());
        assert!(!model.declutter());
    }

    #[test]
    fn created_resource_follows_symbol_kind() {
        assert_eq!(InstanceSymbol::model().create_resource().kind(), ResourceKind::Model);
        assert!(InstanceSymbol::icon().create_resource().is_icon());
    }

    #[test]
    fn style_sheet_libraries() {
        let mut sheet = StyleSheet::new();
        sheet.add_resource_library(ResourceLibrary::new("trees"));
        assert!(sheet.resource_library("trees").is_some());
        assert!(sheet.resource_library("rocks").is_none());
    }
}
