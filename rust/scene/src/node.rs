// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene nodes and render state.

use std::any::Any;
use std::sync::Arc;

use instancer_geometry::Mesh;
use nalgebra::Matrix4;
use smallvec::SmallVec;

use crate::keys::NodeKey;

/// Opaque payload attached to a node.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// What a node does to its subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Plain grouping.
    Group,
    /// Applies a matrix to its children.
    Transform(Matrix4<f64>),
    /// Faces the camera and/or keeps a constant screen size.
    AutoTransform {
        rotate_to_screen: bool,
        auto_scale_to_screen: bool,
    },
    /// Drawable leaf holding triangle meshes.
    Geode(Vec<Arc<Mesh>>),
    /// Camera-facing drawable leaf.
    Billboard(Vec<Arc<Mesh>>),
    /// Skips drawing its subtree while occluded.
    OcclusionQuery,
    /// Draws its children once per matrix.
    Instanced(Vec<Matrix4<f64>>),
}

impl NodeKind {
    #[inline]
    pub fn is_transform(&self) -> bool {
        matches!(self, NodeKind::Transform(_))
    }

    #[inline]
    pub fn is_auto_transform(&self) -> bool {
        matches!(self, NodeKind::AutoTransform { .. })
    }

    #[inline]
    pub fn is_billboard(&self) -> bool {
        matches!(self, NodeKind::Billboard(_))
    }

    /// Drawable leaf of either kind.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        matches!(self, NodeKind::Geode(_) | NodeKind::Billboard(_))
    }
}

/// Render state flags a node applies to its subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSet {
    /// Screen-space decluttering of the subtree.
    pub declutter: bool,
    /// Clip plane 0 (horizon clipping).
    pub clip_distance0: bool,
    /// Subtree is drawn with GPU instancing.
    pub draw_instanced: bool,
}

/// A scene graph node.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub kind: NodeKind,
    pub state: StateSet,
    pub(crate) children: SmallVec<[NodeKey; 4]>,
    pub(crate) user_data: Option<UserData>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            kind,
            state: StateSet::default(),
            children: SmallVec::new(),
            user_data: None,
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    pub fn transform(matrix: Matrix4<f64>) -> Self {
        Self::new(NodeKind::Transform(matrix))
    }

    pub fn geode(meshes: Vec<Arc<Mesh>>) -> Self {
        Self::new(NodeKind::Geode(meshes))
    }

    pub fn billboard(meshes: Vec<Arc<Mesh>>) -> Self {
        Self::new(NodeKind::Billboard(meshes))
    }

    /// Camera-facing, constant screen size wrapper.
    pub fn auto_transform() -> Self {
        Self::new(NodeKind::AutoTransform {
            rotate_to_screen: true,
            auto_scale_to_screen: true,
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Matrix this node applies, if it is a plain transform.
    pub fn matrix(&self) -> Option<&Matrix4<f64>> {
        match &self.kind {
            NodeKind::Transform(m) => Some(m),
            _ => None,
        }
    }

    pub fn has_user_data(&self) -> bool {
        self.user_data.is_some()
    }
}
