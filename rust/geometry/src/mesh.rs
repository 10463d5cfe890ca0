// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Matrix4, Point3, Vector3};

/// Triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Axis-aligned quad in the XZ plane facing -Y, centered on the
    /// origin. Used as the default icon card.
    pub fn quad(width: f64, height: f64) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let normal = -Vector3::y();
        let mut mesh = Self::with_capacity(4, 6);
        mesh.add_vertex(Point3::new(-hw, 0.0, -hh), normal);
        mesh.add_vertex(Point3::new(hw, 0.0, -hh), normal);
        mesh.add_vertex(Point3::new(hw, 0.0, hh), normal);
        mesh.add_vertex(Point3::new(-hw, 0.0, hh), normal);
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        mesh
    }

    /// Axis-aligned box resting on the XY plane.
    pub fn block(sx: f64, sy: f64, sz: f64) -> Self {
        let (hx, hy) = (sx * 0.5, sy * 0.5);
        let corners = [
            Point3::new(-hx, -hy, 0.0),
            Point3::new(hx, -hy, 0.0),
            Point3::new(hx, hy, 0.0),
            Point3::new(-hx, hy, 0.0),
            Point3::new(-hx, -hy, sz),
            Point3::new(hx, -hy, sz),
            Point3::new(hx, hy, sz),
            Point3::new(-hx, hy, sz),
        ];
        // Counter-clockwise seen from outside.
        let faces: [(Vector3<f64>, [usize; 4]); 6] = [
            (Vector3::z(), [4, 5, 6, 7]),
            (-Vector3::z(), [3, 2, 1, 0]),
            (Vector3::x(), [1, 2, 6, 5]),
            (-Vector3::x(), [3, 0, 4, 7]),
            (Vector3::y(), [2, 3, 7, 6]),
            (-Vector3::y(), [0, 1, 5, 4]),
        ];

        let mut mesh = Self::with_capacity(24, 36);
        for (normal, quad) in faces.iter() {
            let base = mesh.vertex_count() as u32;
            for &corner in quad {
                mesh.add_vertex(corners[corner], *normal);
            }
            mesh.add_triangle(base, base + 1, base + 2);
            mesh.add_triangle(base, base + 2, base + 3);
        }
        mesh
    }

    /// Add a vertex with normal
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        self.normals.push(normal.x as f32);
        self.normals.push(normal.y as f32);
        self.normals.push(normal.z as f32);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Merge another mesh into this one
    #[inline]
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = (self.positions.len() / 3) as u32;

        self.positions.reserve(other.positions.len());
        self.normals.reserve(other.normals.len());
        self.indices.reserve(other.indices.len());

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Bake a 4x4 transform into the vertices.
    ///
    /// Positions are transformed in f64 before narrowing. Normals use the
    /// inverse-transpose of the linear part so non-uniform scale keeps them
    /// perpendicular to their faces.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for chunk in self.positions.chunks_exact_mut(3) {
            let p = matrix.transform_point(&Point3::new(
                chunk[0] as f64,
                chunk[1] as f64,
                chunk[2] as f64,
            ));
            chunk[0] = p.x as f32;
            chunk[1] = p.y as f32;
            chunk[2] = p.z as f32;
        }

        let linear = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = match linear.try_inverse() {
            Some(inv) => inv.transpose(),
            None => return,
        };
        for chunk in self.normals.chunks_exact_mut(3) {
            let n = normal_matrix * Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let n = n.try_normalize(1e-12).unwrap_or(n);
            chunk[0] = n.x as f32;
            chunk[1] = n.y as f32;
            chunk[2] = n.z as f32;
        }
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Calculate bounds (min, max)
    #[inline]
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        if self.is_empty() {
            return (Point3::origin(), Point3::origin());
        }

        let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            let (x, y, z) = (chunk[0], chunk[1], chunk[2]);
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        });

        (min, max)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
