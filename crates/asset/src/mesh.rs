//! CPU-side mesh representation used by loaders.

use std::fmt;
use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

/// Vertex position in object space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Texture coordinate. `t` is never read from input and stays 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
    pub t: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Normal {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl TexCoord {
    pub const fn new(u: f32, v: f32) -> Self {
        Self { u, v, t: 0.0 }
    }
}

impl Normal {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Packed vertex: position, texcoord, normal (9 x f32).
/// Equality is exact per-field float equality.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Position,
    pub tex_coord: TexCoord,
    pub normal: Normal,
}

/// One float attribute inside [`Vertex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader location.
    pub location: u32,
    /// Number of `f32` components.
    pub components: u32,
    /// Byte offset from the start of the vertex.
    pub offset: u64,
}

/// Interleaved buffer layout, independent of any graphics API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: &'static [VertexAttribute],
}

impl Vertex {
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: size_of::<Vertex>() as u64,
        attributes: &[
            VertexAttribute {
                location: 0,
                components: 3,
                offset: offset_of!(Vertex, position) as u64,
            },
            VertexAttribute {
                location: 1,
                components: 3,
                offset: offset_of!(Vertex, tex_coord) as u64,
            },
            VertexAttribute {
                location: 2,
                components: 3,
                offset: offset_of!(Vertex, normal) as u64,
            },
        ],
    };

    pub fn new(position: Position, tex_coord: TexCoord, normal: Normal) -> Self {
        Self {
            position,
            tex_coord,
            normal,
        }
    }

    /// Flat view of the nine floats in buffer order.
    pub fn as_array(&self) -> &[f32; 9] {
        bytemuck::cast_ref(self)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vert({} {} {})", self.x, self.y, self.z)
    }
}

impl fmt::Display for TexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TexCoord({} {} {})", self.u, self.v, self.t)
    }
}

impl fmt::Display for Normal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Normal({} {} {})", self.x, self.y, self.z)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vertex({}, {}, {})",
            self.position, self.tex_coord, self.normal
        )
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangles in file order, corners in winding order.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Vertex buffer contents, laid out as [`Vertex::LAYOUT`].
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer contents (`u32`, native endian).
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
