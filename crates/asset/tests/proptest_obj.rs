//! Property-based tests for the OBJ loader
//!
//! Random meshes are rendered to OBJ text and loaded back:
//! - index count follows fan triangulation
//! - loading is deterministic
//! - equal corners share one vertex, and every index points at the right vertex

use std::fmt::Write as _;

use asset::load_obj_from_str;
use asset::mesh::{MeshData, Normal, Position, TexCoord, Vertex};
use proptest::prelude::*;

/// One face corner as 0-based slots.
type Corner = (usize, Option<usize>, Option<usize>);

#[derive(Clone, Debug)]
struct ObjInput {
    positions: Vec<(i8, i8, i8)>,
    tex_coords: Vec<(i8, i8)>,
    normals: Vec<(i8, i8, i8)>,
    faces: Vec<Vec<Corner>>,
}

impl ObjInput {
    fn to_obj(&self) -> String {
        let mut out = String::from("# generated\n");
        for (x, y, z) in &self.positions {
            writeln!(out, "v {x} {y} {z}").unwrap();
        }
        for (u, v) in &self.tex_coords {
            writeln!(out, "vt {u} {v}").unwrap();
        }
        for (x, y, z) in &self.normals {
            writeln!(out, "vn {x} {y} {z}").unwrap();
        }
        for face in &self.faces {
            out.push('f');
            for &(p, t, n) in face {
                let token = match (t, n) {
                    (None, None) => format!("{}", p + 1),
                    (Some(t), None) => format!("{}/{}", p + 1, t + 1),
                    (None, Some(n)) => format!("{}//{}", p + 1, n + 1),
                    (Some(t), Some(n)) => format!("{}/{}/{}", p + 1, t + 1, n + 1),
                };
                write!(out, " {token}").unwrap();
            }
            out.push('\n');
        }
        out
    }

    fn vertex(&self, (p, t, n): Corner) -> Vertex {
        let (x, y, z) = self.positions[p];
        let tex = t
            .map(|i| {
                let (u, v) = self.tex_coords[i];
                TexCoord::new(u.into(), v.into())
            })
            .unwrap_or_default();
        let normal = n
            .map(|i| {
                let (x, y, z) = self.normals[i];
                Normal::new(x.into(), y.into(), z.into())
            })
            .unwrap_or_default();
        Vertex::new(Position::new(x.into(), y.into(), z.into()), tex, normal)
    }

    /// Corners in the order the loader emits indices.
    fn corners(&self) -> Vec<Corner> {
        self.faces
            .iter()
            .flat_map(|face| (1..face.len() - 1).flat_map(move |i| [face[0], face[i], face[i + 1]]))
            .collect()
    }
}

fn arb_optional_slot(len: usize) -> BoxedStrategy<Option<usize>> {
    if len == 0 {
        Just(None).boxed()
    } else {
        prop::option::of(0..len).boxed()
    }
}

/// Small value ranges so that repeated corners are common.
fn arb_obj() -> impl Strategy<Value = ObjInput> {
    (
        prop::collection::vec((0i8..3, 0i8..3, 0i8..3), 1..8),
        prop::collection::vec((0i8..2, 0i8..2), 0..4),
        prop::collection::vec((-1i8..2, -1i8..2, -1i8..2), 0..4),
    )
        .prop_flat_map(|(positions, tex_coords, normals)| {
            let corner = (
                0..positions.len(),
                arb_optional_slot(tex_coords.len()),
                arb_optional_slot(normals.len()),
            );
            let faces = prop::collection::vec(prop::collection::vec(corner, 3..7), 0..10);
            (Just(positions), Just(tex_coords), Just(normals), faces)
        })
        .prop_map(|(positions, tex_coords, normals, faces)| ObjInput {
            positions,
            tex_coords,
            normals,
            faces,
        })
}

fn load(input: &ObjInput) -> MeshData {
    load_obj_from_str(&input.to_obj()).expect("generated OBJ is well-formed")
}

/// Property: every N-gon contributes N-2 triangles, 3 indices each
#[test]
fn proptest_index_count_follows_fan_triangulation() {
    proptest!(|(input in arb_obj())| {
        let mesh = load(&input);
        let expected_triangles: usize = input.faces.iter().map(|f| f.len() - 2).sum();
        prop_assert_eq!(mesh.triangle_count(), expected_triangles);
        prop_assert_eq!(mesh.index_count(), 3 * expected_triangles);
    });
}

/// Property: loading the same text twice yields identical buffers
#[test]
fn proptest_load_is_deterministic() {
    proptest!(|(input in arb_obj())| {
        let first = load(&input);
        let second = load(&input);
        prop_assert_eq!(first.vertex_bytes(), second.vertex_bytes());
        prop_assert_eq!(&first.indices, &second.indices);
    });
}

/// Property: indices resolve to the referenced vertex, and no vertex is stored twice
#[test]
fn proptest_deduplication() {
    proptest!(|(input in arb_obj())| {
        let mesh = load(&input);
        let corners = input.corners();
        prop_assert_eq!(corners.len(), mesh.indices.len());

        for (&corner, &index) in corners.iter().zip(&mesh.indices) {
            let index = index as usize;
            prop_assert!(index < mesh.vertices.len());
            prop_assert_eq!(mesh.vertices[index], input.vertex(corner));
        }

        for (i, a) in mesh.vertices.iter().enumerate() {
            for b in &mesh.vertices[i + 1..] {
                prop_assert_ne!(a, b);
            }
        }
    });
}
