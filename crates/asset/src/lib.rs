//! Asset loading/parsers.
//! Minimal OBJ mesh loader producing indexed, deduplicated mesh data
//! ready for vertex/index buffer upload.

pub mod mesh;
pub mod obj;

pub use mesh::{MeshData, Normal, Position, TexCoord, Vertex};
pub use obj::{
    load_obj_data, load_obj_data_from_env, load_obj_from_path, load_obj_from_reader,
    load_obj_from_str,
};
