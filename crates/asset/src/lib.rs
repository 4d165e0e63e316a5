//! Asset loading/parsers (meshes).
//! OBJ ingestion into raw attribute pools + per-attribute index streams,
//! reconstruction into a single-index vertex buffer, and an OBJ printer
//! for inspecting what was loaded.

pub mod mesh;
pub mod obj;
pub mod print;

pub use mesh::{MeshData, MeshVertex, build_mesh, resolve_normal_index};
pub use obj::{
    FaceCorner, IndexStreams, ObjData, load_obj_from_path, load_obj_from_reader,
    load_obj_from_str,
};
pub use print::{print_obj, write_obj};
