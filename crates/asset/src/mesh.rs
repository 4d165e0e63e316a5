//! CPU-side mesh representation and the OBJ → single-index reconstruction.

use corelib::{IndexStream, MeshError, MeshResult};

use crate::obj::{IndexStreams, ObjData};

/// Vertex with position/normal. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    pub fn index_count(&self) -> u32 {
        // Bounded by `build_mesh`.
        self.indices.len() as u32
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }
}

/// Normal index used for corner `corner`: the corner's own normal index when
/// the normal stream has one, otherwise the corner's position index (normals
/// assumed co-indexed with positions).
#[inline]
pub fn resolve_normal_index(streams: &IndexStreams, corner: usize) -> u32 {
    streams
        .normal
        .get(corner)
        .copied()
        .unwrap_or(streams.position[corner])
}

/// Expand OBJ's per-attribute indices into one vertex per face corner.
///
/// Corners are not deduplicated: a position shared by several triangles is
/// emitted once per occurrence and the index buffer is the identity.
pub fn build_mesh(data: &ObjData) -> MeshResult<MeshData> {
    data.ensure_renderable()?;
    let streams = &data.indices;
    streams.validate()?;

    let corners = streams.corner_count();
    if u32::try_from(corners).is_err() {
        return Err(MeshError::TooManyVertices);
    }

    let mut vertices = Vec::with_capacity(corners);
    for (corner, &pi) in streams.position.iter().enumerate() {
        let position = lookup(&data.positions, pi, IndexStream::Position, corner)?;
        let ni = resolve_normal_index(streams, corner);
        let normal = lookup(&data.normals, ni, IndexStream::Normal, corner)?;
        vertices.push(MeshVertex::new(position, normal));
    }
    let indices: Vec<u32> = (0..corners as u32).collect();

    log::debug!(
        "Built mesh: {} vertices, {} triangles",
        vertices.len(),
        indices.len() / 3
    );
    Ok(MeshData::new(vertices, indices))
}

fn lookup(
    pool: &[[f32; 3]],
    index: u32,
    stream: IndexStream,
    corner: usize,
) -> MeshResult<[f32; 3]> {
    pool.get(index as usize)
        .copied()
        .ok_or(MeshError::IndexOutOfRange {
            stream,
            index: index as usize,
            len: pool.len(),
            corner,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::load_obj_from_str;

    #[test]
    fn mesh_data_validity() {
        let data = MeshData::new(vec![MeshVertex::default()], vec![0]);
        assert!(data.is_valid());
        assert!(!MeshData::default().is_valid());
    }

    #[test]
    fn single_triangle_builds_three_vertices() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n";
        let mesh = build_mesh(&load_obj_from_str(src).unwrap()).expect("build");
        assert_eq!(
            mesh.vertices,
            vec![
                MeshVertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
                MeshVertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
                MeshVertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ]
        );
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn empty_texcoords_build_the_same_mesh() {
        let full = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n";
        let no_tex = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let a = build_mesh(&load_obj_from_str(full).unwrap()).unwrap();
        let b = build_mesh(&load_obj_from_str(no_tex).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn shared_positions_are_duplicated_per_corner() {
        let src = r#"
            v 0 0 0
            v 1 0 0
            v 0 1 0
            v 1 1 0
            vn 0 0 1
            vn 0 0 -1
            f 1//1 2//1 3//1
            f 2//2 4//2 3//2
        "#;
        let data = load_obj_from_str(src).unwrap();
        let mesh = build_mesh(&data).unwrap();
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.indices, (0..6).collect::<Vec<u32>>());
        for (corner, v) in mesh.vertices.iter().enumerate() {
            let pi = data.indices.position[corner] as usize;
            let ni = data.indices.normal[corner] as usize;
            assert_eq!(v.position, data.positions[pi]);
            assert_eq!(v.normal, data.normals[ni]);
        }
    }

    #[test]
    fn omitted_normals_fall_back_to_position_index() {
        let src = r#"
            v 0 0 0
            v 1 0 0
            v 0 1 0
            vn 1 0 0
            vn 0 1 0
            vn 0 0 1
            f 3 1 2
        "#;
        let data = load_obj_from_str(src).unwrap();
        assert!(data.indices.normal.is_empty());
        let mesh = build_mesh(&data).unwrap();
        for (corner, v) in mesh.vertices.iter().enumerate() {
            let pi = data.indices.position[corner] as usize;
            assert_eq!(v.normal, data.normals[pi]);
        }
        assert_eq!(resolve_normal_index(&data.indices, 0), 2);
    }

    #[test]
    fn out_of_range_indices_fail_the_build() {
        let src = "v 0 0 0\nv 1 0 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let err = build_mesh(&load_obj_from_str(src).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            MeshError::IndexOutOfRange {
                stream: IndexStream::Position,
                index: 2,
                len: 2,
                corner: 2,
            }
        ));

        // Fallback normal index past the normal pool.
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1 2 3\n";
        let err = build_mesh(&load_obj_from_str(src).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            MeshError::IndexOutOfRange {
                stream: IndexStream::Normal,
                corner: 1,
                ..
            }
        ));
    }

    #[test]
    fn ragged_normal_stream_refuses_to_build() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2 3\n";
        let err = build_mesh(&load_obj_from_str(src).unwrap()).unwrap_err();
        assert!(matches!(err, MeshError::StructuralInconsistency(_)));
    }

    #[test]
    fn incomplete_face_refuses_to_build() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\nf 1//1 2//1\n";
        let err = build_mesh(&load_obj_from_str(src).unwrap()).unwrap_err();
        assert!(matches!(err, MeshError::StructuralInconsistency(_)));
    }

    #[test]
    fn empty_data_refuses_to_build() {
        assert!(matches!(
            build_mesh(&ObjData::default()),
            Err(MeshError::EmptyResult(_))
        ));
    }
}
