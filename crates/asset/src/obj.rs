//! Minimal OBJ parser: positions, normals and triangular faces.
//!
//! Faces keep OBJ's one-index-per-attribute layout as three parallel
//! index streams; [`crate::mesh::build_mesh`] resolves them into a
//! single-index vertex buffer.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use corelib::{MeshError, MeshResult, MissingData};

/// One corner of a face, with 0-based indices. The position is always
/// present; texcoord and normal are `None` when their sub-field of the
/// `p/t/n` token was empty or absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaceCorner {
    pub position: u32,
    pub texcoord: Option<u32>,
    pub normal: Option<u32>,
}

/// Per-corner index streams in face/corner traversal order.
///
/// Every corner adds a position entry; the texcoord and normal streams only
/// grow for corners that carry that field, so they may be shorter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStreams {
    pub position: Vec<u32>,
    pub texcoord: Vec<u32>,
    pub normal: Vec<u32>,
}

impl IndexStreams {
    pub fn push_corner(&mut self, corner: FaceCorner) {
        self.position.push(corner.position);
        if let Some(t) = corner.texcoord {
            self.texcoord.push(t);
        }
        if let Some(n) = corner.normal {
            self.normal.push(n);
        }
    }

    #[inline]
    pub fn corner_count(&self) -> usize {
        self.position.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.position.len() / 3
    }

    pub fn clear(&mut self) {
        self.position.clear();
        self.texcoord.clear();
        self.normal.clear();
    }

    /// Checks the stream shape before anything indexes through it.
    ///
    /// The position stream must describe whole triangles. The texcoord and
    /// normal streams must either be empty (field omitted on every corner)
    /// or line up one-to-one with the position stream; a ragged stream can
    /// no longer be matched to its corners.
    pub fn validate(&self) -> MeshResult<()> {
        let corners = self.position.len();
        if corners % 3 != 0 {
            return Err(MeshError::StructuralInconsistency(format!(
                "{corners} position indices do not form whole triangles"
            )));
        }
        for (name, len) in [("texcoord", self.texcoord.len()), ("normal", self.normal.len())] {
            if len != 0 && len != corners {
                return Err(MeshError::StructuralInconsistency(format!(
                    "{name} stream has {len} entries for {corners} corners"
                )));
            }
        }
        Ok(())
    }
}

/// Raw CPU-side OBJ contents.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: IndexStreams,
    /// Number of `vt` lines seen. Texcoord values are not kept, the count
    /// only anchors relative (negative) texcoord indices.
    pub texcoord_count: usize,
}

impl ObjData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.normals.is_empty() && self.indices.position.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.indices.clear();
        self.texcoord_count = 0;
    }

    /// Positions, normals and at least one face are required to render.
    /// Normals are mandatory because shading depends on them.
    pub fn ensure_renderable(&self) -> MeshResult<()> {
        if self.positions.is_empty() {
            return Err(MeshError::EmptyResult(MissingData::Positions));
        }
        if self.normals.is_empty() {
            return Err(MeshError::EmptyResult(MissingData::Normals));
        }
        if self.indices.position.is_empty() {
            return Err(MeshError::EmptyResult(MissingData::Faces));
        }
        Ok(())
    }

    /// Pre-size the pools from the input size. Roughly a third of an
    /// OBJ's lines are `v`, a third `vn` and a third `f`.
    fn reserve_for_bytes(&mut self, bytes: u64) {
        let lines = usize::try_from(bytes / 32).unwrap_or(0);
        self.positions.reserve(lines / 3);
        self.normals.reserve(lines / 3);
        self.indices.position.reserve(lines);
        self.indices.normal.reserve(lines);
    }
}

/// Load an OBJ mesh from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> MeshResult<ObjData> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| MeshError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let size_hint = file.metadata().map(|m| m.len()).unwrap_or(0);
    log::info!("Loading OBJ from {:?} ({} bytes)", path, size_hint);
    let data = parse_obj(BufReader::new(file), size_hint)?;
    data.ensure_renderable()?;
    Ok(data)
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> MeshResult<ObjData> {
    let data = parse_obj(reader, 0)?;
    data.ensure_renderable()?;
    Ok(data)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> MeshResult<ObjData> {
    let data = parse_obj(io::Cursor::new(contents), contents.len() as u64)?;
    data.ensure_renderable()?;
    Ok(data)
}

fn parse_obj<R: BufRead>(reader: R, size_hint: u64) -> MeshResult<ObjData> {
    let mut data = ObjData::new();
    data.reserve_for_bytes(size_hint);

    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.map_err(|source| MeshError::Read {
            line: line_no,
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                data.positions.push([x, y, z]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                data.normals.push([nx, ny, nz]);
            }
            "vt" => data.texcoord_count += 1,
            "f" => {
                let count = parts.clone().count();
                if count != 3 {
                    log::warn!(
                        "Face on line {} has {} corners; only triangles are supported",
                        line_no,
                        count
                    );
                }
                for token in parts.take(3) {
                    let corner = parse_face_corner(token, &data, line_no)?;
                    data.indices.push_corner(corner);
                }
            }
            other => {
                // Ignore other directives (o/g/s/usemtl/etc.)
                log::trace!("Skipping '{}' directive on line {}", other, line_no);
            }
        }
    }

    log::debug!(
        "Parsed OBJ: {} positions, {} normals, {} corners",
        data.positions.len(),
        data.normals.len(),
        data.indices.corner_count()
    );
    Ok(data)
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &'static str) -> MeshResult<f32> {
    let token = value.ok_or(MeshError::MissingField {
        line: line_no,
        what,
    })?;
    token.parse::<f32>().map_err(|_| MeshError::Parse {
        line: line_no,
        what,
        token: token.to_owned(),
    })
}

fn parse_face_corner(token: &str, data: &ObjData, line_no: usize) -> MeshResult<FaceCorner> {
    let mut split = token.split('/');
    let mut field = |count: usize, what: &'static str| -> MeshResult<Option<u32>> {
        match split.next() {
            Some(value) if !value.is_empty() => {
                resolve_index(value, count, line_no, what).map(Some)
            }
            _ => Ok(None),
        }
    };

    let position = field(data.positions.len(), "position index")?.ok_or(
        MeshError::MissingField {
            line: line_no,
            what: "position index",
        },
    )?;
    let texcoord = field(data.texcoord_count, "texcoord index")?;
    let normal = field(data.normals.len(), "normal index")?;
    Ok(FaceCorner {
        position,
        texcoord,
        normal,
    })
}

/// Convert a 1-based (or negative, relative-to-end) OBJ index to 0-based.
/// Upper bounds are checked when the mesh is built, since positive indices
/// may legally reference elements declared later in the file.
fn resolve_index(
    token: &str,
    count: usize,
    line_no: usize,
    what: &'static str,
) -> MeshResult<u32> {
    let invalid = || MeshError::Parse {
        line: line_no,
        what,
        token: token.to_owned(),
    };
    let raw = token.parse::<i64>().map_err(|_| invalid())?;
    let idx = match raw {
        0 => return Err(invalid()),
        r if r > 0 => r - 1,
        r => count as i64 + r,
    };
    if idx < 0 {
        return Err(invalid());
    }
    u32::try_from(idx).map_err(|_| invalid())
}
