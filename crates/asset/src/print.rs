//! Dump raw OBJ data back to OBJ text for inspection.

use std::io::{self, Write};

use corelib::{MeshError, MeshResult};

use crate::obj::ObjData;

/// Print the held raw data to stdout.
pub fn print_obj(data: &ObjData) -> MeshResult<()> {
    let stdout = io::stdout();
    write_obj(data, stdout.lock())
}

/// Write `data` as OBJ text with 1-based indices.
///
/// The streams are validated before anything is written, so an
/// inconsistent mesh produces an error and no output.
///
/// Texcoord values are never stored, so no `vt` lines are written: faces keep
/// their texcoord indices and the count only appears in the header comment.
/// Re-parsing the output therefore yields `texcoord_count == 0`.
pub fn write_obj<W: Write>(data: &ObjData, mut out: W) -> MeshResult<()> {
    let streams = &data.indices;
    streams.validate()?;

    let has_tex = !streams.texcoord.is_empty();
    let has_norm = !streams.normal.is_empty();

    let mut emit = || -> io::Result<()> {
        writeln!(out, "# vertices: {}", data.positions.len())?;
        writeln!(out, "# normals: {}", data.normals.len())?;
        writeln!(out, "# texcoords: {}", data.texcoord_count)?;
        writeln!(out, "# triangles: {}", streams.triangle_count())?;
        for [x, y, z] in &data.positions {
            writeln!(out, "v {x} {y} {z}")?;
        }
        for [x, y, z] in &data.normals {
            writeln!(out, "vn {x} {y} {z}")?;
        }
        for tri in 0..streams.triangle_count() {
            write!(out, "f")?;
            for corner in tri * 3..tri * 3 + 3 {
                let p = streams.position[corner] + 1;
                match (has_tex, has_norm) {
                    (true, true) => write!(
                        out,
                        " {p}/{}/{}",
                        streams.texcoord[corner] + 1,
                        streams.normal[corner] + 1
                    )?,
                    (true, false) => write!(out, " {p}/{}", streams.texcoord[corner] + 1)?,
                    (false, true) => write!(out, " {p}//{}", streams.normal[corner] + 1)?,
                    (false, false) => write!(out, " {p}")?,
                }
            }
            writeln!(out)?;
        }
        out.flush()
    };
    emit().map_err(MeshError::Write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::{FaceCorner, load_obj_from_str};

    fn render(data: &ObjData) -> MeshResult<String> {
        let mut buf = Vec::new();
        write_obj(data, &mut buf)?;
        Ok(String::from_utf8(buf).expect("utf8"))
    }

    #[test]
    fn prints_one_based_faces() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n";
        let text = render(&load_obj_from_str(src).unwrap()).unwrap();
        assert!(text.contains("v 1 0 0\n"));
        assert!(text.contains("vn 0 0 1\n"));
        assert!(text.contains("f 1/1/1 2/1/1 3/1/1\n"));
    }

    #[test]
    fn corner_format_follows_present_streams() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let text = render(&load_obj_from_str(src).unwrap()).unwrap();
        assert!(text.contains("f 1//1 2//1 3//1\n"));

        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1 2 3\n";
        let text = render(&load_obj_from_str(src).unwrap()).unwrap();
        assert!(text.contains("f 1 2 3\n"));
    }

    #[test]
    fn round_trip_preserves_pools_and_streams() {
        let src = r#"
            v -1.25 0.5 3.125
            v 1e-3 2.0 -0.0
            v 0.1 0.2 0.3
            v 7 8 9
            vt 0 0
            vt 1 0
            vn 0.57735026 0.57735026 0.57735026
            vn 0 -1 0
            f 1/1/1 2/2/2 3/1/1
            f 4/2/2 3/1/1 2/2/2
        "#;
        let original = load_obj_from_str(src).unwrap();
        let text = render(&original).unwrap();
        let reparsed = load_obj_from_str(&text).unwrap();

        assert_eq!(reparsed.positions.len(), original.positions.len());
        for (a, b) in reparsed.positions.iter().zip(&original.positions) {
            for i in 0..3 {
                assert!((a[i] - b[i]).abs() < 1e-6);
            }
        }
        for (a, b) in reparsed.normals.iter().zip(&original.normals) {
            for i in 0..3 {
                assert!((a[i] - b[i]).abs() < 1e-6);
            }
        }
        assert_eq!(reparsed.indices, original.indices);
    }

    #[test]
    fn texcoord_values_are_not_round_tripped() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 1\nvn 0 0 1\nf 1/2/1 2/1/1 3/2/1\n";
        let original = load_obj_from_str(src).unwrap();
        let text = render(&original).unwrap();
        assert!(text.contains("# texcoords: 2\n"));
        assert!(!text.contains("\nvt "));

        let reparsed = load_obj_from_str(&text).unwrap();
        assert_eq!(reparsed.texcoord_count, 0);
        assert_eq!(
            ObjData {
                texcoord_count: original.texcoord_count,
                ..reparsed
            },
            original
        );
    }

    #[test]
    fn inconsistent_streams_abort_without_output() {
        let mut data = load_obj_from_str("v 0 0 0\nvn 0 0 1\nf 1//1 1//1 1//1\n").unwrap();
        data.indices.push_corner(FaceCorner {
            position: 0,
            texcoord: None,
            normal: None,
        });
        let mut buf = Vec::new();
        let err = write_obj(&data, &mut buf).unwrap_err();
        assert!(matches!(err, MeshError::StructuralInconsistency(_)));
        assert!(buf.is_empty());
    }
}
