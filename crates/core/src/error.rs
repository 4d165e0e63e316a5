//! Error taxonomy shared by the loader, the mesh builder and the backends.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// One of the three per-corner index streams of an OBJ face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexStream {
    Position,
    Texcoord,
    Normal,
}

impl fmt::Display for IndexStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexStream::Position => "position",
            IndexStream::Texcoord => "texcoord",
            IndexStream::Normal => "normal",
        })
    }
}

/// Data a renderable mesh needs but the parsed file did not provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingData {
    Positions,
    Normals,
    Faces,
}

impl fmt::Display for MissingData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingData::Positions => "vertex positions",
            MissingData::Normals => "vertex normals",
            MissingData::Faces => "faces",
        })
    }
}

#[derive(Debug, Error)]
pub enum MeshError {
    /// The OBJ file could not be opened.
    #[error("failed to open OBJ file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file opened but a line could not be read.
    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("invalid {what} '{token}' on line {line}")]
    Parse {
        line: usize,
        what: &'static str,
        token: String,
    },

    #[error("missing {what} on line {line}")]
    MissingField { line: usize, what: &'static str },

    /// Parsing finished but the result cannot be rendered.
    #[error("OBJ contained no {0}")]
    EmptyResult(MissingData),

    #[error("inconsistent index streams: {0}")]
    StructuralInconsistency(String),

    #[error("{stream} index {index} out of range (len={len}) at corner {corner}")]
    IndexOutOfRange {
        stream: IndexStream,
        index: usize,
        len: usize,
        corner: usize,
    },

    #[error("too many vertices in mesh (>{})", u32::MAX)]
    TooManyVertices,

    #[error("failed to write mesh data: {0}")]
    Write(#[source] io::Error),

    /// Reported by a rendering backend.
    #[error("backend error: {0}")]
    Backend(String),
}

pub type MeshResult<T> = Result<T, MeshError>;
