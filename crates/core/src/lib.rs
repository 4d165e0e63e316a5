//! Core shared types and errors (renderer-agnostic).

pub mod error;

pub use error::{IndexStream, MeshError, MeshResult, MissingData};
