//! Rendering collaborator interface and a headless implementation.

use corelib::{MeshError, MeshResult};

use crate::Vertex;

/// Receives finished vertex/index buffers and draws them.
///
/// A handle is owned by whoever holds the built mesh and must be given
/// back through [`MeshBackend::release`] exactly once.
pub trait MeshBackend {
    type Handle;

    fn upload(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshResult<Self::Handle>;

    /// Issue an indexed triangle-list draw of `index_count` indices.
    fn draw(&mut self, handle: &Self::Handle, index_count: u32) -> MeshResult<()>;

    fn release(&mut self, handle: Self::Handle);
}

/// Handle to buffers held by a [`HeadlessBackend`].
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessMesh {
    pub id: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UploadedMesh {
    pub id: u64,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub id: u64,
    pub index_count: u32,
}

/// CPU-only backend: keeps uploaded buffers and records draws/releases.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    live: Vec<UploadedMesh>,
    draws: Vec<DrawCall>,
    released: Vec<u64>,
    uploads: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers uploaded and not yet released.
    pub fn live(&self) -> &[UploadedMesh] {
        &self.live
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn released(&self) -> &[u64] {
        &self.released
    }

    pub fn upload_count(&self) -> usize {
        self.uploads
    }
}

impl MeshBackend for HeadlessBackend {
    type Handle = HeadlessMesh;

    fn upload(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshResult<HeadlessMesh> {
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::Backend(format!(
                "index {} references past {} vertices",
                bad,
                vertices.len()
            )));
        }
        // Ids start at zero; a zero id is a valid handle.
        let id = self.next_id;
        self.next_id += 1;
        self.uploads += 1;
        self.live.push(UploadedMesh {
            id,
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        });
        log::debug!(
            "Headless upload #{}: {} vertices, {} indices",
            id,
            vertices.len(),
            indices.len()
        );
        Ok(HeadlessMesh { id })
    }

    fn draw(&mut self, handle: &HeadlessMesh, index_count: u32) -> MeshResult<()> {
        let mesh = self
            .live
            .iter()
            .find(|m| m.id == handle.id)
            .ok_or_else(|| MeshError::Backend(format!("draw of released mesh #{}", handle.id)))?;
        if index_count as usize > mesh.indices.len() {
            return Err(MeshError::Backend(format!(
                "draw of {} indices exceeds {} uploaded",
                index_count,
                mesh.indices.len()
            )));
        }
        self.draws.push(DrawCall {
            id: handle.id,
            index_count,
        });
        Ok(())
    }

    fn release(&mut self, handle: HeadlessMesh) {
        self.live.retain(|m| m.id != handle.id);
        self.released.push(handle.id);
        log::debug!("Headless release #{}", handle.id);
    }
}
