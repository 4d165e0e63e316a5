//! Single-mesh container: raw OBJ data, the built mesh and its GPU buffers,
//! released together.

use std::{io::Write, mem, path::Path};

use asset::{MeshData, ObjData};
use corelib::MeshResult;

use crate::{Vertex, backend::MeshBackend};

/// Whether the mesh currently owns backend buffers.
#[derive(Debug)]
pub enum GpuState<H> {
    Empty,
    Built(H),
}

impl<H> GpuState<H> {
    pub fn is_built(&self) -> bool {
        matches!(self, GpuState::Built(_))
    }
}

pub struct ObjModel<B: MeshBackend> {
    backend: B,
    raw: ObjData,
    mesh: MeshData,
    gpu: GpuState<B::Handle>,
}

impl<B: MeshBackend> ObjModel<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            raw: ObjData::default(),
            mesh: MeshData::default(),
            gpu: GpuState::Empty,
        }
    }

    /// Replace the held data with the contents of `path`.
    ///
    /// Anything previously loaded or built is released first, so a failed
    /// load leaves the model empty.
    pub fn load(&mut self, path: impl AsRef<Path>) -> MeshResult<()> {
        self.destroy();
        let data = asset::load_obj_from_path(path.as_ref()).inspect_err(|e| {
            log::error!("Unable to load model {:?}: {}", path.as_ref(), e);
        })?;
        self.raw = data;
        Ok(())
    }

    /// Same as [`ObjModel::load`] for in-memory OBJ text.
    pub fn load_str(&mut self, contents: &str) -> MeshResult<()> {
        self.destroy();
        self.raw = asset::load_obj_from_str(contents)?;
        Ok(())
    }

    /// Build the vertex/index buffers and hand them to the backend.
    /// No-op while already built.
    pub fn build(&mut self) -> MeshResult<()> {
        if self.gpu.is_built() {
            log::debug!("Mesh already built; skipping");
            return Ok(());
        }
        let mesh = asset::build_mesh(&self.raw)?;
        let vertices: Vec<Vertex> = mesh.vertices.iter().copied().map(Vertex::from).collect();
        let handle = self.backend.upload(&vertices, &mesh.indices)?;
        log::info!(
            "Built mesh: {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.indices.len() / 3
        );
        self.mesh = mesh;
        self.gpu = GpuState::Built(handle);
        Ok(())
    }

    /// Draw the built mesh; does nothing before `build`.
    pub fn draw(&mut self) -> MeshResult<()> {
        match &self.gpu {
            GpuState::Built(handle) => self.backend.draw(handle, self.mesh.index_count()),
            GpuState::Empty => Ok(()),
        }
    }

    /// Release GPU buffers, then clear raw and built data. Safe to call
    /// repeatedly.
    ///
    /// A model that was loaded but never built makes no backend call, but its
    /// loaded CPU data is still cleared.
    pub fn destroy(&mut self) {
        if let GpuState::Built(handle) = mem::replace(&mut self.gpu, GpuState::Empty) {
            self.backend.release(handle);
            log::info!("Mesh unloaded");
        }
        self.raw.clear();
        self.mesh.clear();
    }

    /// Dump the raw data as OBJ text to stdout.
    pub fn print(&self) -> MeshResult<()> {
        asset::print_obj(&self.raw)
    }

    pub fn write_obj<W: Write>(&self, out: W) -> MeshResult<()> {
        asset::write_obj(&self.raw, out)
    }

    pub fn raw(&self) -> &ObjData {
        &self.raw
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn gpu(&self) -> &GpuState<B::Handle> {
        &self.gpu
    }

    pub fn is_built(&self) -> bool {
        self.gpu.is_built()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: MeshBackend> Drop for ObjModel<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}
