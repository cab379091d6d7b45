//! GPU resource caches keyed by stable scene identity. All of them are
//! dropped wholesale when the rendered scene changes.

use std::collections::HashMap;

use viewport_assets::{MeshData, ResourceStore, TextureId};
use viewport_scene::ObjectId;

use crate::backend::{GpuBackend, MeshHandle, TextureHandle};
use crate::error::RenderError;
use crate::vertex::Vertex;

/// Identity of a cached vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKey {
    Object(ObjectId),
    /// Renderer-owned geometry such as the grid.
    Overlay(u32),
}

#[derive(Debug, Clone, Copy)]
struct MeshEntry {
    handle: MeshHandle,
    revision: u64,
}

#[derive(Debug, Default)]
pub struct MeshCache {
    entries: HashMap<MeshKey, MeshEntry>,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: MeshKey) -> Option<MeshHandle> {
        self.entries.get(&key).map(|e| e.handle)
    }

    /// Cached buffer for `key`, uploading `data` when missing or when
    /// `revision` moved on.
    pub fn upload<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        key: MeshKey,
        revision: u64,
        data: &MeshData,
    ) -> Result<MeshHandle, RenderError> {
        if let Some(entry) = self.entries.get(&key) {
            if entry.revision == revision {
                return Ok(entry.handle);
            }
            backend.release_mesh(entry.handle);
        }
        let handle = backend.create_mesh(&Vertex::interleave(data), &data.indices)?;
        tracing::trace!(?key, mesh = handle.0, vertices = data.vertex_count(), "uploaded vertex buffer");
        self.entries.insert(key, MeshEntry { handle, revision });
        Ok(handle)
    }

    /// Release every buffer whose key `keep` rejects. Returns how many
    /// were released.
    pub fn prune<B: GpuBackend>(&mut self, backend: &mut B, keep: impl Fn(MeshKey) -> bool) -> usize {
        let stale: Vec<MeshKey> = self.entries.keys().copied().filter(|&k| !keep(k)).collect();
        for key in &stale {
            if let Some(entry) = self.entries.remove(key) {
                backend.release_mesh(entry.handle);
            }
        }
        if !stale.is_empty() {
            tracing::debug!(count = stale.len(), "pruned vertex buffers");
        }
        stale.len()
    }

    pub fn clear<B: GpuBackend>(&mut self, backend: &mut B) {
        for (_, entry) in self.entries.drain() {
            backend.release_mesh(entry.handle);
        }
    }
}

/// Uploaded images by content id, with a placeholder for ids the resource
/// store does not know.
#[derive(Debug)]
pub struct TextureCache {
    entries: HashMap<TextureId, TextureHandle>,
    placeholder: TextureHandle,
}

impl TextureCache {
    pub fn new(placeholder: TextureHandle) -> Self {
        Self {
            entries: HashMap::new(),
            placeholder,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn placeholder(&self) -> TextureHandle {
        self.placeholder
    }

    pub fn resolve<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        assets: &ResourceStore,
        id: TextureId,
    ) -> Result<TextureHandle, RenderError> {
        if let Some(&handle) = self.entries.get(&id) {
            return Ok(handle);
        }
        let Some(image) = assets.image(id) else {
            tracing::warn!(texture = id.0, "texture not in resource store, using placeholder");
            return Ok(self.placeholder);
        };
        let handle = backend.create_texture(image)?;
        tracing::debug!(texture = id.0, width = image.width, height = image.height, "uploaded texture");
        self.entries.insert(id, handle);
        Ok(handle)
    }

    pub fn clear<B: GpuBackend>(&mut self, backend: &mut B) {
        for (_, handle) in self.entries.drain() {
            backend.release_texture(handle);
        }
    }
}
