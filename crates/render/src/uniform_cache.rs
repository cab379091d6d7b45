use std::collections::HashMap;

use viewport_common::{Fingerprint, MaterialId};
use viewport_scene::ShaderKind;

use crate::backend::{GpuBackend, ProgramHandle, UniformValue};
use crate::cache::MeshKey;
use crate::error::RenderError;

/// Last value pushed for each uniform of one program, compared exactly.
#[derive(Debug, Default)]
pub struct UniformCache {
    values: HashMap<String, UniformValue>,
    model: Option<(MeshKey, Fingerprint)>,
    materials: HashMap<MaterialId, u64>,
    uploads: u64,
    skipped: u64,
}

impl UniformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `value` must be uploaded. The entry is updated
    /// either way.
    pub fn update(&mut self, name: &str, value: UniformValue) -> bool {
        let matched = match self.values.get_mut(name) {
            Some(cached) => {
                let matched = cached.bit_eq(&value);
                *cached = value;
                matched
            }
            None => {
                self.values.insert(name.to_string(), value);
                false
            }
        };
        if matched {
            self.skipped += 1;
        } else {
            self.uploads += 1;
        }
        !matched
    }

    /// Whether the model matrix of `key` must be pushed: true unless the
    /// same object with the same fingerprint was the last one pushed.
    pub fn model_changed(&mut self, key: MeshKey, fingerprint: Fingerprint) -> bool {
        let entry = Some((key, fingerprint));
        if self.model == entry {
            return false;
        }
        self.model = entry;
        true
    }

    /// Whether a material's attributes must be pushed because its revision
    /// differs from the one this program last saw.
    pub fn material_changed(&mut self, material: MaterialId, revision: u64) -> bool {
        self.materials.insert(material, revision) != Some(revision)
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.model = None;
        self.materials.clear();
    }
}

/// A compiled program plus the uniform cache that guards it.
#[derive(Debug)]
pub struct ShaderInstance {
    kind: ShaderKind,
    program: ProgramHandle,
    cache: UniformCache,
}

impl ShaderInstance {
    pub fn new<B: GpuBackend>(backend: &mut B, kind: ShaderKind) -> Result<Self, RenderError> {
        let program = backend.create_program(kind)?;
        tracing::debug!(kind = kind.label(), program = program.0, "created shader instance");
        Ok(Self {
            kind,
            program,
            cache: UniformCache::new(),
        })
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn cache(&self) -> &UniformCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut UniformCache {
        &mut self.cache
    }

    pub fn bind<B: GpuBackend>(&self, backend: &mut B) {
        backend.use_program(self.program);
    }

    /// Upload a uniform unless the cached value is identical.
    pub fn set<B: GpuBackend>(&mut self, backend: &mut B, name: &str, value: UniformValue) {
        if self.cache.update(name, value) {
            backend.set_uniform(self.program, name, value);
        }
    }
}
