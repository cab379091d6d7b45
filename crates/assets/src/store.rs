use std::collections::BTreeMap;

use crate::error::AssetError;
use crate::image::{Image, TextureId};
use crate::loader::{Resource, ResourceLoader, ResourceRequest};
use crate::mesh::MeshData;

/// A request that failed during [`ResourceStore::load_all`].
#[derive(Debug)]
pub struct LoadFailure {
    pub request: ResourceRequest,
    pub error: AssetError,
}

/// Loaded resources, indexed by logical name and images by content id.
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    images: BTreeMap<TextureId, Image>,
    image_names: BTreeMap<String, TextureId>,
    meshes: BTreeMap<String, MeshData>,
    shaders: BTreeMap<String, String>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every request, recording failures instead of aborting.
    ///
    /// Returns only after all requests were attempted.
    pub fn load_all(
        &mut self,
        loader: &dyn ResourceLoader,
        requests: &[ResourceRequest],
    ) -> Vec<LoadFailure> {
        let mut failures = Vec::new();
        for request in requests {
            match loader.load(request) {
                Ok(resource) => self.insert(&request.name, resource),
                Err(error) => {
                    tracing::warn!(name = %request.name, kind = request.kind.label(), %error, "resource failed to load");
                    failures.push(LoadFailure {
                        request: request.clone(),
                        error,
                    });
                }
            }
        }
        tracing::debug!(
            images = self.images.len(),
            meshes = self.meshes.len(),
            shaders = self.shaders.len(),
            failed = failures.len(),
            "resource barrier resolved"
        );
        failures
    }

    pub fn insert(&mut self, name: &str, resource: Resource) {
        match resource {
            Resource::Image(image) => {
                self.register_image(name, image);
            }
            Resource::Mesh(mesh) => {
                self.meshes.insert(name.to_string(), mesh);
            }
            Resource::Shader(source) => {
                self.shaders.insert(name.to_string(), source);
            }
        }
    }

    /// Register an image under `name` and return its content id.
    pub fn register_image(&mut self, name: &str, image: Image) -> TextureId {
        let id = image.content_id();
        self.images.insert(id, image);
        self.image_names.insert(name.to_string(), id);
        id
    }

    pub fn image(&self, id: TextureId) -> Option<&Image> {
        self.images.get(&id)
    }

    pub fn image_id(&self, name: &str) -> Option<TextureId> {
        self.image_names.get(name).copied()
    }

    pub fn mesh(&self, name: &str) -> Option<&MeshData> {
        self.meshes.get(name)
    }

    pub fn shader(&self, name: &str) -> Option<&str> {
        self.shaders.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.meshes.len() + self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
