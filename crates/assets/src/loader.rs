use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::AssetError;
use crate::image::Image;
use crate::mesh::MeshData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Image,
    Mesh,
    Shader,
}

impl ResourceKind {
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Mesh => "mesh",
            ResourceKind::Shader => "shader",
        }
    }
}

/// A loaded resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Image(Image),
    Mesh(MeshData),
    Shader(String),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Image(_) => ResourceKind::Image,
            Resource::Mesh(_) => ResourceKind::Mesh,
            Resource::Shader(_) => ResourceKind::Shader,
        }
    }
}

/// A request for one resource by logical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRequest {
    pub name: String,
    pub kind: ResourceKind,
}

impl ResourceRequest {
    pub fn image(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ResourceKind::Image }
    }

    pub fn mesh(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ResourceKind::Mesh }
    }

    pub fn shader(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ResourceKind::Shader }
    }
}

/// Supplies decoded resources by logical name.
pub trait ResourceLoader {
    fn load(&self, request: &ResourceRequest) -> Result<Resource, AssetError>;
}

/// Loader backed by resources registered in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    resources: BTreeMap<String, Resource>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, resource: Resource) {
        self.resources.insert(name.into(), resource);
    }

    pub fn with(mut self, name: impl Into<String>, resource: Resource) -> Self {
        self.insert(name, resource);
        self
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, request: &ResourceRequest) -> Result<Resource, AssetError> {
        let resource = self
            .resources
            .get(&request.name)
            .ok_or_else(|| AssetError::NotFound(request.name.clone()))?;
        if resource.kind() != request.kind {
            return Err(AssetError::WrongKind {
                name: request.name.clone(),
                expected: request.kind.label(),
                found: resource.kind().label(),
            });
        }
        Ok(resource.clone())
    }
}

/// Loader reading from a directory tree.
///
/// Shaders are `<name>.wgsl`, meshes `<name>.mesh.json` and images
/// `<name>.image.json` (already decoded RGBA8).
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn path_for(&self, request: &ResourceRequest) -> PathBuf {
        let file = match request.kind {
            ResourceKind::Shader => format!("{}.wgsl", request.name),
            ResourceKind::Mesh => format!("{}.mesh.json", request.name),
            ResourceKind::Image => format!("{}.image.json", request.name),
        };
        self.root.join(file)
    }
}

impl ResourceLoader for DirectoryLoader {
    fn load(&self, request: &ResourceRequest) -> Result<Resource, AssetError> {
        let path = self.path_for(request);
        if !path.exists() {
            return Err(AssetError::NotFound(path.display().to_string()));
        }
        tracing::debug!(path = %path.display(), "loading resource");
        match request.kind {
            ResourceKind::Shader => Ok(Resource::Shader(std::fs::read_to_string(&path)?)),
            ResourceKind::Mesh => {
                let file = std::fs::File::open(&path)?;
                let mesh: MeshData = serde_json::from_reader(file)?;
                mesh.validate()?;
                Ok(Resource::Mesh(mesh))
            }
            ResourceKind::Image => {
                let file = std::fs::File::open(&path)?;
                let image: Image = serde_json::from_reader(file)?;
                image.validate()?;
                Ok(Resource::Image(image))
            }
        }
    }
}
