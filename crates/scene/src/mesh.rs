use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use viewport_assets::MeshData;

type Generator = Arc<dyn Fn() -> MeshData + Send + Sync>;

/// Vertex data of a geometry, either given up front or generated on first
/// use.
#[derive(Clone, Default)]
pub struct Mesh {
    generator: Option<Generator>,
    data: OnceCell<MeshData>,
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("generated", &self.generator.is_some())
            .field("vertices", &self.data.get().map(MeshData::vertex_count))
            .finish()
    }
}

impl Mesh {
    pub fn from_data(data: MeshData) -> Self {
        Self {
            generator: None,
            data: OnceCell::from(data),
        }
    }

    /// Defer building the vertex data until it is first read.
    pub fn generated(f: impl Fn() -> MeshData + Send + Sync + 'static) -> Self {
        Self {
            generator: Some(Arc::new(f)),
            data: OnceCell::new(),
        }
    }

    pub fn data(&self) -> &MeshData {
        self.data.get_or_init(|| match &self.generator {
            Some(generate) => generate(),
            None => MeshData::default(),
        })
    }

    /// Whether the vertex data exists yet.
    pub fn is_built(&self) -> bool {
        self.data.get().is_some()
    }

    /// Drop generated data so the next read regenerates it.
    pub fn invalidate(&mut self) {
        if self.generator.is_some() {
            self.data = OnceCell::new();
        }
    }

    pub fn set_data(&mut self, data: MeshData) {
        self.generator = None;
        self.data = OnceCell::from(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn generator_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mesh = Mesh::generated(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            MeshData {
                vertices: vec![[0.0; 3]],
                ..Default::default()
            }
        });
        assert!(!mesh.is_built());
        assert_eq!(mesh.data().vertex_count(), 1);
        assert_eq!(mesh.data().vertex_count(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalidate_regenerates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut mesh = Mesh::generated(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            MeshData::default()
        });
        mesh.data();
        mesh.invalidate();
        mesh.data();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn static_data_survives_invalidate() {
        let mut mesh = Mesh::from_data(MeshData {
            vertices: vec![[1.0, 2.0, 3.0]],
            ..Default::default()
        });
        mesh.invalidate();
        assert!(mesh.is_built());
        assert_eq!(mesh.data().vertices[0], [1.0, 2.0, 3.0]);
    }
}
