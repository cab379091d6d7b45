use std::collections::BTreeMap;
use std::fmt;

use glam::{Mat4, Vec3};
use viewport_assets::MeshData;

use crate::behaviors::{Collider, Playable};
use crate::camera::CameraState;
use crate::collision::Hitbox;
use crate::emitter::ParticleEmitter;
use crate::error::SceneError;
use crate::material::{DrawMode, MaterialRef};
use crate::mesh::Mesh;
use crate::object::SceneObject;
use crate::primitives::{self, CubeFaces};

const PROP_HITBOX: [f32; 5] = [1.0, 1.0, -1.0, -1.0, 1.0];

/// Construction arguments shared by every registered type. Each constructor
/// reads the fields it understands.
#[derive(Debug, Clone, Default)]
pub struct ObjectArgs {
    pub name: Option<String>,
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<f32>,
    pub hitbox: Option<Hitbox>,
    /// Extents of a `geometry_box`.
    pub extents: Option<Hitbox>,
    pub material: Option<MaterialRef>,
    pub mesh: Option<MeshData>,
    pub hidden: Option<bool>,
    pub selectable: Option<bool>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub faces: Option<CubeFaces>,
    pub uv: Option<[f32; 2]>,
    pub points: Vec<Vec3>,
    pub color: Option<[f32; 3]>,
    /// Meshes merged by `geometry_group`, each with its model matrix.
    pub parts: Vec<(MeshData, Mat4)>,
    pub fov: Option<f32>,
    pub seed: Option<u64>,
}

impl ObjectArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn hitbox(mut self, hitbox: Hitbox) -> Self {
        self.hitbox = Some(hitbox);
        self
    }

    pub fn extents(mut self, extents: Hitbox) -> Self {
        self.extents = Some(extents);
        self
    }

    pub fn material(mut self, material: MaterialRef) -> Self {
        self.material = Some(material);
        self
    }

    pub fn mesh(mut self, mesh: MeshData) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn points(mut self, points: Vec<Vec3>) -> Self {
        self.points = points;
        self
    }

    pub fn part(mut self, mesh: MeshData, model: Mat4) -> Self {
        self.parts.push((mesh, model));
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

pub type Constructor = Box<dyn Fn(&ObjectArgs) -> Result<SceneObject, SceneError> + Send + Sync>;

/// Maps type names to object constructors.
pub struct PropRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl fmt::Debug for PropRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.constructors.keys()).finish()
    }
}

impl Default for PropRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl PropRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("geometry", |args| Ok(geometry(args)));
        registry.register("geometry_box", |args| Ok(geometry_box(args)));
        registry.register("geometry_cube", |args| {
            let faces = args.faces.unwrap_or_default();
            let uv = args.uv.unwrap_or([0.0, 0.0]);
            let mut object = SceneObject::geometry(Mesh::generated(move || primitives::cube_mesh(faces, uv)));
            object.name = "Cube".into();
            Ok(object)
        });
        registry.register("geometry_plane", |args| {
            let (w, h) = (args.width.unwrap_or(1.0), args.height.unwrap_or(1.0));
            let mut object = SceneObject::geometry(Mesh::generated(move || primitives::plane_mesh(w, h)));
            object.name = "Plane".into();
            Ok(object)
        });
        registry.register("geometry_guide", |args| {
            let scale = args.scale.unwrap_or(1.0);
            let mut object = guide(Mesh::generated(move || primitives::guide_mesh(Vec3::ZERO, scale)));
            object.name = "Guide".into();
            object.draw_mode = Some(DrawMode::Lines);
            Ok(object)
        });
        registry.register("geometry_vector", |args| {
            let color = args.color.unwrap_or([1.0, 1.0, 1.0]);
            let mut object = guide(Mesh::from_data(primitives::vector_mesh(&args.points, color)));
            object.name = "Vector".into();
            object.draw_mode = Some(DrawMode::LineStrip);
            Ok(object)
        });
        registry.register("geometry_group", |args| {
            let merged = primitives::group_mesh(&args.parts).map_err(|e| SceneError::InvalidMesh(e.to_string()))?;
            let mut object = SceneObject::geometry(Mesh::from_data(merged));
            object.name = "Group".into();
            Ok(object)
        });
        registry.register("entity", |args| Ok(with_mesh(SceneObject::entity("entity"), args)));
        registry.register("entity_camera", |args| {
            let fov = args.fov.unwrap_or(90.0);
            Ok(SceneObject::camera(CameraState::perspective(fov)))
        });
        registry.register("entity_directional_light", |_| Ok(SceneObject::directional_light()));
        registry.register("entity_emitter", |args| {
            let emitter = ParticleEmitter::new(args.seed.unwrap_or(0));
            let particle = match &args.mesh {
                Some(data) => Mesh::from_data(data.clone()),
                None => Mesh::generated(|| primitives::plane_mesh(1.0, 1.0)),
            };
            Ok(SceneObject::emitter(emitter, particle))
        });
        registry.register("prop_player", |args| {
            let object = SceneObject::entity("prop_player")
                .with_name("Player")
                .with_hitbox(Hitbox::from_array(PROP_HITBOX))
                .with_behavior(Playable::new())
                .with_behavior(Collider::new());
            Ok(with_mesh(object, args))
        });
        registry.register("prop_static", |args| {
            let object = SceneObject::entity("prop_static")
                .with_name("Static")
                .with_hitbox(Hitbox::from_array(PROP_HITBOX))
                .with_behavior(Collider::fixed());
            Ok(with_mesh(object, args))
        });
        registry
    }

    /// Register or replace a constructor.
    pub fn register<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn(&ObjectArgs) -> Result<SceneObject, SceneError> + Send + Sync + 'static,
    {
        self.constructors.insert(type_name.into(), Box::new(constructor));
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Build an object of a registered type and apply the common arguments.
    pub fn create(&self, type_name: &str, args: &ObjectArgs) -> Result<SceneObject, SceneError> {
        let constructor = self
            .constructors
            .get(type_name)
            .ok_or_else(|| SceneError::UnknownType(type_name.to_string()))?;
        let mut object = constructor(args)?;
        object.set_type_name(type_name);
        apply_common(&mut object, args);
        tracing::trace!(type_name, name = %object.name, "created object");
        Ok(object)
    }
}

fn geometry(args: &ObjectArgs) -> SceneObject {
    with_mesh(SceneObject::new("geometry"), args)
}

fn geometry_box(args: &ObjectArgs) -> SceneObject {
    let extents = args.extents.unwrap_or(Hitbox::from_array(PROP_HITBOX));
    let color = args.color.unwrap_or(primitives::HITBOX_COLOR);
    let mut object = SceneObject::geometry(Mesh::generated(move || primitives::box_mesh(&extents, color)));
    object.name = "Box".into();
    object.material = MaterialRef::Primitive;
    object.draw_mode = Some(DrawMode::Lines);
    object.matrix_auto_update = true;
    object
}

fn guide(mesh: Mesh) -> SceneObject {
    let mut object = SceneObject::geometry(mesh);
    object.guide = true;
    object.material = MaterialRef::Primitive;
    object
}

fn with_mesh(mut object: SceneObject, args: &ObjectArgs) -> SceneObject {
    if let Some(data) = &args.mesh {
        object.mesh = Mesh::from_data(data.clone());
    }
    object
}

fn apply_common(object: &mut SceneObject, args: &ObjectArgs) {
    if let Some(name) = &args.name {
        object.name = name.clone();
    }
    if let Some(position) = args.position {
        object.transform.position = position;
    }
    if let Some(rotation) = args.rotation {
        object.transform.rotation = rotation;
    }
    if let Some(scale) = args.scale {
        object.transform.set_uniform_scale(scale);
    }
    if args.hitbox.is_some() {
        object.hitbox = args.hitbox;
    }
    if let Some(material) = args.material {
        object.material = material;
    }
    if let Some(hidden) = args.hidden {
        object.hidden = hidden;
    }
    if let Some(selectable) = args.selectable {
        object.selectable = selectable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILTINS: [&str; 13] = [
        "geometry",
        "geometry_box",
        "geometry_cube",
        "geometry_plane",
        "geometry_guide",
        "geometry_vector",
        "geometry_group",
        "entity",
        "entity_camera",
        "entity_directional_light",
        "entity_emitter",
        "prop_player",
        "prop_static",
    ];

    #[test]
    fn type_name_round_trip() {
        let registry = PropRegistry::with_builtins();
        for name in BUILTINS {
            let object = registry.create(name, &ObjectArgs::new());
            assert_eq!(object.as_ref().map(|o| o.type_name()), Ok(name));
        }
        assert_eq!(registry.type_names().count(), BUILTINS.len());
    }

    #[test]
    fn unknown_type_is_an_error() {
        let registry = PropRegistry::with_builtins();
        let err = registry.create("prop_dragon", &ObjectArgs::new()).err();
        assert_eq!(err, Some(SceneError::UnknownType("prop_dragon".into())));
    }

    #[test]
    fn common_args_apply() {
        let registry = PropRegistry::with_builtins();
        let args = ObjectArgs::new()
            .name("floor")
            .position(Vec3::new(0.0, -2.0, 0.0))
            .hitbox(Hitbox::from_array([1.0, 10.0, -1.0, -10.0, 2.0]));
        let object = registry.create("prop_static", &args);
        let object = object.as_ref().map(|o| (o.name.as_str(), o.transform.position.y, o.hitbox.map(|h| h.right)));
        assert_eq!(object, Ok(("floor", -2.0, Some(10.0))));
    }

    #[test]
    fn player_has_movement_and_collision() {
        let registry = PropRegistry::with_builtins();
        let player = registry.create("prop_player", &ObjectArgs::new());
        assert!(player.as_ref().is_ok_and(|p| p.has_behavior::<Playable>() && p.has_behavior::<Collider>()));
    }

    #[test]
    fn custom_constructor() {
        let mut registry = PropRegistry::empty();
        registry.register("prop_marker", |_| Ok(SceneObject::new("marker").with_name("Marker")));
        let object = registry.create("prop_marker", &ObjectArgs::new());
        assert_eq!(object.as_ref().map(|o| o.type_name()), Ok("prop_marker"));
    }
}
