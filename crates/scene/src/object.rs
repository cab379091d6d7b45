use std::fmt;
use std::time::Duration;

use glam::{Mat4, Vec3};
use viewport_common::{Fingerprint, FingerprintBuilder, Transform};

use crate::behavior::{Behavior, CollisionBody, UpdateContext};
use crate::camera::{CameraState, LightState};
use crate::collision::{Edge, Hitbox};
use crate::emitter::ParticleEmitter;
use crate::material::{DrawMode, MaterialRef};
use crate::mesh::Mesh;

slotmap::new_key_type! {
    /// Stable handle of an object inside a [`crate::Scene`].
    pub struct ObjectId;
}

/// Simulation state of an entity: motion, collision flags and behaviors.
pub struct EntityState {
    pub velocity: Vec3,
    pub force: Vec3,
    pub weight: f32,
    pub airborn: bool,
    /// Takes part in pairwise overlap tests as the moving party.
    pub collider: bool,
    /// Disables gravity in behaviors that apply it.
    pub hovering: bool,
    /// Body the entity last landed on; consumed by movement behaviors.
    pub ground: Option<CollisionBody>,
    pub(crate) intersections: Vec<ObjectId>,
    pub(crate) behaviors: Vec<Box<dyn Behavior>>,
}

impl Default for EntityState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            weight: 0.99,
            airborn: false,
            collider: false,
            hovering: false,
            ground: None,
            intersections: Vec::new(),
            behaviors: Vec::new(),
        }
    }
}

impl fmt::Debug for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityState")
            .field("velocity", &self.velocity)
            .field("force", &self.force)
            .field("weight", &self.weight)
            .field("airborn", &self.airborn)
            .field("collider", &self.collider)
            .field("behaviors", &self.behaviors.iter().map(|b| b.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl EntityState {
    /// Objects reported through `intersects` during the current step.
    pub fn intersections(&self) -> &[ObjectId] {
        &self.intersections
    }

    pub fn behavior_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.behaviors.iter().map(|b| b.name())
    }
}

/// A node of the scene: geometry plus optional entity, camera, light and
/// emitter facets.
#[derive(Debug)]
pub struct SceneObject {
    pub name: String,
    type_name: String,
    pub transform: Transform,
    /// Back-reference only; the scene owns every object.
    pub parent: Option<ObjectId>,
    pub mesh: Mesh,
    pub material: MaterialRef,
    /// Overrides the material's draw mode.
    pub draw_mode: Option<DrawMode>,
    pub hidden: bool,
    pub guide: bool,
    pub selectable: bool,
    pub hitbox: Option<Hitbox>,
    pub matrix_auto_update: bool,
    pub entity: Option<EntityState>,
    pub camera: Option<CameraState>,
    pub light: Option<LightState>,
    pub emitter: Option<ParticleEmitter>,
    pub(crate) removed: bool,
    pub(crate) hitbox_box: Option<ObjectId>,
    revision: u64,
    model: Mat4,
    fingerprint: Option<Fingerprint>,
}

impl SceneObject {
    /// Plain geometry with an empty mesh.
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: type_name.clone(),
            type_name,
            transform: Transform::default(),
            parent: None,
            mesh: Mesh::default(),
            material: MaterialRef::Default,
            draw_mode: None,
            hidden: false,
            guide: false,
            selectable: false,
            hitbox: None,
            matrix_auto_update: false,
            entity: None,
            camera: None,
            light: None,
            emitter: None,
            removed: false,
            hitbox_box: None,
            revision: 0,
            model: Mat4::IDENTITY,
            fingerprint: None,
        }
    }

    pub fn geometry(mesh: Mesh) -> Self {
        let mut object = Self::new("geometry");
        object.mesh = mesh;
        object
    }

    /// Geometry with entity state; updated every simulation step.
    pub fn entity(type_name: impl Into<String>) -> Self {
        let mut object = Self::new(type_name);
        object.entity = Some(EntityState::default());
        object.matrix_auto_update = true;
        object
    }

    pub fn camera(state: CameraState) -> Self {
        let mut object = Self::entity("entity_camera");
        object.name = "Camera".into();
        object.hidden = true;
        object.guide = true;
        object.material = MaterialRef::Primitive;
        object.camera = Some(state);
        object
    }

    pub fn directional_light() -> Self {
        let mut object = Self::camera(crate::camera::light_camera());
        object.type_name = "entity_directional_light".into();
        object.name = "Directional Light".into();
        object.light = Some(LightState::default());
        object
    }

    pub fn emitter(emitter: ParticleEmitter, particle: Mesh) -> Self {
        let mut object = Self::entity("entity_emitter");
        object.name = "Emitter".into();
        object.mesh = particle;
        object.emitter = Some(emitter);
        object
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_hitbox(mut self, hitbox: Hitbox) -> Self {
        self.hitbox = Some(hitbox);
        self
    }

    pub fn with_behavior(mut self, behavior: impl Behavior) -> Self {
        self.add_behavior(behavior);
        self
    }

    /// Registered type tag this object was built from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub(crate) fn set_type_name(&mut self, type_name: impl Into<String>) {
        self.type_name = type_name.into();
    }

    pub fn is_entity(&self) -> bool {
        self.entity.is_some()
    }

    pub fn is_camera(&self) -> bool {
        self.camera.is_some()
    }

    pub fn is_light(&self) -> bool {
        self.light.is_some()
    }

    pub fn is_instanced(&self) -> bool {
        self.emitter.is_some()
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Lazily remove on the next scene update.
    pub fn remove(&mut self) {
        self.removed = true;
    }

    /// Force the next model matrix refresh and vertex re-upload.
    pub fn mark_changed(&mut self) {
        self.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the mesh and invalidate cached GPU buffers.
    pub fn set_mesh(&mut self, mesh: Mesh) {
        self.mesh = mesh;
        self.mark_changed();
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    /// Fingerprint of the last model matrix computation.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint
    }

    /// Placement fingerprint for the given parent fingerprint.
    pub fn placement_fingerprint(&self, parent: Option<Fingerprint>) -> Fingerprint {
        self.transform
            .hash_into(FingerprintBuilder::new())
            .write_u64(self.revision)
            .write_fingerprint(parent)
            .finish()
    }

    /// Recompute the model matrix from world-space placement unless the
    /// fingerprint is unchanged. Returns whether it was recomputed.
    pub(crate) fn refresh_model(
        &mut self,
        global_position: Vec3,
        global_rotation: Vec3,
        parent: Option<Fingerprint>,
    ) -> bool {
        let fingerprint = self.placement_fingerprint(parent);
        if self.fingerprint == Some(fingerprint) {
            return false;
        }
        self.model = self.transform.matrix_at(global_position, global_rotation);
        self.fingerprint = Some(fingerprint);
        true
    }

    pub fn add_behavior(&mut self, behavior: impl Behavior) {
        self.entity
            .get_or_insert_with(EntityState::default)
            .behaviors
            .push(Box::new(behavior));
    }

    pub fn has_behavior<T: Behavior>(&self) -> bool {
        self.behavior::<T>().is_some()
    }

    pub fn behavior<T: Behavior>(&self) -> Option<&T> {
        self.entity
            .as_ref()?
            .behaviors
            .iter()
            .find_map(|b| b.as_any().downcast_ref::<T>())
    }

    pub fn behavior_mut<T: Behavior>(&mut self) -> Option<&mut T> {
        self.entity
            .as_mut()?
            .behaviors
            .iter_mut()
            .find_map(|b| b.as_any_mut().downcast_mut::<T>())
    }

    /// Run `f` over each behavior with mutable access to this object.
    ///
    /// Behaviors added while running are kept after the existing ones.
    fn with_behaviors(&mut self, mut f: impl FnMut(&mut dyn Behavior, &mut SceneObject)) {
        let Some(entity) = self.entity.as_mut() else {
            return;
        };
        let mut behaviors = std::mem::take(&mut entity.behaviors);
        for behavior in behaviors.iter_mut() {
            f(behavior.as_mut(), self);
        }
        if let Some(entity) = self.entity.as_mut() {
            let added = std::mem::replace(&mut entity.behaviors, behaviors);
            entity.behaviors.extend(added);
        }
    }

    pub(crate) fn run_create(&mut self) {
        self.with_behaviors(|behavior, object| behavior.on_create(object));
    }

    /// Entity step: behaviors, then velocity integration, then clearing
    /// this step's intersections.
    pub(crate) fn run_update(&mut self, ctx: &UpdateContext<'_>, dt: Duration) {
        if self.entity.is_none() {
            return;
        }
        self.with_behaviors(|behavior, object| behavior.on_update(object, ctx, dt));
        if let Some(entity) = self.entity.as_mut() {
            self.transform.position += entity.velocity;
            entity.intersections.clear();
        }
    }

    /// Report that this object's `edge` penetrates `other`.
    pub fn intersects(&mut self, other: &CollisionBody, edge: Edge) {
        let Some(entity) = self.entity.as_mut() else {
            return;
        };
        if !entity.intersections.contains(&other.id) {
            entity.intersections.push(other.id);
        }
        self.with_behaviors(|behavior, object| behavior.on_intersects(object, other, edge));
    }

    /// Snapshot used as the other party of a collision.
    pub fn collision_body(&self, id: ObjectId) -> Option<CollisionBody> {
        Some(CollisionBody {
            id,
            position: self.transform.position,
            hitbox: self.hitbox?,
            velocity: self.entity.as_ref().map_or(Vec3::ZERO, |e| e.velocity),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use slotmap::SecondaryMap;
    use viewport_input::InputState;

    use super::*;

    struct Push(Vec3);

    impl Behavior for Push {
        fn name(&self) -> &'static str {
            "push"
        }

        fn on_update(&mut self, object: &mut SceneObject, _ctx: &UpdateContext<'_>, _dt: Duration) {
            if let Some(entity) = object.entity.as_mut() {
                entity.velocity = self.0;
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn update_integrates_velocity() {
        let mut object = SceneObject::entity("entity").with_behavior(Push(Vec3::new(1.0, 0.0, 0.5)));
        let input = InputState::new();
        let positions = SecondaryMap::new();
        let ctx = UpdateContext::new(&input, &positions);
        object.run_update(&ctx, Duration::from_millis(8));
        object.run_update(&ctx, Duration::from_millis(8));
        assert_eq!(object.transform.position, Vec3::new(2.0, 0.0, 1.0));
    }

    #[test]
    fn behavior_lookup_by_type() {
        let mut object = SceneObject::entity("entity").with_behavior(Push(Vec3::X));
        assert!(object.has_behavior::<Push>());
        if let Some(push) = object.behavior_mut::<Push>() {
            push.0 = Vec3::Y;
        }
        assert_eq!(object.behavior::<Push>().map(|p| p.0), Some(Vec3::Y));
    }

    #[test]
    fn model_refresh_is_memoized() {
        let mut object = SceneObject::new("geometry").with_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(object.refresh_model(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, None));
        let first = object.model_matrix();
        assert!(!object.refresh_model(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, None));
        assert_eq!(object.model_matrix(), first);

        object.mark_changed();
        assert!(object.refresh_model(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, None));
    }

    #[test]
    fn light_is_a_hidden_camera() {
        let light = SceneObject::directional_light();
        assert!(light.is_light());
        assert!(light.is_camera());
        assert!(light.hidden && light.guide);
        assert_eq!(light.type_name(), "entity_directional_light");
    }
}
