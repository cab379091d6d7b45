use std::collections::HashMap;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};
use viewport_common::{Fingerprint, MaterialId, SceneId};
use viewport_input::InputState;

use crate::behavior::{Behavior, UpdateContext};
use crate::collision::{Bounds, intersects_rect};
use crate::error::SceneError;
use crate::material::{DrawMode, Material, MaterialRef};
use crate::mesh::Mesh;
use crate::object::{ObjectId, SceneObject};
use crate::primitives::{self, HITBOX_COLOR};
use crate::registry::{ObjectArgs, PropRegistry};

const SHADOW_ANGLE_DEG: f32 = 70.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Show the synthesized hitbox boxes.
    pub show_hitbox: bool,
}

/// Read-only tree node rebuilt from parent back-references.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: ObjectId,
    pub name: String,
    pub type_name: String,
    pub children: Vec<SceneNode>,
}

/// Owns every object in a flat arena; hierarchy is a `parent` handle on
/// each child.
///
/// Iteration follows insertion order, which also fixes the order of
/// collision responses within a step.
pub struct Scene {
    id: SceneId,
    config: SceneConfig,
    objects: SlotMap<ObjectId, SceneObject>,
    order: Vec<ObjectId>,
    default_material: Material,
    primitive_material: Material,
    materials: HashMap<MaterialId, Material>,
    last_change: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("objects", &self.order.len())
            .field("materials", &self.materials.len())
            .field("last_change", &self.last_change)
            .finish()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Empty scene holding only the default directional light.
    pub fn with_config(config: SceneConfig) -> Self {
        let mut scene = Self {
            id: SceneId::new(),
            config,
            objects: SlotMap::with_key(),
            order: Vec::new(),
            default_material: Material::default(),
            primitive_material: Material::primitive(),
            materials: HashMap::new(),
            last_change: 0,
        };
        let mut light = SceneObject::directional_light();
        light.transform.position = Vec3::new(0.0, -100.0, -36.0);
        light.transform.rotation = Vec3::new(SHADOW_ANGLE_DEG.to_radians(), 0.0, 0.0);
        scene.add(light);
        scene
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn config(&self) -> SceneConfig {
        self.config
    }

    /// Monotonic counter bumped by every add and remove.
    pub fn last_change(&self) -> u64 {
        self.last_change
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id)
    }

    fn object(&self, id: ObjectId) -> Result<&SceneObject, SceneError> {
        self.objects.get(id).ok_or(SceneError::ObjectNotFound(id))
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject, SceneError> {
        self.objects.get_mut(id).ok_or(SceneError::ObjectNotFound(id))
    }

    /// Objects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.order.iter().filter_map(|&id| self.objects.get(id).map(|o| (id, o)))
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.order
    }

    /// Insert an object, run its behaviors' `on_create` and synthesize the
    /// hitbox box when it declares a hitbox.
    pub fn add(&mut self, mut object: SceneObject) -> ObjectId {
        object.run_create();
        let hitbox = object.hitbox;
        let id = self.objects.insert(object);
        self.order.push(id);

        if let Some(hitbox) = hitbox {
            let mut viz = SceneObject::geometry(Mesh::from_data(primitives::box_mesh(&hitbox, HITBOX_COLOR)))
                .with_name("Hitbox");
            viz.set_type_name("geometry_box");
            viz.material = MaterialRef::Primitive;
            viz.draw_mode = Some(DrawMode::Lines);
            viz.guide = true;
            viz.hidden = !self.config.show_hitbox;
            viz.parent = Some(id);
            let viz_id = self.objects.insert(viz);
            self.order.push(viz_id);
            if let Some(owner) = self.objects.get_mut(id) {
                owner.hitbox_box = Some(viz_id);
            }
        }

        self.last_change += 1;
        tracing::debug!(?id, objects = self.order.len(), "added object");
        id
    }

    pub fn add_all(&mut self, objects: impl IntoIterator<Item = SceneObject>) -> Vec<ObjectId> {
        objects.into_iter().map(|o| self.add(o)).collect()
    }

    /// Build a registered type and add it.
    pub fn spawn(&mut self, registry: &PropRegistry, type_name: &str, args: &ObjectArgs) -> Result<ObjectId, SceneError> {
        let object = registry.create(type_name, args)?;
        Ok(self.add(object))
    }

    /// Attach a behavior to an existing object and run its `on_create`.
    pub fn add_behavior(&mut self, id: ObjectId, mut behavior: impl Behavior) -> Result<(), SceneError> {
        let object = self.object_mut(id)?;
        behavior.on_create(object);
        object.add_behavior(behavior);
        Ok(())
    }

    /// Delete an object now. Its hitbox box goes with it; other children
    /// are detached.
    pub fn remove(&mut self, id: ObjectId) -> Result<SceneObject, SceneError> {
        let object = self.objects.remove(id).ok_or(SceneError::ObjectNotFound(id))?;
        self.order.retain(|&o| o != id);

        if let Some(viz) = object.hitbox_box {
            if self.objects.remove(viz).is_some() {
                self.order.retain(|&o| o != viz);
            }
        }
        for (_, child) in self.objects.iter_mut() {
            if child.parent == Some(id) {
                child.parent = None;
            }
        }

        self.last_change += 1;
        tracing::debug!(?id, name = %object.name, "removed object");
        Ok(object)
    }

    /// Flag an object for removal on the next update.
    pub fn mark_removed(&mut self, id: ObjectId) -> Result<(), SceneError> {
        self.object_mut(id)?.remove();
        Ok(())
    }

    /// Reparent `child`. Rejects unknown handles and cycles.
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) -> Result<(), SceneError> {
        self.object(child)?;
        if let Some(parent) = parent {
            self.object(parent)?;
            if self.ancestry(parent).contains(&child) {
                return Err(SceneError::ParentCycle { child, parent });
            }
        }
        self.object_mut(child)?.parent = parent;
        Ok(())
    }

    pub fn children(&self, id: ObjectId) -> Vec<ObjectId> {
        self.iter().filter(|(_, o)| o.parent == Some(id)).map(|(id, _)| id).collect()
    }

    /// `id` followed by its ancestors, nearest first.
    ///
    /// Stops at a missing parent, which then counts as a root, and never
    /// walks further than the number of objects.
    fn ancestry(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            if chain.len() > self.objects.len() || chain.contains(&id) {
                break;
            }
            let Some(object) = self.objects.get(id) else {
                break;
            };
            chain.push(id);
            current = object.parent;
        }
        chain
    }

    /// Sum of local positions along the parent chain.
    pub fn global_position(&self, id: ObjectId) -> Vec3 {
        self.ancestry(id)
            .iter()
            .filter_map(|&id| self.objects.get(id))
            .map(|o| o.transform.position)
            .sum()
    }

    /// Sum of local rotations along the parent chain.
    pub fn global_rotation(&self, id: ObjectId) -> Vec3 {
        self.ancestry(id)
            .iter()
            .filter_map(|&id| self.objects.get(id))
            .map(|o| o.transform.rotation)
            .sum()
    }

    /// Refresh the model matrices of `id` and its ancestors, root first.
    /// Returns whether the matrix of `id` was recomputed.
    pub fn update_model_matrix(&mut self, id: ObjectId) -> Result<bool, SceneError> {
        self.object(id)?;
        let chain = self.ancestry(id);
        let mut position = Vec3::ZERO;
        let mut rotation = Vec3::ZERO;
        let mut parent: Option<Fingerprint> = None;
        let mut changed = false;
        for &link in chain.iter().rev() {
            let object = self.object_mut(link)?;
            position += object.transform.position;
            rotation += object.transform.rotation;
            changed = object.refresh_model(position, rotation, parent);
            parent = object.fingerprint();
        }
        Ok(changed)
    }

    /// Refresh a camera's matrices from its global placement. Returns
    /// whether they were recomputed.
    pub fn update_camera(&mut self, id: ObjectId) -> Result<bool, SceneError> {
        let object = self.object(id)?;
        if object.camera.is_none() {
            return Err(SceneError::NotACamera(id));
        }
        let parent = object.parent.and_then(|p| {
            self.update_model_matrix(p).ok()?;
            self.objects.get(p)?.fingerprint()
        });
        let position = self.global_position(id);
        let rotation = self.global_rotation(id);
        let object = self.object_mut(id)?;
        let placement = object.placement_fingerprint(parent);
        let origin = object.transform.origin;
        Ok(object
            .camera
            .as_mut()
            .is_some_and(|camera| camera.refresh(position, rotation, origin, placement)))
    }

    /// Every object that is not hidden, in insertion order.
    pub fn renderable_objects(&self) -> Vec<ObjectId> {
        self.iter().filter(|(_, o)| !o.hidden).map(|(id, _)| id).collect()
    }

    /// Cameras that are not lights.
    pub fn cameras(&self) -> Vec<ObjectId> {
        self.iter()
            .filter(|(_, o)| o.is_camera() && !o.is_light())
            .map(|(id, _)| id)
            .collect()
    }

    /// The first light in the scene.
    pub fn lightsource(&self) -> Option<ObjectId> {
        self.iter().find(|(_, o)| o.is_light()).map(|(id, _)| id)
    }

    /// Tree of non-guide objects for outliner-style inspection.
    pub fn scene_graph(&self) -> Vec<SceneNode> {
        let visible = |id: ObjectId| self.objects.get(id).is_some_and(|o| !o.guide);
        self.iter()
            .filter(|(_, o)| !o.guide && !o.parent.is_some_and(visible))
            .map(|(id, _)| self.node(id, 0))
            .collect()
    }

    fn node(&self, id: ObjectId, depth: usize) -> SceneNode {
        let object = &self.objects[id];
        let children = if depth < self.objects.len() {
            self.iter()
                .filter(|(_, o)| !o.guide && o.parent == Some(id))
                .map(|(child, _)| self.node(child, depth + 1))
                .collect()
        } else {
            Vec::new()
        };
        SceneNode {
            id,
            name: object.name.clone(),
            type_name: object.type_name().to_string(),
            children,
        }
    }

    /// Show or hide every synthesized hitbox box.
    pub fn set_show_hitbox(&mut self, show: bool) {
        self.config.show_hitbox = show;
        let boxes: Vec<ObjectId> = self.objects.values().filter_map(|o| o.hitbox_box).collect();
        for id in boxes {
            if let Some(viz) = self.objects.get_mut(id) {
                viz.hidden = !show;
            }
        }
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = material.id();
        self.materials.insert(id, material);
        id
    }

    pub fn material(&self, reference: MaterialRef) -> Option<&Material> {
        match reference {
            MaterialRef::Default => Some(&self.default_material),
            MaterialRef::Primitive => Some(&self.primitive_material),
            MaterialRef::Custom(id) => self.materials.get(&id),
        }
    }

    pub fn material_mut(&mut self, reference: MaterialRef) -> Option<&mut Material> {
        match reference {
            MaterialRef::Default => Some(&mut self.default_material),
            MaterialRef::Primitive => Some(&mut self.primitive_material),
            MaterialRef::Custom(id) => self.materials.get_mut(&id),
        }
    }

    /// Material for drawing; unknown custom materials fall back to the
    /// default one.
    pub fn resolve_material(&self, reference: MaterialRef) -> &Material {
        self.material(reference).unwrap_or_else(|| {
            tracing::warn!(?reference, "unknown material, using default");
            &self.default_material
        })
    }

    /// One simulation step: reap removed objects, resolve collisions, then
    /// update every entity.
    pub fn update(&mut self, dt: Duration, input: &InputState) {
        let _span = tracing::info_span!("scene_update", objects = self.order.len()).entered();

        let removed: Vec<ObjectId> = self.iter().filter(|(_, o)| o.removed).map(|(id, _)| id).collect();
        for id in removed {
            if self.contains(id) {
                let _ = self.remove(id);
            }
        }

        self.resolve_collisions();

        let positions: SecondaryMap<ObjectId, Vec3> =
            self.iter().map(|(id, o)| (id, o.transform.position)).collect();
        let ctx = UpdateContext::new(input, &positions);
        for i in 0..self.order.len() {
            let id = self.order[i];
            let Some(object) = self.objects.get_mut(id) else {
                continue;
            };
            object.run_update(&ctx, dt);
            if let Some(emitter) = object.emitter.as_mut() {
                emitter.update(Vec3::ZERO, dt);
            }
        }
    }

    /// Test every collider against every other object with a hitbox and
    /// report penetrating edges to the collider, horizontal edge first.
    fn resolve_collisions(&mut self) {
        for i in 0..self.order.len() {
            let obj_id = self.order[i];
            let Some(body) = self.objects.get(obj_id).and_then(|o| o.collision_body(obj_id)) else {
                continue;
            };
            let other = body.bounds();
            for j in 0..self.order.len() {
                let collider_id = self.order[j];
                if collider_id == obj_id {
                    continue;
                }
                let Some(collider) = self.objects.get_mut(collider_id) else {
                    continue;
                };
                if !collider.entity.as_ref().is_some_and(|e| e.collider) {
                    continue;
                }
                let Some(hitbox) = collider.hitbox else {
                    continue;
                };

                let hits = intersects_rect(&Bounds::new(collider.transform.position, &hitbox), &other);
                if let Some(edge) = hits.horizontal {
                    collider.intersects(&body, edge);
                }
                // A horizontal response moves the collider; test the vertical
                // edge against where it ended up.
                let vertical = match hits.horizontal {
                    Some(_) => intersects_rect(&Bounds::new(collider.transform.position, &hitbox), &other).vertical,
                    None => hits.vertical,
                };
                if let Some(edge) = vertical {
                    collider.intersects(&body, edge);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::Collider;
    use crate::collision::Hitbox;

    const STEP: Duration = Duration::from_nanos(7_812_500);

    fn falling_entity(y: f32) -> SceneObject {
        SceneObject::entity("entity")
            .with_position(Vec3::new(0.0, y, 0.0))
            .with_hitbox(Hitbox::from_array([1.0, 1.0, -1.0, -1.0, 1.0]))
            .with_behavior(Collider::new())
    }

    #[test]
    fn starts_with_light() {
        let scene = Scene::new();
        let light = scene.lightsource().and_then(|id| scene.get(id));
        assert!(light.is_some_and(|l| l.transform.position == Vec3::new(0.0, -100.0, -36.0)));
        assert!(scene.cameras().is_empty());
        assert!(scene.scene_graph().is_empty());
    }

    #[test]
    fn falling_entity_settles_on_floor() {
        let registry = PropRegistry::with_builtins();
        let mut scene = Scene::new();
        let floor_args = ObjectArgs::new().hitbox(Hitbox::from_array([1.0, 10.0, -1.0, -10.0, 2.0]));
        let floor = scene.spawn(&registry, "prop_static", &floor_args);
        assert!(floor.is_ok());

        let id = scene.add(falling_entity(5.0));
        if let Some(entity) = scene.get_mut(id).and_then(|o| o.entity.as_mut()) {
            entity.velocity.y = -0.25;
        }

        let input = InputState::new();
        for _ in 0..40 {
            scene.update(STEP, &input);
        }

        let object = scene.get(id);
        assert_eq!(object.map(|o| o.transform.position.y), Some(2.0));
        assert_eq!(object.and_then(|o| o.entity.as_ref()).map(|e| (e.airborn, e.velocity.y)), Some((false, 0.0)));
        let floor_y = floor.ok().and_then(|f| scene.get(f)).map(|f| f.transform.position.y);
        assert_eq!(floor_y, Some(0.0));
    }

    #[test]
    fn player_rests_on_thin_floor() {
        let registry = PropRegistry::with_builtins();
        let mut scene = Scene::new();
        let floor_args = ObjectArgs::new()
            .position(Vec3::new(0.0, -0.5, 0.0))
            .hitbox(Hitbox::new(0.5, 10.0, -0.5, -10.0, 10.0));
        assert!(scene.spawn(&registry, "prop_static", &floor_args).is_ok());
        let player = scene.spawn(&registry, "prop_player", &ObjectArgs::new().position(Vec3::new(0.0, 1.0, 0.0)));
        let Ok(player) = player else {
            panic!("prop_player failed to spawn");
        };

        let input = InputState::new();
        for _ in 0..400 {
            scene.update(STEP, &input);
        }

        let object = scene.get(player);
        let position = object.map(|o| o.transform.position).unwrap_or(Vec3::NAN);
        assert!(position.y > 0.95 && position.y <= 1.0, "{position}");
        assert_eq!(position.x, 0.0);
        assert_eq!(object.and_then(|o| o.entity.as_ref()).map(|e| e.airborn), Some(false));
    }

    #[test]
    fn particles_spawn_local_to_emitter() {
        let registry = PropRegistry::with_builtins();
        let mut scene = Scene::new();
        let args = ObjectArgs::new().position(Vec3::new(-3.0, 0.0, 0.0)).seed(5);
        let Ok(id) = scene.spawn(&registry, "entity_emitter", &args) else {
            panic!("entity_emitter failed to spawn");
        };
        scene.update(STEP, &InputState::new());

        let instances = scene.get(id).and_then(|o| o.emitter.as_ref()).map(|e| e.instance_data());
        let instances = instances.unwrap_or_default();
        assert!(!instances.is_empty());
        for [x, y, z, _] in instances {
            assert!(Vec3::new(x, y, z).length() < 0.5, "{x} {y} {z}");
        }
        assert_eq!(scene.global_position(id), Vec3::new(-3.0, 0.0, 0.0));
    }

    #[test]
    fn model_matrix_memoized() {
        let mut scene = Scene::new();
        let id = scene.add(SceneObject::new("geometry").with_position(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(scene.update_model_matrix(id), Ok(true));
        assert_eq!(scene.update_model_matrix(id), Ok(false));
        let before = scene.get(id).map(|o| o.model_matrix());

        if let Some(object) = scene.get_mut(id) {
            object.transform.position.x = 2.0;
        }
        assert_eq!(scene.update_model_matrix(id), Ok(true));
        assert_ne!(scene.get(id).map(|o| o.model_matrix()), before);
    }

    #[test]
    fn moving_parent_moves_child() {
        let mut scene = Scene::new();
        let parent = scene.add(SceneObject::new("geometry"));
        let child = scene.add(SceneObject::new("geometry").with_position(Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(scene.set_parent(child, Some(parent)), Ok(()));
        assert_eq!(scene.update_model_matrix(child), Ok(true));

        if let Some(object) = scene.get_mut(parent) {
            object.transform.position.x = 3.0;
        }
        assert_eq!(scene.global_position(child), Vec3::new(3.0, 1.0, 0.0));
        assert_eq!(scene.update_model_matrix(child), Ok(true));
        let translation = scene.get(child).map(|o| o.model_matrix().w_axis.truncate());
        assert_eq!(translation, Some(Vec3::new(3.0, 1.0, 0.0)));
    }

    #[test]
    fn parent_cycles_rejected() {
        let mut scene = Scene::new();
        let a = scene.add(SceneObject::new("geometry"));
        let b = scene.add(SceneObject::new("geometry"));
        assert_eq!(scene.set_parent(b, Some(a)), Ok(()));
        assert_eq!(scene.set_parent(a, Some(b)), Err(SceneError::ParentCycle { child: a, parent: b }));
        assert_eq!(scene.set_parent(a, Some(a)), Err(SceneError::ParentCycle { child: a, parent: a }));
    }

    #[test]
    fn hitbox_box_follows_owner() {
        let mut scene = Scene::new();
        let before = scene.len();
        let id = scene.add(falling_entity(0.0));
        assert_eq!(scene.len(), before + 2);

        let viz = scene.children(id);
        assert_eq!(viz.len(), 1);
        assert!(viz.iter().all(|&v| scene.get(v).is_some_and(|o| o.guide && o.hidden)));

        scene.set_show_hitbox(true);
        assert!(viz.iter().all(|&v| scene.get(v).is_some_and(|o| !o.hidden)));

        assert!(scene.remove(id).is_ok());
        assert_eq!(scene.len(), before);
    }

    #[test]
    fn removal_detaches_children() {
        let mut scene = Scene::new();
        let parent = scene.add(SceneObject::new("geometry"));
        let child = scene.add(SceneObject::new("geometry"));
        assert_eq!(scene.set_parent(child, Some(parent)), Ok(()));
        assert!(scene.remove(parent).is_ok());
        assert_eq!(scene.get(child).map(|o| o.parent), Some(None));
        assert!(matches!(scene.remove(parent), Err(SceneError::ObjectNotFound(_))));
    }

    #[test]
    fn marked_objects_reaped_on_update() {
        let mut scene = Scene::new();
        let id = scene.add(SceneObject::new("geometry"));
        assert_eq!(scene.mark_removed(id), Ok(()));
        assert!(scene.contains(id));
        scene.update(STEP, &InputState::new());
        assert!(!scene.contains(id));
    }

    #[test]
    fn scene_graph_skips_guides() {
        let mut scene = Scene::new();
        let root = scene.add(SceneObject::new("geometry").with_name("root"));
        let leaf = scene.add(SceneObject::new("geometry").with_name("leaf"));
        let _ = scene.set_parent(leaf, Some(root));
        scene.add(falling_entity(0.0).with_name("ball"));

        let graph = scene.scene_graph();
        let names: Vec<&str> = graph.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["root", "ball"]);
        assert_eq!(graph[0].children.len(), 1);
        assert_eq!(graph[0].children[0].name, "leaf");
        assert!(graph[1].children.is_empty());
    }

    #[test]
    fn camera_matrices_refresh_once() {
        let mut scene = Scene::new();
        let camera = scene.add(SceneObject::camera(crate::camera::CameraState::default()));
        assert_eq!(scene.cameras(), vec![camera]);
        assert_eq!(scene.update_camera(camera), Ok(true));
        assert_eq!(scene.update_camera(camera), Ok(false));

        let plain = scene.add(SceneObject::new("geometry"));
        assert_eq!(scene.update_camera(plain), Err(SceneError::NotACamera(plain)));
    }
}
