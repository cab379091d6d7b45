use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Instant;

use glam::{Mat4, Vec2, Vec3, Vec4};
use viewport_assets::{Image, ResourceStore};
use viewport_common::{Fingerprint, MaterialId, SceneId};
use viewport_scene::{
    DrawMode, MAX_PARTICLE_COUNT, Material, Mesh, ObjectId, Projection, Scene, SceneError, ShaderKind, primitives,
};

use crate::backend::{
    Attachment, Clear, GpuBackend, MeshHandle, PassState, RenderTarget, TextureHandle, TextureUnit, UniformValue,
    uniform,
};
use crate::cache::{MeshCache, MeshKey, TextureCache};
use crate::composite::{self, CompositeParams};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::info::RenderInfo;
use crate::pass::{CameraSource, PassContent, PassFilter, RenderPass, standard_passes};
use crate::uniform_cache::ShaderInstance;

const GRID_OVERLAY: u32 = 0;
const ORTHOGRAPHIC_SENSOR: f32 = 20.0;

/// Programs owned by the renderer rather than by a material.
const FIXED_SHADERS: [ShaderKind; 5] = [
    ShaderKind::Primitive,
    ShaderKind::Depth,
    ShaderKind::Index,
    ShaderKind::Light,
    ShaderKind::Composite,
];

#[derive(Debug, Clone, Copy)]
struct PendingResize {
    size: (u32, u32),
    deadline: Instant,
}

/// Camera and light matrices for one scene draw.
#[derive(Debug, Clone, Copy)]
struct View {
    proj_view: Mat4,
    eye: Vec3,
    light: Option<LightView>,
}

#[derive(Debug, Clone, Copy)]
struct LightView {
    proj: Mat4,
    view: Mat4,
    color: Vec3,
}

/// Multi-pass scene renderer over a [`GpuBackend`].
///
/// Vertex buffers, textures and per-material shader instances are cached by
/// object, texture and material identity and dropped together when a
/// different scene is drawn.
pub struct Renderer<B: GpuBackend> {
    backend: B,
    config: RenderConfig,
    composite: CompositeParams,
    resolution: (u32, u32),
    pending_resize: Option<PendingResize>,
    passes: Vec<RenderPass>,
    last_scene: Option<SceneId>,
    meshes: MeshCache,
    textures: TextureCache,
    material_shaders: HashMap<MaterialId, ShaderInstance>,
    fixed_shaders: HashMap<ShaderKind, ShaderInstance>,
    empty_texture: TextureHandle,
    screen_quad: MeshHandle,
    grid: Mesh,
    selection: Option<ObjectId>,
    initial_render: bool,
    info: RenderInfo,
}

impl<B: GpuBackend> Renderer<B> {
    pub fn new(mut backend: B, config: RenderConfig, width: u32, height: u32) -> Result<Self, RenderError> {
        let resolution = (width.max(1), height.max(1));
        let empty_texture = backend.create_texture(&Image::empty())?;
        let placeholder = backend.create_texture(&Image::placeholder())?;
        let screen_quad = backend.create_mesh(&composite::screen_quad(), &[])?;

        let mut fixed_shaders = HashMap::new();
        for kind in FIXED_SHADERS {
            fixed_shaders.insert(kind, ShaderInstance::new(&mut backend, kind)?);
        }

        let passes = standard_passes(&config)
            .into_iter()
            .map(|desc| RenderPass::create(&mut backend, desc, resolution))
            .collect::<Result<Vec<_>, _>>()?;

        let (grid_size, grid_count) = (config.grid_size, config.grid_count);
        tracing::info!(
            width = resolution.0,
            height = resolution.1,
            passes = passes.len(),
            post_process = config.post_process,
            "renderer ready"
        );
        Ok(Self {
            backend,
            composite: CompositeParams::from_config(&config),
            config,
            resolution,
            pending_resize: None,
            passes,
            last_scene: None,
            meshes: MeshCache::new(),
            textures: TextureCache::new(placeholder),
            material_shaders: HashMap::new(),
            fixed_shaders,
            empty_texture,
            screen_quad,
            grid: Mesh::generated(move || primitives::grid_mesh(grid_size, grid_count)),
            selection: None,
            initial_render: true,
            info: RenderInfo::default(),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn info(&self) -> &RenderInfo {
        &self.info
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(RenderPass::name).collect()
    }

    pub fn placeholder_texture(&self) -> TextureHandle {
        self.textures.placeholder()
    }

    pub fn empty_texture(&self) -> TextureHandle {
        self.empty_texture
    }

    /// Cached vertex buffer of an object, if it has been drawn.
    pub fn mesh_handle(&self, id: ObjectId) -> Option<MeshHandle> {
        self.meshes.get(MeshKey::Object(id))
    }

    /// Object outlined by the composite pass.
    pub fn select(&mut self, id: Option<ObjectId>) {
        self.selection = id;
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    /// Request a new surface size. Repeated calls within the debounce
    /// window coalesce; offscreen targets follow on [`Renderer::poll_resize`].
    pub fn set_resolution(&mut self, width: u32, height: u32, now: Instant) {
        let size = (width.max(1), height.max(1));
        if size == self.resolution && self.pending_resize.is_none() {
            return;
        }
        self.resolution = size;
        match &mut self.pending_resize {
            Some(pending) => pending.size = size,
            None => {
                self.pending_resize = Some(PendingResize {
                    size,
                    deadline: now + self.config.resize_debounce(),
                });
            }
        }
        if self.config.debug {
            tracing::debug!(width = size.0, height = size.1, "resolution set");
        }
    }

    /// Apply a pending resize once its debounce window has passed. Returns
    /// whether targets were resized.
    pub fn poll_resize(&mut self, now: Instant) -> Result<bool, RenderError> {
        let Some(pending) = self.pending_resize else {
            return Ok(false);
        };
        if now < pending.deadline {
            return Ok(false);
        }
        self.pending_resize = None;
        for pass in &mut self.passes {
            pass.resize(&mut self.backend, pending.size)?;
        }
        tracing::debug!(width = pending.size.0, height = pending.size.1, "resized render targets");
        Ok(true)
    }

    /// Drop every cache tied to the previous scene.
    fn clear_caches(&mut self) {
        self.meshes.clear(&mut self.backend);
        self.textures.clear(&mut self.backend);
        for (_, shader) in self.material_shaders.drain() {
            self.backend.release_program(shader.program());
        }
        for shader in self.fixed_shaders.values_mut() {
            shader.cache_mut().clear();
        }
        tracing::debug!("scene changed, cleared render caches");
    }

    /// Render one frame of `scene` through every pass and onto the surface.
    ///
    /// `camera` overrides the scene's first camera for the caller-camera
    /// passes.
    pub fn draw(
        &mut self,
        scene: &mut Scene,
        assets: &ResourceStore,
        camera: Option<ObjectId>,
    ) -> Result<&RenderInfo, RenderError> {
        let _span = tracing::info_span!("draw", objects = scene.len()).entered();
        let started = Instant::now();

        if self.last_scene != Some(scene.id()) {
            self.last_scene = Some(scene.id());
            self.clear_caches();
        }
        self.info = RenderInfo {
            resolution: self.resolution,
            ..RenderInfo::default()
        };

        let camera = camera.or_else(|| scene.cameras().first().copied());
        if let Some(id) = camera {
            self.fit_sensor(scene, id);
        }
        self.meshes.prune(&mut self.backend, |key| match key {
            MeshKey::Object(id) => scene.contains(id),
            MeshKey::Overlay(_) => true,
        });

        if self.initial_render {
            self.backend.bind_texture(TextureUnit::EMPTY, Some(self.empty_texture));
            self.backend.bind_texture(TextureUnit::PLACEHOLDER, Some(self.textures.placeholder()));
            self.initial_render = false;
        }

        for index in 0..self.passes.len() {
            self.run_pass(index, scene, assets, camera)?;
        }

        let clear = Clear {
            color: self.config.clear_pass.then_some(self.config.background),
            depth: true,
        };
        self.backend
            .begin_pass(RenderTarget::Surface, self.resolution, PassState::default(), clear)?;
        if self.config.post_process {
            let selection = self
                .selection
                .and_then(|id| scene.ids().iter().position(|&o| o == id))
                .map_or(0.0, composite::index_value);
            self.draw_screen(ShaderKind::Composite, selection)?;
        } else if let Some(view) = self.scene_view(scene, camera)? {
            let grid = self.config.show_grid;
            self.draw_scene(scene, assets, &view, PassFilter::All, None, grid)?;
        }
        self.backend.end_pass()?;
        self.backend.end_frame()?;

        self.info.shaders = self.material_shaders.len() + self.fixed_shaders.len();
        self.info.textures = self.textures.len() + 2;
        self.info.buffers = self.meshes.len();
        self.info.frame_time = started.elapsed();
        if self.config.debug {
            tracing::debug!(info = %self.info, "frame drawn");
        }
        Ok(&self.info)
    }

    /// Perspective cameras match the render resolution; orthographic ones
    /// other than lights get a fixed extent.
    fn fit_sensor(&self, scene: &mut Scene, id: ObjectId) {
        let (width, height) = (self.resolution.0 as f32, self.resolution.1 as f32);
        let Some(object) = scene.get_mut(id) else {
            return;
        };
        let is_light = object.is_light();
        if let Some(camera) = object.camera.as_mut() {
            match camera.projection {
                Projection::Perspective => camera.set_sensor(width, height),
                Projection::Orthographic if !is_light => {
                    camera.set_sensor(ORTHOGRAPHIC_SENSOR, ORTHOGRAPHIC_SENSOR);
                }
                Projection::Orthographic => {}
            }
        }
    }

    fn scene_view(&self, scene: &mut Scene, camera: Option<ObjectId>) -> Result<Option<View>, RenderError> {
        let Some(id) = camera else {
            return Ok(None);
        };
        scene.update_camera(id)?;
        let state = scene
            .get(id)
            .and_then(|o| o.camera.as_ref())
            .ok_or(SceneError::NotACamera(id))?;
        let (proj_view, eye) = (state.proj_view(), state.eye());

        let light = match scene.lightsource() {
            Some(light) => {
                scene.update_camera(light)?;
                scene.get(light).and_then(|o| {
                    let camera = o.camera.as_ref()?;
                    Some(LightView {
                        proj: camera.proj(),
                        view: camera.view(),
                        color: o.light.map_or(Vec3::ONE, |l| l.color),
                    })
                })
            }
            None => None,
        };
        Ok(Some(View { proj_view, eye, light }))
    }

    fn run_pass(
        &mut self,
        index: usize,
        scene: &mut Scene,
        assets: &ResourceStore,
        camera: Option<ObjectId>,
    ) -> Result<(), RenderError> {
        let pass = self.passes[index].clone();
        for unit in pass.outputs() {
            self.backend.bind_texture(unit, None);
        }
        self.backend
            .begin_pass(RenderTarget::Offscreen(pass.target), pass.size, pass.desc.state, pass.desc.clear)?;

        match pass.desc.content {
            PassContent::Scene {
                filter,
                shader_override,
                grid,
            } => {
                let camera = match pass.desc.camera {
                    CameraSource::Light => scene.lightsource(),
                    CameraSource::Caller => camera,
                };
                if let Some(view) = self.scene_view(scene, camera)? {
                    self.draw_scene(scene, assets, &view, filter, shader_override, grid)?;
                }
            }
            PassContent::Screen(kind) => self.draw_screen(kind, 0.0)?,
        }
        self.backend.end_pass()?;

        if let Some(unit) = pass.desc.color_unit {
            let texture = self.backend.target_texture(pass.target, Attachment::Color);
            self.backend.bind_texture(unit, texture);
        }
        if let Some(unit) = pass.desc.depth_unit {
            let texture = self.backend.target_texture(pass.target, Attachment::Depth);
            self.backend.bind_texture(unit, texture);
        }
        self.info.passes += 1;
        Ok(())
    }

    fn draw_scene(
        &mut self,
        scene: &mut Scene,
        assets: &ResourceStore,
        view: &View,
        filter: PassFilter,
        shader_override: Option<ShaderKind>,
        grid: bool,
    ) -> Result<(), RenderError> {
        for id in scene.renderable_objects() {
            let accepted = scene
                .get(id)
                .is_some_and(|o| filter.accepts(o, scene.resolve_material(o.material)));
            if accepted {
                self.draw_object(scene, assets, view, id, shader_override)?;
            }
        }
        if grid {
            self.draw_grid(view)?;
        }
        Ok(())
    }

    fn draw_object(
        &mut self,
        scene: &mut Scene,
        assets: &ResourceStore,
        view: &View,
        id: ObjectId,
        shader_override: Option<ShaderKind>,
    ) -> Result<(), RenderError> {
        scene.update_model_matrix(id)?;
        let scene = &*scene;
        let object = scene.get(id).ok_or(SceneError::ObjectNotFound(id))?;
        let data = object.mesh.data();
        if data.is_empty() {
            return Ok(());
        }
        let material = scene.resolve_material(object.material);
        let mode = object.draw_mode.unwrap_or(material.draw_mode);
        let key = MeshKey::Object(id);

        let Self {
            backend,
            meshes,
            textures,
            material_shaders,
            fixed_shaders,
            empty_texture,
            info,
            ..
        } = self;
        let mesh = meshes.upload(backend, key, object.revision(), data)?;

        let shader = match shader_override {
            Some(kind) => fixed_shaders.get_mut(&kind).ok_or(RenderError::MissingProgram(kind))?,
            None => match material_shaders.entry(material.id()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(ShaderInstance::new(backend, material.shader)?),
            },
        };
        shader.bind(backend);
        shader.set(backend, uniform::PROJECTION_VIEW, UniformValue::Mat4(view.proj_view));
        let fingerprint = object.fingerprint().unwrap_or(Fingerprint(0));
        if shader.cache_mut().model_changed(key, fingerprint) {
            shader.set(backend, uniform::MODEL, UniformValue::Mat4(object.model_matrix()));
        }

        match shader_override {
            None => {
                let mut binding = MaterialBinding {
                    backend: &mut *backend,
                    textures: &mut *textures,
                    assets,
                    empty: *empty_texture,
                };
                binding.apply(shader, material, view)?;
            }
            Some(kind) => {
                shader.set(backend, uniform::ATTRIBUTES, UniformValue::Vec4(material.attributes));
                if kind == ShaderKind::Index {
                    let index = scene.ids().iter().position(|&o| o == id).unwrap_or(0);
                    shader.set(
                        backend,
                        uniform::OBJECT_INDEX,
                        UniformValue::Float(composite::index_value(index)),
                    );
                }
            }
        }

        let instances = match &object.emitter {
            Some(emitter) => {
                let mut particles = emitter.instance_data();
                particles.truncate(MAX_PARTICLE_COUNT);
                if particles.is_empty() {
                    return Ok(());
                }
                backend.update_instances(mesh, &particles)?;
                particles.len() as u32
            }
            None => 1,
        };
        backend.draw(mesh, mode, instances)?;
        info.draw_calls += 1;
        info.vertices += data.vertex_count();
        Ok(())
    }

    fn draw_grid(&mut self, view: &View) -> Result<(), RenderError> {
        let key = MeshKey::Overlay(GRID_OVERLAY);
        let data = self.grid.data();
        let mesh = self.meshes.upload(&mut self.backend, key, 0, data)?;
        let shader = self
            .fixed_shaders
            .get_mut(&ShaderKind::Primitive)
            .ok_or(RenderError::MissingProgram(ShaderKind::Primitive))?;
        let backend = &mut self.backend;
        shader.bind(backend);
        shader.set(backend, uniform::PROJECTION_VIEW, UniformValue::Mat4(view.proj_view));
        if shader.cache_mut().model_changed(key, Fingerprint(0)) {
            shader.set(backend, uniform::MODEL, UniformValue::Mat4(Mat4::IDENTITY));
        }
        shader.set(backend, uniform::DIFFUSE_COLOR, UniformValue::Vec4(Vec4::ONE));
        shader.set(
            backend,
            uniform::ATTRIBUTES,
            UniformValue::Vec4(Material::primitive().attributes),
        );
        backend.draw(mesh, DrawMode::Lines, 1)?;
        self.info.draw_calls += 1;
        self.info.vertices += data.vertex_count();
        Ok(())
    }

    fn draw_screen(&mut self, kind: ShaderKind, selection: f32) -> Result<(), RenderError> {
        let shader = self
            .fixed_shaders
            .get_mut(&kind)
            .ok_or(RenderError::MissingProgram(kind))?;
        let backend = &mut self.backend;
        shader.bind(backend);
        let (width, height) = self.resolution;
        if kind == ShaderKind::Composite {
            for (name, value) in self.composite.uniforms(self.resolution, selection) {
                shader.set(backend, name, value);
            }
        } else {
            shader.set(
                backend,
                uniform::RESOLUTION,
                UniformValue::Vec2(Vec2::new(width as f32, height as f32)),
            );
        }
        backend.draw(self.screen_quad, DrawMode::Triangles, 1)?;
        self.info.draw_calls += 1;
        Ok(())
    }
}

/// Texture and attribute state of one material for one draw.
struct MaterialBinding<'a, B: GpuBackend> {
    backend: &'a mut B,
    textures: &'a mut TextureCache,
    assets: &'a ResourceStore,
    empty: TextureHandle,
}

impl<B: GpuBackend> MaterialBinding<'_, B> {
    fn apply(&mut self, shader: &mut ShaderInstance, material: &Material, view: &View) -> Result<(), RenderError> {
        let slots = [
            (TextureUnit::MESH_TEXTURE, material.textures.texture),
            (TextureUnit::MESH_SPECULAR_MAP, material.textures.specular_map),
            (TextureUnit::MESH_NORMAL_MAP, material.textures.normal_map),
            (TextureUnit::MESH_DISPLACEMENT_MAP, material.textures.displacement_map),
        ];
        for (unit, texture) in slots {
            let handle = match texture {
                Some(id) => self.textures.resolve(&mut *self.backend, self.assets, id)?,
                None => self.empty,
            };
            self.backend.bind_texture(unit, Some(handle));
        }

        let backend = &mut *self.backend;
        if shader.cache_mut().material_changed(material.id(), material.revision()) {
            let flip_y = material
                .textures
                .texture
                .and_then(|id| self.assets.image(id))
                .is_some_and(|image| image.flip_y);
            shader.set(backend, uniform::TEXTURE_FLIP_Y, UniformValue::Bool(flip_y));
            shader.set(backend, uniform::DIFFUSE_COLOR, UniformValue::Vec4(material.diffuse_color));
            shader.set(backend, uniform::ATTRIBUTES, UniformValue::Vec4(material.attributes));
        }

        if let Some(light) = view.light {
            shader.set(backend, uniform::LIGHT_COLOR, UniformValue::Vec3(light.color));
            shader.set(backend, uniform::SHADOW_PROJ, UniformValue::Mat4(light.proj));
            shader.set(backend, uniform::SHADOW_VIEW, UniformValue::Mat4(light.view));
        }
        shader.set(backend, uniform::SHADOW_MAP, UniformValue::Bool(view.light.is_some()));
        shader.set(backend, uniform::VIEW_POSITION, UniformValue::Vec3(view.eye));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::recording::{Command, RecordingBackend};
    use viewport_assets::TextureId;
    use viewport_scene::{CameraState, ObjectArgs, PropRegistry, SceneObject};

    struct Fixture {
        scene: Scene,
        camera: ObjectId,
        cube: ObjectId,
    }

    fn fixture() -> Fixture {
        let registry = PropRegistry::with_builtins();
        let mut scene = Scene::new();
        let camera = scene.add(SceneObject::camera(CameraState::perspective(90.0)));
        let cube = scene
            .spawn(&registry, "geometry_cube", &ObjectArgs::new().position(Vec3::new(0.0, 0.0, -4.0)))
            .unwrap();
        Fixture { scene, camera, cube }
    }

    fn renderer(config: RenderConfig) -> Renderer<RecordingBackend> {
        Renderer::new(RecordingBackend::new(), config, 320, 240).unwrap()
    }

    fn uniform_uploads(backend: &RecordingBackend, name: &str) -> usize {
        backend
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::SetUniform { name: n, .. } if n == name))
            .count()
    }

    #[test]
    fn vertex_buffers_are_reused_across_frames() {
        let mut f = fixture();
        let mut renderer = renderer(RenderConfig::default());
        let assets = ResourceStore::new();

        renderer.draw(&mut f.scene, &assets, None).unwrap();
        let handle = renderer.mesh_handle(f.cube);
        let created = renderer.backend().created().meshes;
        renderer.draw(&mut f.scene, &assets, None).unwrap();

        assert!(handle.is_some());
        assert_eq!(renderer.mesh_handle(f.cube), handle);
        assert_eq!(renderer.backend().created().meshes, created);
    }

    #[test]
    fn scene_change_clears_caches() {
        let mut first = fixture();
        let mut second = fixture();
        let mut renderer = renderer(RenderConfig::default());
        let assets = ResourceStore::new();

        renderer.draw(&mut first.scene, &assets, None).unwrap();
        let old = renderer.mesh_handle(first.cube).unwrap();
        let programs = renderer.backend().created().programs;

        renderer.draw(&mut second.scene, &assets, None).unwrap();
        assert!(renderer.backend().commands().contains(&Command::ReleaseMesh(old)));
        assert_ne!(renderer.mesh_handle(second.cube), Some(old));
        // the default material of the new scene gets a fresh program
        assert!(renderer.backend().created().programs > programs);
    }

    #[test]
    fn unchanged_frame_skips_model_uploads() {
        let mut f = fixture();
        let mut renderer = renderer(RenderConfig::default());
        let assets = ResourceStore::new();

        renderer.draw(&mut f.scene, &assets, Some(f.camera)).unwrap();
        assert!(uniform_uploads(renderer.backend(), uniform::MODEL) > 0);

        renderer.backend_mut().clear_commands();
        renderer.draw(&mut f.scene, &assets, Some(f.camera)).unwrap();
        assert_eq!(uniform_uploads(renderer.backend(), uniform::MODEL), 0);
        assert_eq!(uniform_uploads(renderer.backend(), uniform::PROJECTION_VIEW), 0);

        f.scene.get_mut(f.cube).unwrap().transform.position.x = 2.0;
        renderer.backend_mut().clear_commands();
        renderer.draw(&mut f.scene, &assets, Some(f.camera)).unwrap();
        assert!(uniform_uploads(renderer.backend(), uniform::MODEL) > 0);
    }

    #[test]
    fn missing_texture_binds_placeholder() {
        let mut f = fixture();
        let mut material = Material::default();
        material.textures.texture = Some(TextureId(0xdead));
        let id = f.scene.add_material(material);
        f.scene.get_mut(f.cube).unwrap().material = viewport_scene::MaterialRef::Custom(id);

        let mut renderer = renderer(RenderConfig::default());
        renderer.draw(&mut f.scene, &ResourceStore::new(), None).unwrap();
        let expected = Command::BindTexture {
            unit: TextureUnit::MESH_TEXTURE,
            texture: Some(renderer.placeholder_texture()),
        };
        assert!(renderer.backend().commands().contains(&expected));
    }

    #[test]
    fn stored_texture_is_uploaded_once() {
        let mut f = fixture();
        let mut assets = ResourceStore::new();
        let brick = assets.register_image("brick", Image::new(2, 1, vec![255; 8]).unwrap());
        let mut material = Material::default();
        material.textures.texture = Some(brick);
        let id = f.scene.add_material(material);
        f.scene.get_mut(f.cube).unwrap().material = viewport_scene::MaterialRef::Custom(id);

        let mut renderer = renderer(RenderConfig::default());
        let before = renderer.backend().created().textures;
        renderer.draw(&mut f.scene, &assets, None).unwrap();
        renderer.draw(&mut f.scene, &assets, None).unwrap();
        assert_eq!(renderer.backend().created().textures, before + 1);
    }

    #[test]
    fn post_process_frame_structure() {
        let mut f = fixture();
        let mut renderer = renderer(RenderConfig::default());
        let info = renderer.draw(&mut f.scene, &ResourceStore::new(), None).unwrap().clone();
        assert_eq!(info.passes, 5);
        assert_eq!(renderer.pass_names(), ["shadow", "color", "guides", "index", "lighting"]);

        let commands = renderer.backend().commands();
        let begins = commands.iter().filter(|c| matches!(c, Command::BeginPass { .. })).count();
        assert_eq!(begins, 6);
        assert!(matches!(
            commands.iter().rev().find(|c| matches!(c, Command::BeginPass { .. })),
            Some(Command::BeginPass {
                target: RenderTarget::Surface,
                ..
            })
        ));
        assert_eq!(commands.last(), Some(&Command::EndFrame));
        // shadow, color, grid, lighting quad, composite quad
        assert_eq!(info.draw_calls, 5);
    }

    #[test]
    fn direct_rendering_draws_scene_on_surface() {
        let mut f = fixture();
        let config = RenderConfig {
            post_process: false,
            show_grid: false,
            ..RenderConfig::default()
        };
        let mut renderer = renderer(config);
        let info = renderer.draw(&mut f.scene, &ResourceStore::new(), None).unwrap().clone();
        assert_eq!(info.passes, 1);
        // shadow caster plus the cube on the surface
        assert_eq!(info.draw_calls, 2);
    }

    #[test]
    fn shadow_map_is_bound_after_shadow_pass() {
        let mut f = fixture();
        let mut renderer = renderer(RenderConfig::default());
        renderer.draw(&mut f.scene, &ResourceStore::new(), None).unwrap();
        let bound = renderer.backend().commands().iter().any(|c| {
            matches!(c, Command::BindTexture { unit, texture: Some(_) } if *unit == TextureUnit::SHADOW_MAP)
        });
        assert!(bound);
    }

    #[test]
    fn emitter_draws_instanced() {
        let registry = PropRegistry::with_builtins();
        let mut scene = Scene::new();
        scene.add(SceneObject::camera(CameraState::perspective(90.0)));
        let id = scene
            .spawn(&registry, "entity_emitter", &ObjectArgs::new().seed(3))
            .unwrap();
        let emitter = scene.get_mut(id).and_then(|o| o.emitter.as_mut()).unwrap();
        emitter.update(Vec3::ZERO, Duration::ZERO);
        assert!(emitter.len() > 1);

        let mut renderer = renderer(RenderConfig {
            post_process: false,
            ..RenderConfig::default()
        });
        renderer.draw(&mut scene, &ResourceStore::new(), None).unwrap();
        let instanced = renderer.backend().commands().iter().any(|c| {
            matches!(c, Command::Draw { instances, .. } if *instances > 1)
        });
        assert!(instanced);
        assert!(renderer
            .backend()
            .commands()
            .iter()
            .any(|c| matches!(c, Command::UpdateInstances { count, .. } if *count <= MAX_PARTICLE_COUNT)));
    }

    #[test]
    fn removed_objects_lose_their_buffers() {
        let mut f = fixture();
        let mut renderer = renderer(RenderConfig::default());
        let assets = ResourceStore::new();
        renderer.draw(&mut f.scene, &assets, None).unwrap();
        let handle = renderer.mesh_handle(f.cube).unwrap();

        f.scene.remove(f.cube).unwrap();
        renderer.draw(&mut f.scene, &assets, None).unwrap();
        assert!(renderer.mesh_handle(f.cube).is_none());
        assert!(renderer.backend().commands().contains(&Command::ReleaseMesh(handle)));
    }

    #[test]
    fn resize_is_debounced_and_coalesced() {
        let mut renderer = renderer(RenderConfig::default());
        let start = Instant::now();
        renderer.set_resolution(320, 240, start);
        assert!(!renderer.poll_resize(start + Duration::from_secs(1)).unwrap());

        renderer.set_resolution(800, 600, start);
        renderer.set_resolution(1024, 768, start + Duration::from_millis(4));
        assert_eq!(renderer.resolution(), (1024, 768));
        assert!(!renderer.poll_resize(start + Duration::from_millis(5)).unwrap());
        assert!(renderer.poll_resize(start + Duration::from_millis(10)).unwrap());

        let resizes: Vec<&Command> = renderer
            .backend()
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::ResizeTarget { .. }))
            .collect();
        // four viewport-relative passes, shadow map stays fixed
        assert_eq!(resizes.len(), 4);
        assert!(resizes.iter().all(|c| matches!(c, Command::ResizeTarget { width: 1024, height: 768, .. })));
        assert!(!renderer.poll_resize(start + Duration::from_millis(20)).unwrap());
    }

    #[test]
    fn perspective_camera_follows_resolution() {
        let mut f = fixture();
        let mut renderer = renderer(RenderConfig::default());
        renderer.draw(&mut f.scene, &ResourceStore::new(), Some(f.camera)).unwrap();
        let sensor = f.scene.get(f.camera).and_then(|o| o.camera.as_ref()).map(|c| c.sensor);
        assert_eq!(sensor, Some(Vec2::new(320.0, 240.0)));
    }

    #[test]
    fn drawing_without_camera_still_presents() {
        let mut scene = Scene::new();
        let mut renderer = renderer(RenderConfig::default());
        let info = renderer.draw(&mut scene, &ResourceStore::new(), None).unwrap();
        // the light still drives the shadow pass; nothing else is drawn
        assert_eq!(info.passes, 5);
        assert_eq!(renderer.backend().frames(), 1);
    }
}
