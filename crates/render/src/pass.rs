use viewport_scene::{Material, SceneObject, ShaderKind};

use crate::backend::{Clear, GpuBackend, PassState, TargetDesc, TargetHandle, TextureUnit};
use crate::config::RenderConfig;
use crate::error::RenderError;

/// Where a scene pass takes its camera from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSource {
    /// The scene's light source.
    Light,
    /// The camera passed to `draw`, else the scene's first camera.
    Caller,
}

/// Which renderable objects a scene pass draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassFilter {
    All,
    NonGuides,
    Guides,
    Selectable,
    /// Non-guides whose material casts shadows.
    ShadowCasters,
}

impl PassFilter {
    pub fn accepts(self, object: &SceneObject, material: &Material) -> bool {
        match self {
            PassFilter::All => true,
            PassFilter::NonGuides => !object.guide,
            PassFilter::Guides => object.guide,
            PassFilter::Selectable => object.selectable,
            PassFilter::ShadowCasters => !object.guide && material.cast_shadows,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassContent {
    /// Draw scene objects.
    Scene {
        filter: PassFilter,
        /// Program forced on every object instead of its material's.
        shader_override: Option<ShaderKind>,
        grid: bool,
    },
    /// Draw one fullscreen quad with the given program.
    Screen(ShaderKind),
}

/// Static description of a pass, built like a pipeline config.
#[derive(Debug, Clone, PartialEq)]
pub struct PassDesc {
    pub name: &'static str,
    /// Fixed size; `None` follows the render resolution.
    pub resolution: Option<(u32, u32)>,
    pub camera: CameraSource,
    pub content: PassContent,
    pub state: PassState,
    pub clear: Clear,
    pub color: bool,
    pub depth: bool,
    pub antialiasing: bool,
    /// Unit the color attachment is bound to after the pass.
    pub color_unit: Option<TextureUnit>,
    /// Unit the depth attachment is bound to after the pass.
    pub depth_unit: Option<TextureUnit>,
}

impl PassDesc {
    pub fn scene(name: &'static str, filter: PassFilter) -> Self {
        Self {
            name,
            resolution: None,
            camera: CameraSource::Caller,
            content: PassContent::Scene {
                filter,
                shader_override: None,
                grid: false,
            },
            state: PassState::default(),
            clear: Clear::all([0.0; 4]),
            color: true,
            depth: true,
            antialiasing: false,
            color_unit: None,
            depth_unit: None,
        }
    }

    pub fn screen(name: &'static str, shader: ShaderKind) -> Self {
        Self {
            content: PassContent::Screen(shader),
            state: PassState {
                depth_test: false,
                cull_face: false,
                blend: false,
            },
            depth: false,
            ..Self::scene(name, PassFilter::All)
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Some((width, height));
        self
    }

    pub fn with_camera(mut self, camera: CameraSource) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_shader_override(mut self, shader: ShaderKind) -> Self {
        if let PassContent::Scene { shader_override, .. } = &mut self.content {
            *shader_override = Some(shader);
        }
        self
    }

    pub fn with_grid(mut self, enabled: bool) -> Self {
        if let PassContent::Scene { grid, .. } = &mut self.content {
            *grid = enabled;
        }
        self
    }

    pub fn with_state(mut self, state: PassState) -> Self {
        self.state = state;
        self
    }

    pub fn with_clear(mut self, clear: Clear) -> Self {
        self.clear = clear;
        self
    }

    pub fn depth_only(mut self) -> Self {
        self.color = false;
        self.clear = Clear::depth_only();
        self
    }

    pub fn with_antialiasing(mut self, enabled: bool) -> Self {
        self.antialiasing = enabled;
        self
    }

    pub fn outputs(mut self, color: Option<TextureUnit>, depth: Option<TextureUnit>) -> Self {
        self.color_unit = color;
        self.depth_unit = depth;
        self
    }

    pub fn is_viewport_relative(&self) -> bool {
        self.resolution.is_none()
    }
}

/// Passes for a configuration, in execution order. With post-processing
/// off only the shadow pass renders offscreen.
pub fn standard_passes(config: &RenderConfig) -> Vec<PassDesc> {
    let mut passes = Vec::new();
    if config.shadows_enabled() {
        let size = config.shadow_map_size;
        passes.push(
            PassDesc::scene("shadow", PassFilter::ShadowCasters)
                .with_resolution(size, size)
                .with_camera(CameraSource::Light)
                .with_shader_override(ShaderKind::Depth)
                .with_state(PassState {
                    depth_test: true,
                    cull_face: false,
                    blend: false,
                })
                .depth_only()
                .outputs(None, Some(TextureUnit::SHADOW_MAP)),
        );
    }
    if !config.post_process {
        return passes;
    }
    passes.push(
        PassDesc::scene("color", PassFilter::NonGuides)
            .with_clear(Clear::all(config.background))
            .with_antialiasing(config.antialiasing)
            .outputs(Some(TextureUnit::FRAME_COLOR), Some(TextureUnit::FRAME_COLOR_DEPTH)),
    );
    passes.push(
        PassDesc::scene("guides", PassFilter::Guides)
            .with_grid(config.show_grid)
            .with_antialiasing(config.antialiasing)
            .outputs(Some(TextureUnit::FRAME_GUIDES), Some(TextureUnit::FRAME_GUIDES_DEPTH)),
    );
    passes.push(
        PassDesc::scene("index", PassFilter::Selectable)
            .with_shader_override(ShaderKind::Index)
            .with_state(PassState {
                blend: false,
                ..PassState::default()
            })
            .outputs(Some(TextureUnit::FRAME_INDEX), None),
    );
    passes.push(PassDesc::screen("lighting", ShaderKind::Light).outputs(Some(TextureUnit::FRAME_LIGHTING), None));
    passes
}

/// A pass bound to its offscreen target.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPass {
    pub desc: PassDesc,
    pub target: TargetHandle,
    pub size: (u32, u32),
}

impl RenderPass {
    pub fn create<B: GpuBackend>(backend: &mut B, desc: PassDesc, viewport: (u32, u32)) -> Result<Self, RenderError> {
        let size = desc.resolution.unwrap_or(viewport);
        let target = backend.create_target(&TargetDesc {
            label: desc.name.to_string(),
            width: size.0,
            height: size.1,
            color: desc.color,
            depth: desc.depth,
            antialiasing: desc.antialiasing,
        })?;
        tracing::debug!(pass = desc.name, width = size.0, height = size.1, "created render pass");
        Ok(Self { desc, target, size })
    }

    pub fn name(&self) -> &'static str {
        self.desc.name
    }

    /// Follow a new viewport size. Fixed-size passes ignore it. Returns
    /// whether the target was reallocated.
    pub fn resize<B: GpuBackend>(&mut self, backend: &mut B, viewport: (u32, u32)) -> Result<bool, RenderError> {
        if !self.desc.is_viewport_relative() || self.size == viewport {
            return Ok(false);
        }
        backend.resize_target(self.target, viewport.0, viewport.1)?;
        self.size = viewport;
        Ok(true)
    }

    /// Units this pass writes to.
    pub fn outputs(&self) -> impl Iterator<Item = TextureUnit> {
        self.desc.color_unit.into_iter().chain(self.desc.depth_unit)
    }
}
