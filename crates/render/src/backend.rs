use glam::{Mat4, Vec2, Vec3, Vec4};
use viewport_assets::Image;
use viewport_scene::{DrawMode, ShaderKind};

use crate::error::RenderError;
use crate::vertex::{Instance, Vertex};

macro_rules! handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

handle!(TextureHandle);
handle!(TargetHandle);
handle!(ProgramHandle);
handle!(MeshHandle);

/// Fixed texture unit a sampler reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureUnit(pub u32);

impl TextureUnit {
    pub const EMPTY: Self = Self(0);
    pub const FRAME_COLOR: Self = Self(1);
    pub const FRAME_COLOR_DEPTH: Self = Self(2);
    pub const FRAME_GUIDES: Self = Self(3);
    pub const FRAME_GUIDES_DEPTH: Self = Self(4);
    pub const FRAME_NORMAL: Self = Self(5);
    pub const FRAME_WORLD: Self = Self(6);
    pub const FRAME_INDEX: Self = Self(7);
    pub const SHADOW_MAP: Self = Self(8);
    pub const MESH_TEXTURE: Self = Self(9);
    pub const MESH_SPECULAR_MAP: Self = Self(10);
    pub const MESH_DISPLACEMENT_MAP: Self = Self(11);
    pub const MESH_NORMAL_MAP: Self = Self(12);
    pub const PLACEHOLDER: Self = Self(13);
    pub const FRAME_LIGHTING: Self = Self(14);

    pub const COUNT: u32 = 15;

    /// Units that hold depth attachments rather than colors.
    pub fn is_depth(self) -> bool {
        matches!(self, Self::FRAME_COLOR_DEPTH | Self::FRAME_GUIDES_DEPTH | Self::SHADOW_MAP)
    }
}

/// Uniform names shared by the pipeline and every backend.
pub mod uniform {
    pub const PROJECTION_VIEW: &str = "scene.projection_view";
    pub const MODEL: &str = "scene.model";
    pub const DIFFUSE_COLOR: &str = "material.diffuse_color";
    pub const ATTRIBUTES: &str = "material.attributes";
    pub const TEXTURE_FLIP_Y: &str = "texture_flip_y";
    pub const LIGHT_COLOR: &str = "light_color";
    pub const SHADOW_PROJ: &str = "shadow_proj";
    pub const SHADOW_VIEW: &str = "shadow_view";
    pub const SHADOW_MAP: &str = "shadow_map";
    pub const VIEW_POSITION: &str = "view_position";
    pub const OBJECT_INDEX: &str = "object_index";
    pub const RESOLUTION: &str = "resolution";
    pub const SELECTION: &str = "selection";
    pub const GAMMA: &str = "gamma";
    pub const EXPOSURE: &str = "exposure";
    pub const BLOOM: &str = "bloom";
    pub const OUTLINE_COLOR: &str = "outline_color";
    pub const OUTLINE_WIDTH: &str = "outline_width";
    pub const FOG_MAX: &str = "fog_max";
    pub const FOG_DENSITY: &str = "fog_density";
    pub const FOG_START_OFFSET: &str = "fog_start_offset";
    pub const SHADOW_COLOR: &str = "shadow_color";
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    /// Exact comparison of every component's bit pattern.
    pub fn bit_eq(&self, other: &Self) -> bool {
        fn same(a: &[f32], b: &[f32]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
        }
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Vec2(a), Self::Vec2(b)) => same(&a.to_array(), &b.to_array()),
            (Self::Vec3(a), Self::Vec3(b)) => same(&a.to_array(), &b.to_array()),
            (Self::Vec4(a), Self::Vec4(b)) => same(&a.to_array(), &b.to_array()),
            (Self::Mat4(a), Self::Mat4(b)) => same(&a.to_cols_array(), &b.to_cols_array()),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    Color,
    Depth,
}

/// Offscreen framebuffer description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub color: bool,
    pub depth: bool,
    pub antialiasing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The visible surface.
    Surface,
    Offscreen(TargetHandle),
}

/// Fixed GPU state for the duration of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassState {
    pub depth_test: bool,
    pub cull_face: bool,
    pub blend: bool,
}

impl Default for PassState {
    fn default() -> Self {
        Self {
            depth_test: true,
            cull_face: true,
            blend: true,
        }
    }
}

/// What to clear when a pass begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clear {
    pub color: Option<[f32; 4]>,
    pub depth: bool,
}

impl Clear {
    pub fn all(color: [f32; 4]) -> Self {
        Self {
            color: Some(color),
            depth: true,
        }
    }

    pub fn depth_only() -> Self {
        Self { color: None, depth: true }
    }
}

/// GPU command surface the pipeline drives.
///
/// Calls arrive from a single thread in frame order:
/// `begin_pass`, any number of program, uniform, texture and draw calls,
/// `end_pass`, repeated per pass, then `end_frame`. Uniforms and texture
/// bindings persist until overwritten, like GL program state.
pub trait GpuBackend {
    fn create_texture(&mut self, image: &Image) -> Result<TextureHandle, RenderError>;

    fn release_texture(&mut self, texture: TextureHandle);

    fn create_target(&mut self, desc: &TargetDesc) -> Result<TargetHandle, RenderError>;

    /// Reallocate a target's attachments. Their texture handles stay valid.
    fn resize_target(&mut self, target: TargetHandle, width: u32, height: u32) -> Result<(), RenderError>;

    fn target_texture(&self, target: TargetHandle, attachment: Attachment) -> Option<TextureHandle>;

    fn create_program(&mut self, kind: ShaderKind) -> Result<ProgramHandle, RenderError>;

    fn release_program(&mut self, program: ProgramHandle);

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u16]) -> Result<MeshHandle, RenderError>;

    fn release_mesh(&mut self, mesh: MeshHandle);

    /// Replace the per-instance data of a mesh.
    fn update_instances(&mut self, mesh: MeshHandle, instances: &[Instance]) -> Result<(), RenderError>;

    fn begin_pass(
        &mut self,
        target: RenderTarget,
        viewport: (u32, u32),
        state: PassState,
        clear: Clear,
    ) -> Result<(), RenderError>;

    fn use_program(&mut self, program: ProgramHandle);

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue);

    /// Bind a texture to a unit; `None` binds the backend's empty texture.
    fn bind_texture(&mut self, unit: TextureUnit, texture: Option<TextureHandle>);

    /// Draw with the current program, indexed when the mesh has indices.
    fn draw(&mut self, mesh: MeshHandle, mode: DrawMode, instances: u32) -> Result<(), RenderError>;

    fn end_pass(&mut self) -> Result<(), RenderError>;

    /// Submit the frame and present the surface.
    fn end_frame(&mut self) -> Result<(), RenderError>;
}
