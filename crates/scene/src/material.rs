use glam::Vec4;
use viewport_assets::TextureId;
use viewport_common::MaterialId;

/// GPU program family used to draw an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderKind {
    /// Lit, textured, shadow-receiving surface shader.
    Default,
    /// Unlit vertex-colored lines for guides, grids and debug boxes.
    Primitive,
    /// Depth-only program forced on the shadow pass.
    Depth,
    /// Writes each object's index for selection outlines.
    Index,
    /// Emits only bright fragments as the bloom source.
    Light,
    /// Fullscreen post-process blend.
    Composite,
}

impl ShaderKind {
    pub fn label(self) -> &'static str {
        match self {
            ShaderKind::Default => "default",
            ShaderKind::Primitive => "primitive",
            ShaderKind::Depth => "depth",
            ShaderKind::Index => "index",
            ShaderKind::Light => "light",
            ShaderKind::Composite => "composite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    #[default]
    Triangles,
    TriangleStrip,
    Lines,
    LineStrip,
    Points,
}

/// Texture references of a material. Empty slots sample the placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureSlots {
    pub texture: Option<TextureId>,
    pub specular_map: Option<TextureId>,
    pub normal_map: Option<TextureId>,
    pub displacement_map: Option<TextureId>,
}

/// Plain surface attributes. Shaders read them; they never hold GPU state.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    id: MaterialId,
    pub name: String,
    pub shader: ShaderKind,
    pub draw_mode: DrawMode,
    pub textures: TextureSlots,
    pub diffuse_color: Vec4,
    /// `[specular, roughness, uniform scale, transparency]`
    pub attributes: Vec4,
    pub cast_shadows: bool,
    revision: u64,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", ShaderKind::Default)
    }
}

impl Material {
    pub fn new(name: impl Into<String>, shader: ShaderKind) -> Self {
        Self {
            id: MaterialId::new(),
            name: name.into(),
            shader,
            draw_mode: DrawMode::Triangles,
            textures: TextureSlots::default(),
            diffuse_color: Vec4::new(1.0, 0.0, 1.0, 1.0),
            attributes: Vec4::new(0.25, 0.33, 0.0, 1.0),
            cast_shadows: true,
            revision: 0,
        }
    }

    /// Unlit line material for guides.
    pub fn primitive() -> Self {
        let mut material = Self::new("primitive", ShaderKind::Primitive);
        material.draw_mode = DrawMode::Lines;
        material.diffuse_color = Vec4::ONE;
        material.cast_shadows = false;
        material
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Bumped by [`Material::update`]; shaders re-push attributes when it
    /// differs from what they last saw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mark attributes as edited.
    pub fn update(&mut self) {
        self.revision += 1;
    }

    pub fn specular(&self) -> f32 {
        self.attributes.x
    }

    pub fn roughness(&self) -> f32 {
        self.attributes.y
    }

    pub fn transparency(&self) -> f32 {
        self.attributes.w
    }
}

/// How an object names its material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialRef {
    /// The scene's built-in lit material.
    Default,
    /// The scene's built-in line material.
    Primitive,
    Custom(MaterialId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_surface_conventions() {
        let m = Material::default();
        assert_eq!(m.diffuse_color, Vec4::new(1.0, 0.0, 1.0, 1.0));
        assert_eq!(m.specular(), 0.25);
        assert_eq!(m.roughness(), 0.33);
        assert_eq!(m.transparency(), 1.0);
        assert!(m.cast_shadows);
        assert_eq!(m.shader, ShaderKind::Default);
    }

    #[test]
    fn update_bumps_revision_keeps_id() {
        let mut m = Material::primitive();
        let id = m.id();
        m.update();
        m.update();
        assert_eq!(m.revision(), 2);
        assert_eq!(m.id(), id);
        assert!(!m.cast_shadows);
        assert_eq!(m.draw_mode, DrawMode::Lines);
    }
}
