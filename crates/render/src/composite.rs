use glam::{Vec2, Vec3, Vec4};

use crate::backend::{UniformValue, uniform};
use crate::config::RenderConfig;
use crate::vertex::Vertex;

/// Parameters of the fullscreen composite: bloom, tone mapping, selection
/// outline and guide fog.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeParams {
    pub gamma: f32,
    pub exposure: f32,
    /// Weight of the blurred lighting buffer.
    pub bloom: f32,
    pub outline_color: Vec3,
    /// Outline offset in pixels at a horizontal resolution of one.
    pub outline_scale: f32,
    pub fog_max: f32,
    pub fog_density: f32,
    pub fog_start_offset: f32,
    pub shadow_color: Vec4,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl CompositeParams {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            gamma: 0.65,
            exposure: 2.2,
            bloom: 0.2,
            outline_color: Vec3::new(1.0, 1.0, 0.1),
            outline_scale: 0.25,
            fog_max: config.fog_max,
            fog_density: config.fog_density,
            fog_start_offset: config.fog_start_offset,
            shadow_color: Vec4::from_array(config.shadow_color),
        }
    }

    /// Texel offset used to find selection edges.
    pub fn outline_width(&self, resolution_x: u32) -> f32 {
        self.outline_scale / resolution_x.max(1) as f32
    }

    pub fn uniforms(&self, resolution: (u32, u32), selection: f32) -> [(&'static str, UniformValue); 11] {
        [
            (
                uniform::RESOLUTION,
                UniformValue::Vec2(Vec2::new(resolution.0 as f32, resolution.1 as f32)),
            ),
            (uniform::SELECTION, UniformValue::Float(selection)),
            (uniform::GAMMA, UniformValue::Float(self.gamma)),
            (uniform::EXPOSURE, UniformValue::Float(self.exposure)),
            (uniform::BLOOM, UniformValue::Float(self.bloom)),
            (uniform::OUTLINE_COLOR, UniformValue::Vec3(self.outline_color)),
            (uniform::OUTLINE_WIDTH, UniformValue::Float(self.outline_width(resolution.0))),
            (uniform::FOG_MAX, UniformValue::Float(self.fog_max)),
            (uniform::FOG_DENSITY, UniformValue::Float(self.fog_density)),
            (uniform::FOG_START_OFFSET, UniformValue::Float(self.fog_start_offset)),
            (uniform::SHADOW_COLOR, UniformValue::Vec4(self.shadow_color)),
        ]
    }
}

/// Value written to the index buffer for the object at `index` in scene
/// order. Zero is reserved for "nothing".
pub fn index_value(index: usize) -> f32 {
    ((index % 255) + 1) as f32 / 255.0
}

/// Two triangles covering clip space. Texture coordinates have their origin
/// at the top left.
pub fn screen_quad() -> Vec<Vertex> {
    [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0]]
        .into_iter()
        .map(|[x, y]: [f32; 2]| Vertex {
            position: [x, y, 0.0],
            uv: [x * 0.5 + 0.5, 0.5 - y * 0.5],
            normal: [0.0, 0.0, 1.0],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = CompositeParams::default();
        assert_eq!(params.gamma, 0.65);
        assert_eq!(params.exposure, 2.2);
        assert_eq!(params.bloom, 0.2);
        assert_eq!(params.outline_color, Vec3::new(1.0, 1.0, 0.1));
        assert_eq!(params.fog_max, 0.15);
        assert_eq!(params.shadow_color.w, 0.33);
    }

    #[test]
    fn outline_scales_with_resolution() {
        let params = CompositeParams::default();
        assert_eq!(params.outline_width(1000), 0.00025);
        assert_eq!(params.outline_width(0), 0.25);
    }

    #[test]
    fn index_values_skip_zero() {
        assert_eq!(index_value(0), 1.0 / 255.0);
        assert_eq!(index_value(254), 1.0);
        assert_eq!(index_value(255), index_value(0));
    }

    #[test]
    fn quad_corners() {
        let quad = screen_quad();
        assert_eq!(quad.len(), 6);
        assert_eq!(quad[0].uv, [0.0, 1.0]);
        assert_eq!(quad[2].uv, [1.0, 0.0]);
    }
}
