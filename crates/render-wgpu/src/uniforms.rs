use viewport_render::{UniformValue, uniform};

/// Floats in the WGSL `Uniforms` struct.
pub const BLOCK_FLOATS: usize = 100;
/// Bytes in the WGSL `Uniforms` struct.
pub const BLOCK_SIZE: u64 = (BLOCK_FLOATS * 4) as u64;

/// Offset (in floats) and width of each named uniform in the block.
fn slot(name: &str) -> Option<(usize, usize)> {
    Some(match name {
        uniform::PROJECTION_VIEW => (0, 16),
        uniform::MODEL => (16, 16),
        uniform::SHADOW_PROJ => (32, 16),
        uniform::SHADOW_VIEW => (48, 16),
        uniform::DIFFUSE_COLOR => (64, 4),
        uniform::ATTRIBUTES => (68, 4),
        uniform::SHADOW_COLOR => (72, 4),
        uniform::LIGHT_COLOR => (76, 3),
        uniform::TEXTURE_FLIP_Y => (79, 1),
        uniform::VIEW_POSITION => (80, 3),
        uniform::SHADOW_MAP => (83, 1),
        uniform::OUTLINE_COLOR => (84, 3),
        uniform::OBJECT_INDEX => (87, 1),
        uniform::RESOLUTION => (88, 2),
        uniform::SELECTION => (90, 1),
        uniform::GAMMA => (91, 1),
        uniform::EXPOSURE => (92, 1),
        uniform::BLOOM => (93, 1),
        uniform::OUTLINE_WIDTH => (94, 1),
        uniform::FOG_MAX => (95, 1),
        uniform::FOG_DENSITY => (96, 1),
        uniform::FOG_START_OFFSET => (97, 1),
        _ => return None,
    })
}

/// CPU copy of one program's uniform block, laid out like the WGSL struct.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    data: [f32; BLOCK_FLOATS],
}

impl Default for UniformBlock {
    fn default() -> Self {
        let mut block = Self { data: [0.0; BLOCK_FLOATS] };
        for name in [uniform::PROJECTION_VIEW, uniform::MODEL, uniform::SHADOW_PROJ, uniform::SHADOW_VIEW] {
            block.set(name, UniformValue::Mat4(glam::Mat4::IDENTITY));
        }
        block
    }
}

impl UniformBlock {
    /// Write a value. Returns false for names the block does not carry or
    /// values wider than the slot.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        let Some((offset, width)) = slot(name) else {
            return false;
        };
        let mut scratch = [0.0f32; 16];
        let values: &[f32] = match value {
            UniformValue::Bool(b) => {
                scratch[0] = if b { 1.0 } else { 0.0 };
                &scratch[..1]
            }
            UniformValue::Float(f) => {
                scratch[0] = f;
                &scratch[..1]
            }
            UniformValue::Vec2(v) => {
                scratch[..2].copy_from_slice(&v.to_array());
                &scratch[..2]
            }
            UniformValue::Vec3(v) => {
                scratch[..3].copy_from_slice(&v.to_array());
                &scratch[..3]
            }
            UniformValue::Vec4(v) => {
                scratch[..4].copy_from_slice(&v.to_array());
                &scratch[..4]
            }
            UniformValue::Mat4(m) => {
                scratch.copy_from_slice(&m.to_cols_array());
                &scratch[..]
            }
        };
        if values.len() > width {
            return false;
        }
        self.data[offset..offset + values.len()].copy_from_slice(values);
        true
    }

    pub fn get(&self, name: &str) -> Option<&[f32]> {
        slot(name).map(|(offset, width)| &self.data[offset..offset + width])
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// Round `size` up to a multiple of `alignment`.
pub fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment.max(1)) * alignment.max(1)
}
