use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AssetError;

/// Content-addressed texture identity computed from the pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Wrap {
    #[default]
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Filter {
    #[default]
    Linear,
    Nearest,
}

/// Sampler settings carried with an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Sampling {
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
    pub mag_filter: Filter,
    pub min_filter: Filter,
}

/// A decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    #[serde(default = "default_flip_y")]
    pub flip_y: bool,
    #[serde(default)]
    pub sampling: Sampling,
}

fn default_flip_y() -> bool {
    true
}

impl Image {
    /// Wrap RGBA8 pixels, checking that the buffer matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, AssetError> {
        let image = Self {
            width,
            height,
            pixels,
            flip_y: true,
            sampling: Sampling::default(),
        };
        image.validate()?;
        Ok(image)
    }

    pub fn validate(&self) -> Result<(), AssetError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.width == 0 || self.height == 0 || self.pixels.len() != expected {
            return Err(AssetError::ImageSize {
                width: self.width,
                height: self.height,
                len: self.pixels.len(),
            });
        }
        Ok(())
    }

    /// 1x1 fully transparent image bound wherever a texture slot is empty.
    pub fn empty() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 0],
            flip_y: false,
            sampling: Sampling::default(),
        }
    }

    /// Small opaque checkerboard used to make missing textures visible.
    pub fn placeholder() -> Self {
        const SIZE: u32 = 8;
        let mut pixels = Vec::with_capacity((SIZE * SIZE * 4) as usize);
        for y in 0..SIZE {
            for x in 0..SIZE {
                let shade = if (x + y) % 2 == 0 { 0x60 } else { 0x90 };
                pixels.extend_from_slice(&[shade, shade, shade, 0xff]);
            }
        }
        Self {
            width: SIZE,
            height: SIZE,
            pixels,
            flip_y: false,
            sampling: Sampling {
                mag_filter: Filter::Nearest,
                min_filter: Filter::Nearest,
                ..Sampling::default()
            },
        }
    }

    /// Content hash of dimensions and pixel data.
    pub fn content_id(&self) -> TextureId {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(&self.pixels);
        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        TextureId(u64::from_le_bytes(bytes))
    }
}
