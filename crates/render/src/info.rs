use std::fmt;
use std::time::Duration;

/// Diagnostics gathered while drawing one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderInfo {
    pub resolution: (u32, u32),
    pub passes: usize,
    pub draw_calls: usize,
    pub vertices: usize,
    /// Live shader instances.
    pub shaders: usize,
    pub textures: usize,
    /// Cached vertex buffers.
    pub buffers: usize,
    pub frame_time: Duration,
}

impl fmt::Display for RenderInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} passes={} draws={} verts={} shaders={} textures={} buffers={} frame={:.2}ms",
            self.resolution.0,
            self.resolution.1,
            self.passes,
            self.draw_calls,
            self.vertices,
            self.shaders,
            self.textures,
            self.buffers,
            self.frame_time.as_secs_f64() * 1000.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_summary() {
        let info = RenderInfo {
            resolution: (1280, 720),
            passes: 5,
            draw_calls: 12,
            frame_time: Duration::from_micros(1500),
            ..RenderInfo::default()
        };
        let text = info.to_string();
        assert!(text.starts_with("1280x720 passes=5 draws=12"));
        assert!(text.ends_with("frame=1.50ms"));
    }
}
