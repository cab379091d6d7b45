//! Lazily created render pipelines keyed by program and pass state.

use std::collections::HashMap;

use viewport_render::{PassState, RenderError, Vertex};
use viewport_scene::{DrawMode, ShaderKind};

use crate::shaders;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Everything a pipeline depends on besides the shared layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub kind: ShaderKind,
    pub mode: DrawMode,
    /// Color attachment format; `None` for depth-only targets.
    pub color: Option<wgpu::TextureFormat>,
    pub depth: bool,
    pub state: PassState,
}

impl PipelineKey {
    fn label(&self) -> String {
        format!("{}:{:?}", self.kind.label(), self.mode)
    }
}

pub fn topology(mode: DrawMode) -> wgpu::PrimitiveTopology {
    match mode {
        DrawMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
        DrawMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        DrawMode::Lines => wgpu::PrimitiveTopology::LineList,
        DrawMode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        DrawMode::Points => wgpu::PrimitiveTopology::PointList,
    }
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x2,
    2 => Float32x3,
];

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32x4];

/// Compiled shader modules and the pipelines built from them.
pub struct PipelineCache {
    layout: wgpu::PipelineLayout,
    modules: HashMap<ShaderKind, wgpu::ShaderModule>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new(layout: wgpu::PipelineLayout) -> Self {
        Self {
            layout,
            modules: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Compile the program's module once, surfacing WGSL validation errors.
    pub fn compile(&mut self, device: &wgpu::Device, kind: ShaderKind) -> Result<(), RenderError> {
        if self.modules.contains_key(&kind) {
            return Ok(());
        }
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(kind.label()),
            source: wgpu::ShaderSource::Wgsl(shaders::source(kind).into()),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ProgramCompile {
                kind,
                reason: err.to_string(),
            });
        }
        tracing::debug!(program = kind.label(), "compiled shader module");
        self.modules.insert(kind, module);
        Ok(())
    }

    /// Create the pipeline for `key` unless it already exists.
    pub fn prepare(&mut self, device: &wgpu::Device, key: PipelineKey) -> Result<(), RenderError> {
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }
        self.compile(device, key.kind)?;
        let module = self
            .modules
            .get(&key.kind)
            .ok_or(RenderError::MissingProgram(key.kind))?;

        let label = key.label();
        let blend = if key.state.blend {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        };
        let targets = [key.color.map(|format| wgpu::ColorTargetState {
            format,
            blend: Some(blend),
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let fragment = (key.color.is_some() && shaders::has_fragment(key.kind)).then(|| wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &targets,
        });
        let strip = matches!(key.mode, DrawMode::TriangleStrip | DrawMode::LineStrip);

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: Vertex::STRIDE,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 4]>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &INSTANCE_ATTRIBUTES,
                    },
                ],
            },
            fragment,
            primitive: wgpu::PrimitiveState {
                topology: topology(key.mode),
                strip_index_format: strip.then_some(wgpu::IndexFormat::Uint16),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: key.state.cull_face.then_some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: key.depth.then(|| wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.state.depth_test,
                depth_compare: if key.state.depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        tracing::debug!(pipeline = %label, total = self.pipelines.len() + 1, "created render pipeline");
        self.pipelines.insert(key, pipeline);
        Ok(())
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }
}
