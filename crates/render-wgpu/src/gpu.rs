use std::collections::HashMap;
use std::num::NonZeroU64;

use viewport_assets::{Filter, Image, Wrap};
use viewport_render::{
    Attachment, Clear, GpuBackend, Instance, MeshHandle, PassState, ProgramHandle, RenderError, RenderTarget,
    TargetDesc, TargetHandle, TextureHandle, TextureUnit, UniformValue, Vertex,
};
use viewport_scene::{DrawMode, ShaderKind};
use wgpu::util::DeviceExt;

use crate::pipeline::{DEPTH_FORMAT, PipelineCache, PipelineKey};
use crate::uniforms::{BLOCK_SIZE, UniformBlock, align_to};

/// Format of offscreen color attachments.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const UNIT_COUNT: usize = TextureUnit::COUNT as usize;
const MESH_SAMPLER_BINDING: u32 = TextureUnit::COUNT;
const SCREEN_SAMPLER_BINDING: u32 = TextureUnit::COUNT + 1;

type UnitBindings = [Option<TextureHandle>; UNIT_COUNT];

struct GpuTexture {
    view: wgpu::TextureView,
    sampler: Option<wgpu::Sampler>,
    depth: bool,
}

struct GpuTarget {
    desc: TargetDesc,
    color: Option<TextureHandle>,
    depth: Option<TextureHandle>,
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    vertex_count: u32,
    indices: Option<(wgpu::Buffer, u32)>,
    /// Per-instance buffer and its capacity in instances.
    instances: Option<(wgpu::Buffer, usize)>,
}

struct Program {
    kind: ShaderKind,
    block: UniformBlock,
}

struct DrawRecord {
    pipeline: PipelineKey,
    mesh: MeshHandle,
    instances: u32,
    uniform_offset: u32,
    units: UnitBindings,
}

struct PassRecord {
    target: RenderTarget,
    state: PassState,
    clear: Clear,
    draws: Vec<DrawRecord>,
}

/// Where the surface pass renders.
enum Output {
    Window {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    /// Offscreen texture for headless rendering.
    Texture {
        texture: wgpu::Texture,
        format: wgpu::TextureFormat,
    },
}

/// [`GpuBackend`] on wgpu.
///
/// Commands are buffered per pass: each draw snapshots its program's uniform
/// block into a dynamic-offset uniform buffer and its texture units into a
/// cached bind group. The whole frame is encoded and submitted by
/// `end_frame`.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    output: Output,
    output_depth: wgpu::TextureView,
    size: (u32, u32),
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipelines: PipelineCache,
    uniform_stride: u64,
    uniform_buffer: wgpu::Buffer,
    uniform_capacity: u64,
    uniform_group: wgpu::BindGroup,
    staging: Vec<u8>,
    default_sampler: wgpu::Sampler,
    screen_sampler: wgpu::Sampler,
    fallback: GpuTexture,
    depth_fallback: GpuTexture,
    default_instance: wgpu::Buffer,
    textures: HashMap<TextureHandle, GpuTexture>,
    targets: HashMap<TargetHandle, GpuTarget>,
    meshes: HashMap<MeshHandle, GpuMesh>,
    programs: HashMap<ProgramHandle, Program>,
    texture_groups: HashMap<UnitBindings, wgpu::BindGroup>,
    units: UnitBindings,
    current_program: Option<ProgramHandle>,
    open_pass: Option<PassRecord>,
    frame: Vec<PassRecord>,
    next_handle: u32,
}

impl WgpuBackend {
    /// Backend presenting to a window surface.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    ) -> Self {
        surface.configure(&device, &config);
        let size = (config.width, config.height);
        Self::build(device, queue, Output::Window { surface, config }, size)
    }

    /// Backend rendering the surface pass into an offscreen texture.
    pub fn headless(device: wgpu::Device, queue: wgpu::Queue, width: u32, height: u32) -> Self {
        let texture = output_texture(&device, width, height);
        Self::build(
            device,
            queue,
            Output::Texture {
                texture,
                format: COLOR_FORMAT,
            },
            (width, height),
        )
    }

    fn build(device: wgpu::Device, queue: wgpu::Queue, output: Output, size: (u32, u32)) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(BLOCK_SIZE),
                },
                count: None,
            }],
        });

        let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..TextureUnit::COUNT)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: if TextureUnit(binding).is_depth() {
                        wgpu::TextureSampleType::Depth
                    } else {
                        wgpu::TextureSampleType::Float { filterable: true }
                    },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        for binding in [MESH_SAMPLER_BINDING, SCREEN_SAMPLER_BINDING] {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_layout"),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let uniform_stride = align_to(BLOCK_SIZE, device.limits().min_uniform_buffer_offset_alignment as u64);
        let uniform_capacity = uniform_stride * 64;
        let uniform_buffer = uniform_buffer(&device, uniform_capacity);
        let uniform_group = uniform_group(&device, &uniform_layout, &uniform_buffer);

        let default_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("default_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let screen_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("screen_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let fallback = upload_image(&device, &queue, &Image::empty(), "fallback");
        let depth_fallback = attachment(&device, "depth_fallback", 1, 1, true);
        let default_instance = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("default_instance"),
            contents: bytemuck::cast_slice(&[[0.0f32; 4]]),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let output_depth = attachment(&device, "output_depth", size.0, size.1, true).view;

        tracing::info!(width = size.0, height = size.1, uniform_stride, "wgpu backend ready");
        Self {
            device,
            queue,
            output,
            output_depth,
            size,
            uniform_layout,
            texture_layout,
            pipelines: PipelineCache::new(pipeline_layout),
            uniform_stride,
            uniform_buffer,
            uniform_capacity,
            uniform_group,
            staging: Vec::new(),
            default_sampler,
            screen_sampler,
            fallback,
            depth_fallback,
            default_instance,
            textures: HashMap::new(),
            targets: HashMap::new(),
            meshes: HashMap::new(),
            programs: HashMap::new(),
            texture_groups: HashMap::new(),
            units: [None; UNIT_COUNT],
            current_program: None,
            open_pass: None,
            frame: Vec::new(),
            next_handle: 0,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Rendered image of a headless backend.
    pub fn output_texture(&self) -> Option<&wgpu::Texture> {
        match &self.output {
            Output::Texture { texture, .. } => Some(texture),
            Output::Window { .. } => None,
        }
    }

    pub fn output_format(&self) -> wgpu::TextureFormat {
        match &self.output {
            Output::Window { config, .. } => config.format,
            Output::Texture { format, .. } => *format,
        }
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Reconfigure the presentation surface. Offscreen targets are resized
    /// by the renderer.
    pub fn resize_output(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.size == (width, height) {
            return;
        }
        self.size = (width, height);
        match &mut self.output {
            Output::Window { surface, config } => {
                config.width = width;
                config.height = height;
                surface.configure(&self.device, config);
            }
            Output::Texture { texture, .. } => *texture = output_texture(&self.device, width, height),
        }
        self.output_depth = attachment(&self.device, "output_depth", width, height, true).view;
        tracing::debug!(width, height, "resized output");
    }

    fn next_id(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn target_formats(&self, target: RenderTarget) -> Result<(Option<wgpu::TextureFormat>, bool), RenderError> {
        match target {
            RenderTarget::Surface => Ok((Some(self.output_format()), true)),
            RenderTarget::Offscreen(handle) => {
                let target = self.targets.get(&handle).ok_or(RenderError::UnknownHandle {
                    kind: "target",
                    id: handle.0,
                })?;
                Ok((target.desc.color.then_some(COLOR_FORMAT), target.desc.depth))
            }
        }
    }

    fn create_attachments(&mut self, handle: TargetHandle) {
        let Some(target) = self.targets.get(&handle) else {
            return;
        };
        let desc = target.desc.clone();
        let (color, depth) = (target.color, target.depth);
        if let Some(color) = color {
            let texture = attachment(&self.device, &desc.label, desc.width, desc.height, false);
            self.textures.insert(color, texture);
        }
        if let Some(depth) = depth {
            let label = format!("{}_depth", desc.label);
            let texture = attachment(&self.device, &label, desc.width, desc.height, true);
            self.textures.insert(depth, texture);
        }
        self.texture_groups.clear();
    }

    fn ensure_uniform_capacity(&mut self, needed: u64) {
        if needed <= self.uniform_capacity {
            return;
        }
        self.uniform_capacity = needed.next_power_of_two();
        self.uniform_buffer = uniform_buffer(&self.device, self.uniform_capacity);
        self.uniform_group = uniform_group(&self.device, &self.uniform_layout, &self.uniform_buffer);
        tracing::debug!(capacity = self.uniform_capacity, "grew uniform buffer");
    }

    fn prepare_textures(&mut self, units: &UnitBindings) {
        if self.texture_groups.contains_key(units) {
            return;
        }
        let views: Vec<&wgpu::TextureView> = units
            .iter()
            .enumerate()
            .map(|(i, bound)| {
                let depth = TextureUnit(i as u32).is_depth();
                let fallback = if depth { &self.depth_fallback } else { &self.fallback };
                let texture = bound.and_then(|h| self.textures.get(&h)).unwrap_or(fallback);
                if texture.depth == depth {
                    &texture.view
                } else {
                    tracing::warn!(unit = i, "texture kind does not match unit, binding fallback");
                    &fallback.view
                }
            })
            .collect();
        let mesh_sampler = units[TextureUnit::MESH_TEXTURE.0 as usize]
            .and_then(|h| self.textures.get(&h))
            .and_then(|t| t.sampler.as_ref())
            .unwrap_or(&self.default_sampler);

        let mut entries: Vec<wgpu::BindGroupEntry> = views
            .iter()
            .enumerate()
            .map(|(i, view)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: MESH_SAMPLER_BINDING,
            resource: wgpu::BindingResource::Sampler(mesh_sampler),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: SCREEN_SAMPLER_BINDING,
            resource: wgpu::BindingResource::Sampler(&self.screen_sampler),
        });
        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture_units"),
            layout: &self.texture_layout,
            entries: &entries,
        });
        self.texture_groups.insert(*units, group);
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &PassRecord,
        output: Option<&wgpu::TextureView>,
    ) -> Result<(), RenderError> {
        let (color_view, depth_view) = match pass.target {
            RenderTarget::Surface => (output, Some(&self.output_depth)),
            RenderTarget::Offscreen(handle) => {
                let target = self.targets.get(&handle).ok_or(RenderError::UnknownHandle {
                    kind: "target",
                    id: handle.0,
                })?;
                let view = |h: Option<TextureHandle>| h.and_then(|h| self.textures.get(&h)).map(|t| &t.view);
                (view(target.color), view(target.depth))
            }
        };
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = color_view
            .map(|view| wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: load_color(pass.clear.color),
                    store: wgpu::StoreOp::Store,
                },
            })
            .into_iter()
            .map(Some)
            .collect();
        let depth_attachment = depth_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: if pass.clear.depth {
                    wgpu::LoadOp::Clear(1.0)
                } else {
                    wgpu::LoadOp::Load
                },
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        });

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("viewport_pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: depth_attachment,
            ..Default::default()
        });
        for draw in &pass.draws {
            let (Some(pipeline), Some(textures), Some(mesh)) = (
                self.pipelines.get(&draw.pipeline),
                self.texture_groups.get(&draw.units),
                self.meshes.get(&draw.mesh),
            ) else {
                tracing::warn!(mesh = draw.mesh.0, "draw lost its resources before submit");
                continue;
            };
            if mesh.vertex_count == 0 {
                continue;
            }
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &self.uniform_group, &[draw.uniform_offset]);
            rpass.set_bind_group(1, textures, &[]);
            rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
            let (instance_buffer, instances) = match &mesh.instances {
                Some((buffer, _)) => (buffer, draw.instances),
                None => (&self.default_instance, 1),
            };
            rpass.set_vertex_buffer(1, instance_buffer.slice(..));
            match &mesh.indices {
                Some((buffer, count)) => {
                    rpass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint16);
                    rpass.draw_indexed(0..*count, 0, 0..instances);
                }
                None => rpass.draw(0..mesh.vertex_count, 0..instances),
            }
        }
        Ok(())
    }
}

impl GpuBackend for WgpuBackend {
    fn create_texture(&mut self, image: &Image) -> Result<TextureHandle, RenderError> {
        image.validate()?;
        let handle = TextureHandle(self.next_id());
        let texture = upload_image(&self.device, &self.queue, image, "image");
        self.textures.insert(handle, texture);
        Ok(handle)
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_some() {
            self.texture_groups.clear();
        }
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Result<TargetHandle, RenderError> {
        if desc.antialiasing {
            tracing::debug!(target = %desc.label, "multisampling not supported, rendering single-sampled");
        }
        let handle = TargetHandle(self.next_id());
        let color = desc.color.then(|| TextureHandle(self.next_id()));
        let depth = desc.depth.then(|| TextureHandle(self.next_id()));
        self.targets.insert(
            handle,
            GpuTarget {
                desc: desc.clone(),
                color,
                depth,
            },
        );
        self.create_attachments(handle);
        Ok(handle)
    }

    fn resize_target(&mut self, target: TargetHandle, width: u32, height: u32) -> Result<(), RenderError> {
        let entry = self.targets.get_mut(&target).ok_or(RenderError::UnknownHandle {
            kind: "target",
            id: target.0,
        })?;
        entry.desc.width = width;
        entry.desc.height = height;
        self.create_attachments(target);
        Ok(())
    }

    fn target_texture(&self, target: TargetHandle, attachment: Attachment) -> Option<TextureHandle> {
        let target = self.targets.get(&target)?;
        match attachment {
            Attachment::Color => target.color,
            Attachment::Depth => target.depth,
        }
    }

    fn create_program(&mut self, kind: ShaderKind) -> Result<ProgramHandle, RenderError> {
        self.pipelines.compile(&self.device, kind)?;
        let handle = ProgramHandle(self.next_id());
        self.programs.insert(
            handle,
            Program {
                kind,
                block: UniformBlock::default(),
            },
        );
        Ok(handle)
    }

    fn release_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u16]) -> Result<MeshHandle, RenderError> {
        let handle = MeshHandle(self.next_id());
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = (!indices.is_empty()).then(|| {
            let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_indices"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            (buffer, indices.len() as u32)
        });
        self.meshes.insert(
            handle,
            GpuMesh {
                vertices: vertex_buffer,
                vertex_count: vertices.len() as u32,
                indices: index_buffer,
                instances: None,
            },
        );
        Ok(handle)
    }

    fn release_mesh(&mut self, mesh: MeshHandle) {
        self.meshes.remove(&mesh);
    }

    fn update_instances(&mut self, mesh: MeshHandle, instances: &[Instance]) -> Result<(), RenderError> {
        let entry = self.meshes.get_mut(&mesh).ok_or(RenderError::UnknownHandle {
            kind: "mesh",
            id: mesh.0,
        })?;
        if instances.is_empty() {
            return Ok(());
        }
        let fits = entry.instances.as_ref().is_some_and(|(_, capacity)| *capacity >= instances.len());
        if !fits {
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("mesh_instances"),
                size: std::mem::size_of_val(instances) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            entry.instances = Some((buffer, instances.len()));
        }
        if let Some((buffer, _)) = &entry.instances {
            self.queue.write_buffer(buffer, 0, bytemuck::cast_slice(instances));
        }
        Ok(())
    }

    fn begin_pass(
        &mut self,
        target: RenderTarget,
        _viewport: (u32, u32),
        state: PassState,
        clear: Clear,
    ) -> Result<(), RenderError> {
        if self.open_pass.is_some() {
            return Err(RenderError::PassOpen);
        }
        self.target_formats(target)?;
        self.open_pass = Some(PassRecord {
            target,
            state,
            clear,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current_program = Some(program);
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        let Some(program) = self.programs.get_mut(&program) else {
            return;
        };
        if !program.block.set(name, value) {
            tracing::trace!(uniform = name, program = program.kind.label(), "uniform not in block");
        }
    }

    fn bind_texture(&mut self, unit: TextureUnit, texture: Option<TextureHandle>) {
        if let Some(slot) = self.units.get_mut(unit.0 as usize) {
            *slot = texture;
        }
    }

    fn draw(&mut self, mesh: MeshHandle, mode: DrawMode, instances: u32) -> Result<(), RenderError> {
        let (target, state) = match &self.open_pass {
            Some(pass) => (pass.target, pass.state),
            None => return Err(RenderError::NotInPass),
        };
        let handle = self
            .current_program
            .ok_or_else(|| RenderError::Backend("draw without a program in use".into()))?;
        let program = self.programs.get(&handle).ok_or(RenderError::UnknownHandle {
            kind: "program",
            id: handle.0,
        })?;
        if !self.meshes.contains_key(&mesh) {
            return Err(RenderError::UnknownHandle {
                kind: "mesh",
                id: mesh.0,
            });
        }
        let (color, depth) = self.target_formats(target)?;
        let pipeline = PipelineKey {
            kind: program.kind,
            mode,
            color,
            depth,
            state,
        };

        let offset = self.staging.len();
        self.staging.extend_from_slice(program.block.as_bytes());
        self.staging.resize(offset + self.uniform_stride as usize, 0);
        let record = DrawRecord {
            pipeline,
            mesh,
            instances,
            uniform_offset: offset as u32,
            units: self.units,
        };
        if let Some(pass) = self.open_pass.as_mut() {
            pass.draws.push(record);
        }
        Ok(())
    }

    fn end_pass(&mut self) -> Result<(), RenderError> {
        let pass = self.open_pass.take().ok_or(RenderError::NotInPass)?;
        self.frame.push(pass);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        if self.open_pass.is_some() {
            return Err(RenderError::PassOpen);
        }
        let passes = std::mem::take(&mut self.frame);
        let staging = std::mem::take(&mut self.staging);

        self.ensure_uniform_capacity(staging.len() as u64);
        if !staging.is_empty() {
            self.queue.write_buffer(&self.uniform_buffer, 0, &staging);
        }
        for pass in &passes {
            for draw in &pass.draws {
                self.pipelines.prepare(&self.device, draw.pipeline)?;
                self.prepare_textures(&draw.units);
            }
        }

        let presents = passes.iter().any(|p| p.target == RenderTarget::Surface);
        let frame = match &self.output {
            Output::Window { surface, config } if presents => match surface.get_current_texture() {
                Ok(frame) => Some(frame),
                Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                    surface.configure(&self.device, config);
                    return Err(RenderError::Surface(err.to_string()));
                }
                Err(err) => return Err(RenderError::Surface(err.to_string())),
            },
            _ => None,
        };
        let output_view = match (&frame, &self.output) {
            (Some(frame), _) => Some(frame.texture.create_view(&wgpu::TextureViewDescriptor::default())),
            (None, Output::Texture { texture, .. }) => {
                Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
            }
            (None, Output::Window { .. }) => None,
        };

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        for pass in &passes {
            self.encode_pass(&mut encoder, pass, output_view.as_ref())?;
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        if let Some(frame) = frame {
            frame.present();
        }

        let mut staging = staging;
        staging.clear();
        self.staging = staging;
        Ok(())
    }
}

fn uniform_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("uniforms"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn uniform_group(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, buffer: &wgpu::Buffer) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("uniform_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: NonZeroU64::new(BLOCK_SIZE),
            }),
        }],
    })
}

fn output_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("output"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Render attachment that later passes can read.
fn attachment(device: &wgpu::Device, label: &str, width: u32, height: u32, depth: bool) -> GpuTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: if depth { DEPTH_FORMAT } else { COLOR_FORMAT },
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    GpuTexture {
        view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        sampler: None,
        depth,
    }
}

fn upload_image(device: &wgpu::Device, queue: &wgpu::Queue, image: &Image, label: &str) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        size,
    );
    let sampling = image.sampling;
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode(sampling.wrap_s),
        address_mode_v: address_mode(sampling.wrap_t),
        mag_filter: filter_mode(sampling.mag_filter),
        min_filter: filter_mode(sampling.min_filter),
        ..Default::default()
    });
    GpuTexture {
        view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        sampler: Some(sampler),
        depth: false,
    }
}

fn address_mode(wrap: Wrap) -> wgpu::AddressMode {
    match wrap {
        Wrap::Repeat => wgpu::AddressMode::Repeat,
        Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        Wrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

fn filter_mode(filter: Filter) -> wgpu::FilterMode {
    match filter {
        Filter::Linear => wgpu::FilterMode::Linear,
        Filter::Nearest => wgpu::FilterMode::Nearest,
    }
}

fn load_color(clear: Option<[f32; 4]>) -> wgpu::LoadOp<wgpu::Color> {
    match clear {
        Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }),
        None => wgpu::LoadOp::Load,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_modes() {
        assert_eq!(address_mode(Wrap::MirroredRepeat), wgpu::AddressMode::MirrorRepeat);
        assert_eq!(filter_mode(Filter::Nearest), wgpu::FilterMode::Nearest);
    }

    #[test]
    fn clear_color_loads() {
        assert_eq!(load_color(None), wgpu::LoadOp::Load);
        assert_eq!(
            load_color(Some([1.0, 0.5, 0.0, 1.0])),
            wgpu::LoadOp::Clear(wgpu::Color {
                r: 1.0,
                g: 0.5,
                b: 0.0,
                a: 1.0
            })
        );
    }

    #[test]
    fn sampler_bindings_follow_texture_units() {
        assert_eq!(MESH_SAMPLER_BINDING as usize, UNIT_COUNT);
        assert_eq!(SCREEN_SAMPLER_BINDING, MESH_SAMPLER_BINDING + 1);
    }
}
