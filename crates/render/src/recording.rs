use std::collections::{HashMap, HashSet};
use std::fmt;

use viewport_assets::Image;
use viewport_scene::{DrawMode, ShaderKind};

use crate::backend::{
    Attachment, Clear, GpuBackend, MeshHandle, PassState, ProgramHandle, RenderTarget, TargetDesc, TargetHandle,
    TextureHandle, TextureUnit, UniformValue,
};
use crate::error::RenderError;
use crate::vertex::{Instance, Vertex};

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTexture { texture: TextureHandle, width: u32, height: u32 },
    ReleaseTexture(TextureHandle),
    CreateTarget { target: TargetHandle, label: String, width: u32, height: u32 },
    ResizeTarget { target: TargetHandle, width: u32, height: u32 },
    CreateProgram { program: ProgramHandle, kind: ShaderKind },
    ReleaseProgram(ProgramHandle),
    CreateMesh { mesh: MeshHandle, vertices: usize, indices: usize },
    ReleaseMesh(MeshHandle),
    UpdateInstances { mesh: MeshHandle, count: usize },
    BeginPass { target: RenderTarget, width: u32, height: u32 },
    UseProgram(ProgramHandle),
    SetUniform { program: ProgramHandle, name: String, value: UniformValue },
    BindTexture { unit: TextureUnit, texture: Option<TextureHandle> },
    Draw { mesh: MeshHandle, mode: DrawMode, instances: u32 },
    EndPass,
    EndFrame,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::CreateTexture { texture, width, height } => {
                write!(f, "create texture #{} {}x{}", texture.0, width, height)
            }
            Command::ReleaseTexture(t) => write!(f, "release texture #{}", t.0),
            Command::CreateTarget {
                target,
                label,
                width,
                height,
            } => write!(f, "create target #{} '{}' {}x{}", target.0, label, width, height),
            Command::ResizeTarget { target, width, height } => {
                write!(f, "resize target #{} {}x{}", target.0, width, height)
            }
            Command::CreateProgram { program, kind } => {
                write!(f, "create program #{} ({})", program.0, kind.label())
            }
            Command::ReleaseProgram(p) => write!(f, "release program #{}", p.0),
            Command::CreateMesh { mesh, vertices, indices } => {
                write!(f, "create mesh #{} verts={} indices={}", mesh.0, vertices, indices)
            }
            Command::ReleaseMesh(m) => write!(f, "release mesh #{}", m.0),
            Command::UpdateInstances { mesh, count } => write!(f, "  instances #{} count={}", mesh.0, count),
            Command::BeginPass { target, width, height } => match target {
                RenderTarget::Surface => write!(f, "begin pass surface {}x{}", width, height),
                RenderTarget::Offscreen(t) => write!(f, "begin pass target #{} {}x{}", t.0, width, height),
            },
            Command::UseProgram(p) => write!(f, "  use program #{}", p.0),
            Command::SetUniform { program, name, value } => {
                write!(f, "  uniform #{} {} = {:?}", program.0, name, value)
            }
            Command::BindTexture { unit, texture } => match texture {
                Some(t) => write!(f, "  bind unit {} <- texture #{}", unit.0, t.0),
                None => write!(f, "  bind unit {} <- empty", unit.0),
            },
            Command::Draw { mesh, mode, instances } => {
                write!(f, "  draw mesh #{} {:?} x{}", mesh.0, mode, instances)
            }
            Command::EndPass => write!(f, "end pass"),
            Command::EndFrame => write!(f, "end frame"),
        }
    }
}

/// Creation counts per resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub textures: usize,
    pub targets: usize,
    pub programs: usize,
    pub meshes: usize,
}

#[derive(Debug, Clone, Copy)]
struct RecordedMesh {
    vertices: usize,
    instanced: bool,
}

/// Headless backend that records every call instead of touching a GPU.
///
/// It enforces the same call-order contract as a real backend, so pipeline
/// bugs surface as errors in tests and in `viewport-cli trace`.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<Command>,
    created: ResourceCounts,
    next_handle: u32,
    targets: HashMap<TargetHandle, (Option<TextureHandle>, Option<TextureHandle>)>,
    meshes: HashMap<MeshHandle, RecordedMesh>,
    programs: HashSet<ProgramHandle>,
    in_pass: bool,
    frames: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn created(&self) -> ResourceCounts {
        self.created
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Live meshes, i.e. created and not yet released.
    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Human-readable listing of the recorded commands.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== Recorded frame (commands={}, frames={}) ===\n",
            self.commands.len(),
            self.frames
        ));
        for command in &self.commands {
            out.push_str(&command.to_string());
            out.push('\n');
        }
        out
    }

    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl GpuBackend for RecordingBackend {
    fn create_texture(&mut self, image: &Image) -> Result<TextureHandle, RenderError> {
        image.validate()?;
        let texture = TextureHandle(self.next());
        self.created.textures += 1;
        self.commands.push(Command::CreateTexture {
            texture,
            width: image.width,
            height: image.height,
        });
        Ok(texture)
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        self.commands.push(Command::ReleaseTexture(texture));
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Result<TargetHandle, RenderError> {
        let target = TargetHandle(self.next());
        let color = desc.color.then(|| TextureHandle(self.next()));
        let depth = desc.depth.then(|| TextureHandle(self.next()));
        self.targets.insert(target, (color, depth));
        self.created.targets += 1;
        self.commands.push(Command::CreateTarget {
            target,
            label: desc.label.clone(),
            width: desc.width,
            height: desc.height,
        });
        Ok(target)
    }

    fn resize_target(&mut self, target: TargetHandle, width: u32, height: u32) -> Result<(), RenderError> {
        if !self.targets.contains_key(&target) {
            return Err(RenderError::UnknownHandle {
                kind: "target",
                id: target.0,
            });
        }
        self.commands.push(Command::ResizeTarget { target, width, height });
        Ok(())
    }

    fn target_texture(&self, target: TargetHandle, attachment: Attachment) -> Option<TextureHandle> {
        let (color, depth) = self.targets.get(&target)?;
        match attachment {
            Attachment::Color => *color,
            Attachment::Depth => *depth,
        }
    }

    fn create_program(&mut self, kind: ShaderKind) -> Result<ProgramHandle, RenderError> {
        let program = ProgramHandle(self.next());
        self.programs.insert(program);
        self.created.programs += 1;
        self.commands.push(Command::CreateProgram { program, kind });
        Ok(program)
    }

    fn release_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        self.commands.push(Command::ReleaseProgram(program));
    }

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u16]) -> Result<MeshHandle, RenderError> {
        let mesh = MeshHandle(self.next());
        self.meshes.insert(
            mesh,
            RecordedMesh {
                vertices: vertices.len(),
                instanced: false,
            },
        );
        self.created.meshes += 1;
        self.commands.push(Command::CreateMesh {
            mesh,
            vertices: vertices.len(),
            indices: indices.len(),
        });
        Ok(mesh)
    }

    fn release_mesh(&mut self, mesh: MeshHandle) {
        self.meshes.remove(&mesh);
        self.commands.push(Command::ReleaseMesh(mesh));
    }

    fn update_instances(&mut self, mesh: MeshHandle, instances: &[Instance]) -> Result<(), RenderError> {
        let entry = self.meshes.get_mut(&mesh).ok_or(RenderError::UnknownHandle {
            kind: "mesh",
            id: mesh.0,
        })?;
        entry.instanced = true;
        self.commands.push(Command::UpdateInstances {
            mesh,
            count: instances.len(),
        });
        Ok(())
    }

    fn begin_pass(
        &mut self,
        target: RenderTarget,
        viewport: (u32, u32),
        _state: PassState,
        _clear: Clear,
    ) -> Result<(), RenderError> {
        if self.in_pass {
            return Err(RenderError::PassOpen);
        }
        if let RenderTarget::Offscreen(t) = target {
            if !self.targets.contains_key(&t) {
                return Err(RenderError::UnknownHandle { kind: "target", id: t.0 });
            }
        }
        self.in_pass = true;
        self.commands.push(Command::BeginPass {
            target,
            width: viewport.0,
            height: viewport.1,
        });
        Ok(())
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.commands.push(Command::UseProgram(program));
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        if !self.programs.contains(&program) {
            tracing::warn!(program = program.0, name, "uniform for unknown program");
        }
        self.commands.push(Command::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn bind_texture(&mut self, unit: TextureUnit, texture: Option<TextureHandle>) {
        self.commands.push(Command::BindTexture { unit, texture });
    }

    fn draw(&mut self, mesh: MeshHandle, mode: DrawMode, instances: u32) -> Result<(), RenderError> {
        if !self.in_pass {
            return Err(RenderError::NotInPass);
        }
        let entry = self.meshes.get(&mesh).ok_or(RenderError::UnknownHandle {
            kind: "mesh",
            id: mesh.0,
        })?;
        if instances > 1 && !entry.instanced {
            tracing::warn!(mesh = mesh.0, "instanced draw without instance data");
        }
        tracing::trace!(mesh = mesh.0, vertices = entry.vertices, instances, "draw");
        self.commands.push(Command::Draw { mesh, mode, instances });
        Ok(())
    }

    fn end_pass(&mut self) -> Result<(), RenderError> {
        if !self.in_pass {
            return Err(RenderError::NotInPass);
        }
        self.in_pass = false;
        self.commands.push(Command::EndPass);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        if self.in_pass {
            return Err(RenderError::PassOpen);
        }
        self.frames += 1;
        self.commands.push(Command::EndFrame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Vec<Vertex> {
        vec![
            Vertex {
                position: [0.0; 3],
                uv: [0.0; 2],
                normal: [0.0, 0.0, 1.0],
            };
            6
        ]
    }

    #[test]
    fn draw_requires_open_pass() {
        let mut backend = RecordingBackend::new();
        let mesh = backend.create_mesh(&quad(), &[]).unwrap();
        assert!(matches!(
            backend.draw(mesh, DrawMode::Triangles, 1),
            Err(RenderError::NotInPass)
        ));

        backend
            .begin_pass(RenderTarget::Surface, (4, 4), PassState::default(), Clear::depth_only())
            .unwrap();
        assert!(backend.draw(mesh, DrawMode::Triangles, 1).is_ok());
        assert!(matches!(
            backend.begin_pass(RenderTarget::Surface, (4, 4), PassState::default(), Clear::depth_only()),
            Err(RenderError::PassOpen)
        ));
        backend.end_pass().unwrap();
        backend.end_frame().unwrap();
        assert_eq!(backend.frames(), 1);
    }

    #[test]
    fn released_mesh_cannot_draw() {
        let mut backend = RecordingBackend::new();
        let mesh = backend.create_mesh(&quad(), &[]).unwrap();
        backend.release_mesh(mesh);
        backend
            .begin_pass(RenderTarget::Surface, (4, 4), PassState::default(), Clear::depth_only())
            .unwrap();
        assert!(matches!(
            backend.draw(mesh, DrawMode::Triangles, 1),
            Err(RenderError::UnknownHandle { kind: "mesh", .. })
        ));
        assert_eq!(backend.live_meshes(), 0);
    }

    #[test]
    fn targets_expose_attachments() {
        let mut backend = RecordingBackend::new();
        let desc = TargetDesc {
            label: "shadow".into(),
            width: 64,
            height: 64,
            color: false,
            depth: true,
            antialiasing: false,
        };
        let target = backend.create_target(&desc).unwrap();
        assert!(backend.target_texture(target, Attachment::Color).is_none());
        assert!(backend.target_texture(target, Attachment::Depth).is_some());
        assert!(backend.resize_target(TargetHandle(999), 1, 1).is_err());
    }

    #[test]
    fn transcript_lists_commands() {
        let mut backend = RecordingBackend::new();
        backend.create_program(ShaderKind::Composite).unwrap();
        let text = backend.transcript();
        assert!(text.contains("commands=1"));
        assert!(text.contains("(composite)"));
    }
}
