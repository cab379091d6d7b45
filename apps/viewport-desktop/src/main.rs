use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use viewport_assets::ResourceStore;
use viewport_common::Transform;
use viewport_controls::{Controller, OrbitController};
use viewport_input::{InputState, Key, MouseButton, PointerEvent};
use viewport_kernel::{FrameClock, FrameStats, Scheduler, Timer, timer};
use viewport_render::{RenderConfig, Renderer};
use viewport_render_wgpu::WgpuBackend;
use viewport_scene::primitives::{self, CubeFaces};
use viewport_scene::{AnimatedProperty, Animation, Hitbox, ObjectArgs, ObjectId, PropRegistry, Scene};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key as WinitKey, NamedKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "viewport-desktop", about = "Viewport desktop viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Render configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Draw straight to the window without offscreen passes
    #[arg(long)]
    no_post_process: bool,
}

/// Scene, input and timing; everything that outlives the GPU objects.
struct AppState {
    scene: Scene,
    tasks: Scheduler<Scene>,
    assets: ResourceStore,
    camera: ObjectId,
    orbit: OrbitController,
    input: InputState,
    clock: FrameClock,
    stats: FrameStats,
    report: Timer,
    cursor: Option<PhysicalPosition<f64>>,
    last_frame: Instant,
}

impl AppState {
    fn new(config: &RenderConfig) -> Result<Self> {
        let registry = PropRegistry::with_builtins();
        let mut scene = Scene::new();

        // The slab collides; the plane on its top face is what gets drawn.
        scene.spawn(
            &registry,
            "prop_static",
            &ObjectArgs::new()
                .name("Floor")
                .position(Vec3::new(0.0, -0.5, 0.0))
                .hitbox(Hitbox::new(0.5, 10.0, -0.5, -10.0, 10.0)),
        )?;
        scene.spawn(
            &registry,
            "geometry_plane",
            &ObjectArgs::new()
                .name("Ground")
                .size(20.0, 20.0)
                .rotation(Vec3::new(-std::f32::consts::FRAC_PI_2, 0.0, 0.0)),
        )?;
        scene.spawn(
            &registry,
            "prop_player",
            &ObjectArgs::new()
                .position(Vec3::new(0.0, 1.0, 0.0))
                .mesh(primitives::cube_mesh(CubeFaces::all(), [0.0, 0.0])),
        )?;
        let crate_id = scene.spawn(
            &registry,
            "geometry_cube",
            &ObjectArgs::new().name("Crate").position(Vec3::new(3.0, 0.5, -2.0)),
        )?;
        scene.spawn(
            &registry,
            "entity_emitter",
            &ObjectArgs::new().position(Vec3::new(-3.0, 0.0, 0.0)).seed(7),
        )?;

        let camera = scene.spawn(&registry, "entity_camera", &ObjectArgs::new().name("Viewer"))?;
        let orbit = OrbitController::new(
            camera_transform(&mut scene, camera).context("camera missing after spawn")?,
        );

        let mut tasks = Scheduler::new();
        tasks.add_task(
            Animation::new(crate_id, AnimatedProperty::Position)
                .with_keyframes([
                    Vec3::new(3.0, 0.5, -2.0),
                    Vec3::new(3.0, 1.5, -2.0),
                    Vec3::new(3.0, 0.5, -2.0),
                ])
                .with_duration(Duration::from_secs(2))
                .looped(),
        );
        tasks.add_task(timer(Duration::from_secs(10), |scene: &mut Scene, _| {
            tracing::debug!(objects = scene.len(), "scene heartbeat");
        }));

        tracing::info!(objects = scene.len(), tasks = tasks.len(), "scene ready");

        Ok(Self {
            scene,
            tasks,
            assets: ResourceStore::new(),
            camera,
            orbit,
            input: InputState::new(),
            clock: FrameClock::default().with_max_delta(config.max_frame_delta()),
            stats: FrameStats::new(120),
            report: Timer::new(Duration::from_secs(5)),
            cursor: None,
            last_frame: Instant::now(),
        })
    }

    /// Route one input event to the key state and the camera controller.
    fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::KeyDown(key) => self.input.press(key),
            PointerEvent::KeyUp(key) => self.input.release(key),
            PointerEvent::LockLost => self.input.release_all(),
            _ => {}
        }
        if let Some(transform) = camera_transform(&mut self.scene, self.camera) {
            self.orbit.handle_event(&event, transform);
        }
    }

    /// Advance the simulation by whole fixed steps, then ease the camera.
    fn update(&mut self, initial_render: bool) {
        let now = Instant::now();
        let elapsed = now - self.last_frame;
        self.last_frame = now;
        self.stats.record(elapsed);

        let Self {
            scene,
            tasks,
            input,
            clock,
            ..
        } = self;
        match clock.run(elapsed, initial_render, |step| {
            scene.update(step, input);
            tasks.run(scene, step).map(|_| ())
        }) {
            Ok(steps @ 2..) => tracing::trace!(steps, "caught up on simulation steps"),
            Ok(_) => {}
            Err(e) => tracing::error!("task failed: {e}"),
        }
        if self.report.tick(elapsed).is_some() {
            tracing::debug!(fps = self.stats.fps(), worst = ?self.stats.worst(), "frame stats");
        }

        if let Some(transform) = camera_transform(&mut self.scene, self.camera) {
            self.orbit.update(transform, elapsed);
        }
    }
}

fn camera_transform(scene: &mut Scene, id: ObjectId) -> Option<&mut Transform> {
    scene.get_mut(id).map(|object| &mut object.transform)
}

fn map_key(key: &WinitKey) -> Option<Key> {
    match key {
        WinitKey::Character(text) => Key::from_name(text.as_str()),
        WinitKey::Named(named) => Some(match named {
            NamedKey::Space => Key::Space,
            NamedKey::Shift => Key::Shift,
            NamedKey::Control => Key::Control,
            NamedKey::Escape => Key::Escape,
            NamedKey::Enter => Key::Enter,
            NamedKey::Tab => Key::Tab,
            NamedKey::ArrowUp => Key::ArrowUp,
            NamedKey::ArrowDown => Key::ArrowDown,
            NamedKey::ArrowLeft => Key::ArrowLeft,
            NamedKey::ArrowRight => Key::ArrowRight,
            _ => return None,
        }),
        _ => None,
    }
}

fn map_button(button: winit::event::MouseButton) -> MouseButton {
    match button {
        winit::event::MouseButton::Left => MouseButton::Left,
        winit::event::MouseButton::Middle => MouseButton::Middle,
        winit::event::MouseButton::Right => MouseButton::Right,
        winit::event::MouseButton::Back => MouseButton::Other(3),
        winit::event::MouseButton::Forward => MouseButton::Other(4),
        winit::event::MouseButton::Other(n) => MouseButton::Other(n),
    }
}

/// Window, GPU and renderer, created on the first `resumed`.
struct GpuApp {
    state: AppState,
    config: RenderConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer<WgpuBackend>>,
    frames: u64,
}

impl GpuApp {
    fn new(state: AppState, config: RenderConfig) -> Self {
        Self {
            state,
            config,
            window: None,
            renderer: None,
            frames: 0,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Viewport")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("viewport_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        // The composite program applies gamma itself.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface has no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let backend = WgpuBackend::new(device, queue, surface, surface_config);
        let renderer = Renderer::new(backend, self.config.clone(), size.width.max(1), size.height.max(1))?;

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );
        tracing::info!(passes = ?renderer.pass_names(), "renderer ready");

        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn redraw(&mut self) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        let now = Instant::now();
        if let Err(e) = renderer.poll_resize(now) {
            tracing::error!("resize failed: {e}");
        }

        self.state.update(self.frames == 0);
        self.frames += 1;

        match renderer.draw(&mut self.state.scene, &self.state.assets, Some(self.state.camera)) {
            Ok(info) => tracing::trace!("{info}"),
            Err(e) => tracing::error!("draw failed: {e}"),
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("failed to initialize GPU: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.backend_mut().resize_output(new_size.width, new_size.height);
                    renderer.set_resolution(new_size.width.max(1), new_size.height.max(1), Instant::now());
                }
            }
            WindowEvent::Focused(false) => {
                self.state.handle_pointer(PointerEvent::LockLost);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(key) = map_key(&logical_key) {
                    let event = match key_state {
                        ElementState::Pressed => PointerEvent::KeyDown(key),
                        ElementState::Released => PointerEvent::KeyUp(key),
                    };
                    self.state.handle_pointer(event);
                }
            }
            WindowEvent::MouseInput {
                button,
                state: btn_state,
                ..
            } => {
                let button = map_button(button);
                let event = match btn_state {
                    ElementState::Pressed => {
                        let (x, y) = self
                            .state
                            .cursor
                            .map(|p| (p.x as f32, p.y as f32))
                            .unwrap_or_default();
                        PointerEvent::Down { button, x, y }
                    }
                    ElementState::Released => PointerEvent::Up { button },
                };
                self.state.handle_pointer(event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last) = self.state.cursor.replace(position) {
                    self.state.handle_pointer(PointerEvent::Move {
                        dx: (position.x - last.x) as f32,
                        dy: (position.y - last.y) as f32,
                    });
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32,
                };
                self.state.handle_pointer(PointerEvent::Wheel { delta });
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("viewport-desktop starting");

    let mut config = match &cli.config {
        Some(path) => RenderConfig::load(path).with_context(|| format!("load {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if cli.no_post_process {
        config.post_process = false;
    }

    let state = AppState::new(&config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state, config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
