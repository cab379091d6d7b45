use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use viewport_assets::{Image, ResourceStore};
use viewport_controls::TurntableController;
use viewport_input::{InputState, Key};
use viewport_kernel::{DEFAULT_STEP, FrameClock, Scheduler};
use viewport_render::{RecordingBackend, RenderConfig, Renderer};
use viewport_scene::primitives::{self, CubeFaces};
use viewport_scene::{AnimatedProperty, Animation, Hitbox, ObjectArgs, ObjectId, PropRegistry, Scene, SceneNode};

#[derive(Parser)]
#[command(name = "viewport-cli", about = "CLI tool for viewport operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Step the demo scene at the fixed timestep and report the player
    Simulate {
        /// Number of fixed steps to run
        #[arg(short, long, default_value = "128")]
        steps: u32,
        /// Keys held for the whole run (e.g. "w", "Space")
        #[arg(long)]
        hold: Vec<String>,
        /// Emitter RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
    /// Render frames through the recording backend and print the commands
    Trace {
        /// Number of frames to draw
        #[arg(short, long, default_value = "1")]
        frames: u32,
        /// Render configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Draw straight to the surface without offscreen passes
        #[arg(long)]
        no_post_process: bool,
    },
    /// Print the default render configuration, or write it to a file
    Config {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Floor, player, crate, emitter and a camera on a turntable.
struct Demo {
    scene: Scene,
    player: ObjectId,
    crate_id: ObjectId,
    camera: ObjectId,
}

fn demo_scene(seed: u64) -> anyhow::Result<Demo> {
    let registry = PropRegistry::with_builtins();
    let mut scene = Scene::new();

    scene.spawn(
        &registry,
        "prop_static",
        &ObjectArgs::new()
            .name("Floor")
            .position(Vec3::new(0.0, -0.5, 0.0))
            .hitbox(Hitbox::new(0.5, 10.0, -0.5, -10.0, 10.0))
            .mesh(primitives::plane_mesh(20.0, 20.0)),
    )?;
    let player = scene.spawn(
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
        &ObjectArgs::new().position(Vec3::new(-3.0, 0.0, 0.0)).seed(seed),
    )?;
    let camera = scene.spawn(&registry, "entity_camera", &ObjectArgs::new().name("Viewer"))?;
    Ok(Demo {
        scene,
        player,
        crate_id,
        camera,
    })
}

fn print_tree(nodes: &[SceneNode], depth: usize) {
    for node in nodes {
        println!("{:indent$}- {} ({})", "", node.name, node.type_name, indent = depth * 2);
        print_tree(&node.children, depth + 1);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("viewport-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", viewport_common::crate_info());
            println!("assets: {}", viewport_assets::crate_info());
            println!("input: {}", viewport_input::crate_info());
            println!("kernel: {}", viewport_kernel::crate_info());
            println!("scene: {}", viewport_scene::crate_info());
            println!("controls: {}", viewport_controls::crate_info());
            println!("render: {}", viewport_render::crate_info());
            let registry = PropRegistry::with_builtins();
            println!("types: {}", registry.type_names().collect::<Vec<_>>().join(", "));
        }
        Commands::Simulate { steps, hold, seed } => {
            let Demo {
                mut scene,
                player,
                crate_id,
                ..
            } = demo_scene(seed)?;
            let mut tasks = Scheduler::new();
            tasks.add_task(
                Animation::new(crate_id, AnimatedProperty::Rotation)
                    .with_keyframes([Vec3::ZERO, Vec3::new(0.0, std::f32::consts::TAU, 0.0)])
                    .with_duration(Duration::from_millis(500)),
            );
            let mut input = InputState::new();
            for name in &hold {
                let key = Key::from_name(name).with_context(|| format!("unknown key {name:?}"))?;
                tracing::info!(?key, "holding key");
                input.press(key);
            }

            println!("Simulating {steps} steps of {:?} (seed={seed})", DEFAULT_STEP);
            let mut clock = FrameClock::default().with_max_delta(DEFAULT_STEP * steps.max(1));
            let mut ran = 0;
            // The first regular frame always yields exactly one step.
            for elapsed in [DEFAULT_STEP, DEFAULT_STEP * steps.saturating_sub(1)] {
                if ran >= steps {
                    break;
                }
                tracing::debug!(?elapsed, ran, "advancing clock");
                ran += clock.run(elapsed, false, |step| {
                    scene.update(step, &input);
                    tasks.run(&mut scene, step).map(|_| ())
                })?;
            }

            let position = scene.global_position(player);
            let airborn = scene
                .get(player)
                .and_then(|object| object.entity.as_ref())
                .is_some_and(|entity| entity.airborn);
            if position.y < -1.0 {
                tracing::warn!(y = position.y, "player fell below the floor");
            }
            println!("Steps run: {ran}");
            println!("Player: x={:.3} y={:.3} z={:.3}", position.x, position.y, position.z);
            println!("Airborn: {airborn}");
            println!("Objects: {} (tasks left: {})", scene.len(), tasks.len());
            print_tree(&scene.scene_graph(), 0);
        }
        Commands::Trace {
            frames,
            config,
            no_post_process,
        } => {
            let mut config = match &config {
                Some(path) => RenderConfig::load(path).with_context(|| format!("load {}", path.display()))?,
                None => RenderConfig::default(),
            };
            if no_post_process {
                config.post_process = false;
            }

            tracing::info!(frames, post_process = config.post_process, "tracing render commands");
            let Demo { mut scene, camera, .. } = demo_scene(42)?;
            let mut assets = ResourceStore::new();
            assets.register_image("checker", Image::placeholder());

            let mut turntable = scene
                .get_mut(camera)
                .map(|object| TurntableController::new(&mut object.transform))
                .unwrap_or_default();

            let mut renderer = Renderer::new(RecordingBackend::new(), config, 640, 480)?;
            println!("Passes: {}", renderer.pass_names().join(" -> "));
            for frame in 0..frames {
                renderer.backend_mut().clear_commands();
                if let Some(object) = scene.get_mut(camera) {
                    turntable.set_degrees(frame as f32 * 15.0, &mut object.transform);
                }
                let info = renderer.draw(&mut scene, &assets, Some(camera))?;
                println!("Frame {frame}: {info}");
            }
            print!("{}", renderer.backend().transcript());
            let created = renderer.backend().created();
            println!(
                "Created: textures={} targets={} programs={} meshes={}",
                created.textures, created.targets, created.programs, created.meshes
            );
        }
        Commands::Config { out } => {
            let config = RenderConfig::default();
            match out {
                Some(path) => {
                    tracing::info!(path = %path.display(), "writing render config");
                    config.save(&path)?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", config.to_json()?),
            }
        }
    }

    Ok(())
}
