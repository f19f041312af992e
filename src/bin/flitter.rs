use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use flitter::render::cpu::CpuRenderer;
use flitter::render::renderer::RenderSettings;
use flitter::scene::sprite::{Sprite, SpriteSheet};
use flitter::{Color, RuntimeConfig, Scene, Stage};

#[derive(Parser, Debug)]
#[command(name = "flitter", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the frames and animations of a sprite sheet.
    Inspect(InspectArgs),
    /// Render a sprite-sheet animation to numbered PNG frames.
    Sprite(SpriteArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input sprite sheet JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SpriteArgs {
    /// Input sprite sheet JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Animation to play; cycles through every frame when omitted.
    #[arg(long)]
    animation: Option<String>,

    /// Number of frames to render.
    #[arg(long, default_value_t = 24)]
    frames: u32,

    /// Output directory for `frame_NNNN.png` files.
    #[arg(long)]
    out_dir: PathBuf,

    /// Runtime configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Sprite(args) => cmd_sprite(args),
    }
}

fn open_sheet(path: &Path) -> anyhow::Result<SpriteSheet> {
    SpriteSheet::open(path).with_context(|| format!("load sprite sheet '{}'", path.display()))
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let sheet = open_sheet(&args.in_path)?;
    println!("frames: {}", sheet.frame_count());
    if let Some(fps) = sheet.framerate() {
        println!("framerate: {fps}");
    }
    for (name, anim) in sheet.animations() {
        let next = anim.next.as_deref().unwrap_or("-");
        println!(
            "{name}: {} frames, next {next}, speed {}",
            anim.frames.len(),
            anim.speed
        );
    }
    Ok(())
}

fn cmd_sprite(args: SpriteArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => RuntimeConfig::from_path(path)?,
        None => RuntimeConfig::default(),
    }
    .with_env_overrides();
    config.validate()?;

    let sheet = Arc::new(open_sheet(&args.in_path)?);
    // Frame size and registration extremes decide the canvas.
    let (mut width, mut height, mut reg_x, mut reg_y) = (1.0_f64, 1.0_f64, 0.0_f64, 0.0_f64);
    for frame in (0..sheet.frame_count()).filter_map(|i| sheet.frame(i)) {
        width = width.max(frame.rect.width());
        height = height.max(frame.rect.height());
        reg_x = reg_x.max(frame.reg_x);
        reg_y = reg_y.max(frame.reg_y);
    }

    let mut sprite = Sprite::new(Arc::clone(&sheet));
    match &args.animation {
        Some(name) => sprite.goto_and_play(name.as_str())?,
        None => sprite.goto_and_play(0.0)?,
    }

    let mut scene = Scene::new(config);
    let node = scene.create_sprite(sprite);
    if let Some(n) = scene.node_mut(node) {
        n.set_position(reg_x, reg_y);
    }
    scene.add_child(scene.root(), node)?;

    let mut settings = RenderSettings::new(
        (width + reg_x).ceil() as u32,
        (height + reg_y).ceil() as u32,
    );
    settings.clear = Some(Color::TRANSPARENT);
    let renderer = CpuRenderer::new(&settings).context("create cpu renderer")?;
    let mut stage = Stage::new(scene, renderer);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let interval = stage.ticker().interval();
    for i in 0..args.frames {
        stage.update(f64::from(i) * interval);
        let out = args.out_dir.join(format!("frame_{i:04}.png"));
        stage
            .renderer()
            .save_png(&out)
            .with_context(|| format!("write png '{}'", out.display()))?;
    }

    eprintln!("wrote {} frames to {}", args.frames, args.out_dir.display());
    Ok(())
}
