use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tilestore::{
    BackingStore, CpuCompositor, DisplayContext, IntPoint, IntSize, Rgba8Premul, SharedPool,
    StripedDocument, TileStoreConfig,
};

#[derive(Parser, Debug)]
#[command(name = "tilestore", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scroll a striped document through a backing store and write the last frame as a PNG.
    Simulate(SimulateArgs),
    /// Print the effective configuration as JSON.
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
struct ConfigArgs {
    /// Config JSON; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Config JSON; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured tile count (0 renders directly).
    #[arg(long)]
    tile_count: Option<usize>,

    /// Content size as WIDTHxHEIGHT.
    #[arg(long, default_value = "2000x3000", value_parser = parse_size)]
    content: IntSize,

    /// Viewport size as WIDTHxHEIGHT.
    #[arg(long, default_value = "1024x768", value_parser = parse_size)]
    viewport: IntSize,

    /// Zoom scale applied before scrolling.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Vertical scroll per step in pixels.
    #[arg(long, default_value_t = 200)]
    scroll_step: i32,

    /// Number of scroll steps.
    #[arg(long, default_value_t = 10)]
    steps: u32,

    /// Height of each color band in the document.
    #[arg(long, default_value_t = 48)]
    band: i32,

    /// Output PNG path for the last composited frame.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
        Command::Config(args) => cmd_config(args),
    }
}

fn parse_size(s: &str) -> Result<IntSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: i32 = w.trim().parse().map_err(|e| format!("width: {e}"))?;
    let h: i32 = h.trim().parse().map_err(|e| format!("height: {e}"))?;
    if w <= 0 || h <= 0 {
        return Err(format!("size must be positive, got {w}x{h}"));
    }
    Ok(IntSize::new(w, h))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TileStoreConfig> {
    let cfg = match path {
        Some(p) => TileStoreConfig::from_path(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => TileStoreConfig::default(),
    };
    Ok(cfg.with_env_overrides())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_ref())?;
    cfg.validate()?;
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_ref())?;
    if let Some(n) = args.tile_count {
        cfg.tile_count = n;
    }
    cfg.validate()?;

    let palette = vec![
        Rgba8Premul::from_straight_rgba(230, 57, 70, 255),
        Rgba8Premul::from_straight_rgba(241, 250, 238, 255),
        Rgba8Premul::from_straight_rgba(168, 218, 220, 255),
        Rgba8Premul::from_straight_rgba(69, 123, 157, 255),
        Rgba8Premul::from_straight_rgba(29, 53, 87, 255),
    ];
    let doc = StripedDocument::new(args.content, args.band, palette)?;

    let (compositor, frames) = CpuCompositor::new();
    let display = DisplayContext::spawn(Box::new(compositor))?;
    let shared = SharedPool::from_config(&cfg);
    let tick = cfg.tick_interval();
    let mut store = BackingStore::new(cfg, Box::new(doc), display.handle(), shared)?;

    store.set_viewport_size(args.viewport);
    store.acquire_lease();
    if (args.scale - 1.0).abs() > f64::EPSILON {
        store.set_scale(args.scale);
    }

    let mut now = Instant::now();
    store.tick(now);
    for step in 1..=args.steps {
        let y = i32::try_from(step)
            .ok()
            .and_then(|s| s.checked_mul(args.scroll_step))
            .context("scroll offset overflows")?;
        store.scroll_to(IntPoint::new(store.scroll_position().x, y));
        now += tick;
        store.tick(now);
    }

    // Every composite posted so far has run once this returns.
    display.handle().post_sync(|_| ())?;

    let stats = store.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);

    if let Some(out) = &args.out {
        let frame = frames.latest().context("no frame was composited")?;
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer_with_format(
            out,
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", out.display()))?;
        eprintln!("wrote {}", out.display());
    }
    Ok(())
}
