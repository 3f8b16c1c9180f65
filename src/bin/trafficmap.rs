use std::{
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "trafficmap", version)]
struct Cli {
    /// Log lifecycle transitions and diagnostics to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump assembled frames as JSON, one report per tick.
    Frames(FramesArgs),
    /// Render the frame after a given number of ticks as a PNG.
    Frame(FrameArgs),
    /// Print traffic counters for a batch.
    Stats(StatsArgs),
}

#[derive(Parser, Debug)]
struct FramesArgs {
    /// Input batch JSON (array of events).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Layer config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of ticks to run.
    #[arg(long, default_value_t = 200)]
    ticks: usize,

    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input batch JSON (array of events).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Layer config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticks to advance before rendering (0 = initial frame).
    #[arg(long, default_value_t = 0)]
    tick: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Screen pixels per unit of arc height.
    #[arg(long, default_value_t = 1.0)]
    height_px: f64,
}

#[derive(Parser, Debug)]
struct StatsArgs {
    /// Input batch JSON (array of events).
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Frames(args) => cmd_frames(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Stats(args) => cmd_stats(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_batch_json(path: &Path) -> anyhow::Result<trafficmap::Dataset> {
    let f = File::open(path).with_context(|| format!("open batch '{}'", path.display()))?;
    let r = BufReader::new(f);
    let events: Vec<trafficmap::ArcEvent> =
        serde_json::from_reader(r).with_context(|| "parse batch JSON")?;
    Ok(Arc::from(events))
}

fn read_config(path: Option<&Path>) -> anyhow::Result<trafficmap::LayerConfig> {
    Ok(match path {
        Some(p) => trafficmap::LayerConfig::from_path(p)?,
        None => trafficmap::LayerConfig::default(),
    })
}

fn make_layer(
    data: trafficmap::Dataset,
    config: trafficmap::LayerConfig,
) -> anyhow::Result<trafficmap::ArcLayer<trafficmap::ManualScheduler>> {
    let props = trafficmap::ArcLayerProps::new(config);
    let mut layer = trafficmap::ArcLayer::with_data(
        "arcs",
        props,
        trafficmap::ManualScheduler::new(),
        data,
    )?;
    layer.create()?;
    Ok(layer)
}

fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let data = read_batch_json(&args.in_path)?;
    let config = read_config(args.config.as_deref())?;
    let mut layer = make_layer(data, config)?;

    let initial = layer.render();
    let reports = trafficmap::FrameLoop::new().run(&mut layer, args.ticks);
    let doc = serde_json::json!({
        "initial": initial,
        "frames": reports,
    });

    match &args.out {
        Some(out) => {
            create_parent_dir(out)?;
            let f = File::create(out).with_context(|| format!("create '{}'", out.display()))?;
            let mut w = BufWriter::new(f);
            serde_json::to_writer_pretty(&mut w, &doc)
                .with_context(|| format!("write frames '{}'", out.display()))?;
            w.flush()?;
            eprintln!("wrote {} ({} frames)", out.display(), reports.len());
        }
        None => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            serde_json::to_writer_pretty(&mut w, &doc).with_context(|| "write frames to stdout")?;
            writeln!(w)?;
        }
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let data = read_batch_json(&args.in_path)?;
    let config = read_config(args.config.as_deref())?;
    let canvas = trafficmap::Canvas::new(args.width, args.height)?;
    let viewport = trafficmap::Viewport::fit(canvas, &data, 2.0).with_height_px(args.height_px);

    let mut layer = make_layer(data, config)?;
    trafficmap::FrameLoop::new().run(&mut layer, args.tick);
    let assembled = layer.render();

    let settings = trafficmap::RenderSettings {
        clear_rgba: Some([18, 20, 28, 255]),
    };
    let frame = trafficmap::render_frame(&assembled, &viewport, &settings)?;

    create_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} (progress {:.3}, {} primitives)",
        args.out.display(),
        assembled.progress,
        assembled.primitives.len()
    );
    Ok(())
}

fn cmd_stats(args: StatsArgs) -> anyhow::Result<()> {
    let data = read_batch_json(&args.in_path)?;
    let mut store = trafficmap::StatsStore::new();
    store.record_batch(&data);
    println!("{}", serde_json::to_string_pretty(&store.get())?);
    Ok(())
}
