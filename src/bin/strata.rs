use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Layered document compositor")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a document manifest into a PNG.
    Render(RenderArgs),
    /// Print document information, layers and diagnostics as JSON.
    Info(InfoArgs),
    /// Render several manifests, optionally in parallel.
    Batch(BatchArgs),
    /// Print one layer's information, optionally writing a standalone preview.
    Layer(LayerArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input document manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Render only the layer with this ID.
    #[arg(long)]
    layer: Option<i64>,

    /// Composite over white and write RGB instead of raw RGBA.
    #[arg(long)]
    flatten: bool,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input document manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Input document manifests; repeat for each document.
    #[arg(long = "in", required = true)]
    in_paths: Vec<PathBuf>,

    /// Directory receiving one `<manifest stem>.png` per input.
    #[arg(long)]
    out_dir: PathBuf,

    /// Render documents on a worker pool.
    #[arg(long)]
    parallel: bool,

    /// Worker count for `--parallel`.
    #[arg(long)]
    threads: Option<usize>,

    /// Composite over white and write RGB instead of raw RGBA.
    #[arg(long)]
    flatten: bool,
}

#[derive(Parser, Debug)]
struct LayerArgs {
    /// Input document manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    select: LayerSelect,

    /// Write the layer at its own size, opacity folded into alpha.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = true)]
struct LayerSelect {
    /// Layer ID; tried before `--name`.
    #[arg(long)]
    id: Option<i64>,

    /// Layer name.
    #[arg(long)]
    name: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Info(args) => cmd_info(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Layer(args) => cmd_layer(args),
    }
}

fn read_document(path: &Path) -> anyhow::Result<strata::Document> {
    strata::Document::from_manifest(path)
        .with_context(|| format!("load document '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    let opts = match args.layer {
        Some(id) => strata::RenderOptions::single(strata::LayerId(id)),
        None => strata::RenderOptions::default(),
    };

    let out = strata::render_document(&doc, &opts);
    for s in &out.skipped {
        eprintln!("skipped layer {} '{}': {}", s.layer_id, s.name, s.reason);
    }
    write_png(&args.out, &out.image, args.flatten)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let record = strata::DocumentRecord::from_path(&args.in_path)
        .with_context(|| format!("read manifest '{}'", args.in_path.display()))?;
    let doc = read_document(&args.in_path)?;

    let mut diagnostics = record.diagnose();
    diagnostics.extend(doc.diagnose());

    let report = serde_json::json!({
        "document": doc.info(),
        "layers": doc.layer_list(),
        "diagnostics": diagnostics,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize info report")?
    );
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let docs = args
        .in_paths
        .iter()
        .map(|p| read_document(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let threading = strata::RenderThreading {
        parallel: args.parallel,
        threads: args.threads,
    };
    let outputs =
        strata::render_documents(&docs, &strata::RenderOptions::default(), &threading)?;

    for (path, out) in args.in_paths.iter().zip(&outputs) {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("manifest path '{}' has no file stem", path.display()))?;
        let dest = args.out_dir.join(format!("{stem}.png"));
        write_png(&dest, &out.image, args.flatten)?;
        eprintln!(
            "wrote {} ({} layers, {} skipped)",
            dest.display(),
            out.composited,
            out.skipped.len()
        );
    }
    Ok(())
}

fn cmd_layer(args: LayerArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    let query = strata::LayerQuery {
        id: args.select.id.map(strata::LayerId),
        name: args.select.name,
    };
    let layer = doc.require_layer(&query)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&layer.info()).context("serialize layer info")?
    );

    if let Some(out) = &args.out {
        let preview = strata::render_single_layer(layer)?;
        write_png(out, &preview, false)?;
        eprintln!("wrote {}", out.display());
    }
    Ok(())
}

fn write_png(path: &Path, img: &strata::PixelBuffer, flatten: bool) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let (data, color) = if flatten {
        (
            strata::flatten_over_white(img).to_rgb8()?,
            image::ColorType::Rgb8,
        )
    } else {
        (img.to_rgba8(), image::ColorType::Rgba8)
    };
    image::save_buffer_with_format(
        path,
        &data,
        img.width(),
        img.height(),
        color,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
