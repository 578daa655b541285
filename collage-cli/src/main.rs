use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use collage::{
    CaptionFontSource, CollageStudio, CollageStyle, CpuRasterizer, ExportFormat,
    FileLayoutGenerator, FilterStyle, LayoutDocument, Point, RenderSettings, Vec2, ViewportEvent,
};

#[derive(Parser, Debug)]
#[command(name = "collage", version, about = "Lay out, view and export photo collages")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a layout document against an image count.
    Validate(ValidateArgs),
    /// Print the generator prompt and response schema.
    Prompt(PromptArgs),
    /// Export a collage to `ai-collage.<png|jpeg>`.
    Export(ExportArgs),
    /// Apply viewport events and write what the viewport shows as a PNG.
    View(ViewArgs),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Layout document JSON.
    #[arg(long)]
    layout: PathBuf,

    /// Number of source images the layout must cover.
    #[arg(long)]
    count: usize,
}

#[derive(Args, Debug)]
struct PromptArgs {
    /// Number of images.
    #[arg(long)]
    count: usize,

    /// Minimal, Dynamic, Overlap, Grid or Polaroid.
    #[arg(long, default_value_t = CollageStyle::Dynamic)]
    style: CollageStyle,

    /// Background colour hint.
    #[arg(long, default_value = collage::DEFAULT_BACKGROUND_HEX)]
    color: String,
}

#[derive(Args, Debug)]
struct CollageInputs {
    /// Layout document JSON (a stored generator response).
    #[arg(long)]
    layout: PathBuf,

    /// Source images, in layout order.
    #[arg(required = true, num_args = 1..)]
    images: Vec<PathBuf>,

    /// Per-image filter as `index=none|grayscale|sepia|invert` (0-based index).
    #[arg(long = "filter")]
    filters: Vec<FilterArg>,

    /// Solid background colour (overrides the layout's colour).
    #[arg(long, conflicts_with = "background_image")]
    background_color: Option<String>,

    /// Background image, scaled to cover the container.
    #[arg(long)]
    background_image: Option<PathBuf>,

    /// Output width in pixels (defaults to the container width).
    #[arg(long)]
    width: Option<u32>,

    /// Font file for captions (defaults to `COLLAGE_CAPTION_FONT`, then system fonts).
    #[arg(long)]
    caption_font: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    inputs: CollageInputs,

    /// png or jpeg.
    #[arg(long, default_value_t = ExportFormat::Png)]
    format: ExportFormat,

    /// Directory to write into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct ViewArgs {
    #[command(flatten)]
    inputs: CollageInputs,

    /// Wheel step as `delta_y@x,y`; negative deltas zoom in.
    #[arg(long = "wheel", allow_hyphen_values = true)]
    wheels: Vec<WheelArg>,

    /// Drag as `dx,dy`, applied after all wheel steps.
    #[arg(long = "drag", allow_hyphen_values = true)]
    drags: Vec<DragArg>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Debug)]
struct FilterArg {
    index: usize,
    filter: FilterStyle,
}

impl FromStr for FilterArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index, filter) = s
            .split_once('=')
            .ok_or_else(|| format!("expected index=filter, got '{s}'"))?;
        Ok(Self {
            index: index
                .trim()
                .parse()
                .map_err(|e| format!("bad image index '{index}': {e}"))?,
            filter: filter.parse().map_err(|e| format!("{e}"))?,
        })
    }
}

#[derive(Clone, Copy, Debug)]
struct WheelArg {
    delta_y: f64,
    cursor: Point,
}

impl FromStr for WheelArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (delta, at) = s
            .split_once('@')
            .ok_or_else(|| format!("expected delta_y@x,y, got '{s}'"))?;
        let (x, y) = parse_pair(at)?;
        Ok(Self {
            delta_y: parse_f64(delta)?,
            cursor: Point::new(x, y),
        })
    }
}

#[derive(Clone, Copy, Debug)]
struct DragArg(Vec2);

impl FromStr for DragArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dx, dy) = parse_pair(s)?;
        Ok(Self(Vec2::new(dx, dy)))
    }
}

fn parse_f64(s: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| format!("bad number '{s}': {e}"))
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got '{s}'"))?;
    Ok((parse_f64(a)?, parse_f64(b)?))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Prompt(args) => cmd_prompt(args),
        Command::Export(args) => cmd_export(args),
        Command::View(args) => cmd_view(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let doc = LayoutDocument::from_path(&args.layout)?;
    doc.validate(args.count)
        .with_context(|| format!("layout '{}' is not usable", args.layout.display()))?;
    eprintln!(
        "ok: {} image boxes in a {}x{} container",
        doc.images.len(),
        doc.container.width,
        doc.container.height
    );
    Ok(())
}

fn cmd_prompt(args: PromptArgs) -> anyhow::Result<()> {
    println!(
        "{}",
        collage::generate::collage_prompt(args.count, args.style, &args.color)
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&collage::generate::layout_response_schema())?
    );
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut studio = load_studio(&args.inputs)?;
    let mut rasterizer = CpuRasterizer::new(render_settings(&args.inputs));
    let artifact = studio.export(args.format, &mut rasterizer)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let path = artifact.write_to(&args.out_dir)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_view(args: ViewArgs) -> anyhow::Result<()> {
    let mut studio = load_studio(&args.inputs)?;
    for w in &args.wheels {
        studio.handle_viewport(ViewportEvent::Wheel {
            delta_y: w.delta_y,
            cursor: w.cursor,
        });
    }
    for d in &args.drags {
        let start = Point::ORIGIN;
        studio.handle_viewport(ViewportEvent::PointerDown(start));
        studio.handle_viewport(ViewportEvent::PointerMove(start + d.0));
        studio.handle_viewport(ViewportEvent::PointerUp);
    }
    let view = studio.view_state();
    tracing::debug!(scale = view.scale, tx = view.translation.x, ty = view.translation.y, "view");

    let mut rasterizer = CpuRasterizer::new(render_settings(&args.inputs));
    let frame = studio.snapshot(&mut rasterizer)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} (scale {:.3}, translation {:.1},{:.1})",
        args.out.display(),
        view.scale,
        view.translation.x,
        view.translation.y
    );
    Ok(())
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read '{}'", path.display()))
}

fn load_studio(inputs: &CollageInputs) -> anyhow::Result<CollageStudio> {
    let mut studio = CollageStudio::new();
    for path in &inputs.images {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        studio
            .add_image(&name, read(path)?)
            .with_context(|| format!("add image '{}'", path.display()))?;
    }

    let mut generator = FileLayoutGenerator::new(&inputs.layout);
    studio
        .generate_collage(&mut generator)
        .with_context(|| format!("install layout '{}'", inputs.layout.display()))?;

    if let Some(hex) = &inputs.background_color {
        studio.set_background_color(hex)?;
    }
    if let Some(path) = &inputs.background_image {
        let name = path.to_string_lossy();
        studio
            .set_background_image(&name, &read(path)?)
            .with_context(|| format!("load background '{}'", path.display()))?;
    }

    let ids: Vec<_> = studio.images().iter().map(|img| img.id()).collect();
    for f in &inputs.filters {
        let id = ids
            .get(f.index)
            .copied()
            .with_context(|| format!("--filter index {} out of range (0..{})", f.index, ids.len()))?;
        studio.set_filter(id, f.filter)?;
    }
    Ok(studio)
}

fn render_settings(inputs: &CollageInputs) -> RenderSettings {
    RenderSettings {
        output_width: inputs.width,
        caption_font: inputs
            .caption_font
            .clone()
            .map(CaptionFontSource::File)
            .unwrap_or_default(),
        ..RenderSettings::default()
    }
}
