use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, Rgba, RgbaImage};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use treepack_core::compositing::fill_rgba;
use treepack_core::{
    InputImage, Layout, ManifestFormat, PackOutput, PackerConfig, TraversalOrder, pack_images,
    pack_layout, writer_for,
};
use walkdir::WalkDir;

/// Extensions read as inputs and accepted for the atlas image.
const IMAGE_FORMATS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

#[derive(Parser, Debug)]
#[command(
    name = "treepack",
    about = "Pack images into a single square texture atlas",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack images into an atlas (PNG + manifest)
    Pack(PackArgs),
    /// Layout-only export: read image sizes, write the manifest, no PNG
    Layout(PackArgs),
    /// Pack a synthetic batch of random rectangles and print timing
    Bench(BenchArgs),
}

/// Options shared by every subcommand that packs.
#[derive(Args, Debug, Clone)]
struct LayoutOpts {
    /// First canvas side tried
    #[arg(long, default_value_t = 512, help_heading = "Layout")]
    initial_size: u32,
    /// Pixels kept clear around each image
    #[arg(long, default_value_t = 1, help_heading = "Layout")]
    padding: u32,
    /// Largest canvas side allowed
    #[arg(long, default_value_t = 16384, help_heading = "Layout")]
    max_size: u32,
    /// Placement order in the manifest: pre | in | post
    #[arg(long, default_value = "pre", help_heading = "Layout")]
    order: String,
    /// Draw red outlines (debug)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    outlines: bool,
    /// Leave out images too large for --max-size instead of failing
    #[arg(short = 'i', long, alias = "ignore-large-image", default_value_t = false, help_heading = "Layout")]
    ignore_large_images: bool,
    /// YAML config file path (fields override the options above)
    #[arg(long, help_heading = "Layout")]
    config: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Layout")]
    print_config_format: String,
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.<image-format> and name.json/.lua)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// Atlas image format: png | jpg | jpeg | bmp | webp
    #[arg(long, default_value = "png", value_parser = IMAGE_FORMATS, help_heading = "Input/Output")]
    image_format: String,
    /// JPEG quality (1-100); other formats ignore it
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(1..=100), help_heading = "Input/Output")]
    quality: u8,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    #[command(flatten)]
    layout: LayoutOpts,

    /// Manifest format: json | json-hash | lua
    #[arg(long, default_value = "json", help_heading = "Export")]
    format: String,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Number of random images
    #[arg(long, default_value_t = 2800)]
    count: usize,
    /// Smallest side of a random image
    #[arg(long, default_value_t = 5)]
    min: u32,
    /// Largest side of a random image
    #[arg(long, default_value_t = 25)]
    max: u32,
    /// RNG seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Write a PNG with every placement painted a random colour
    #[arg(long)]
    preview: Option<PathBuf>,

    #[command(flatten)]
    layout: LayoutOpts,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet, false),
        Commands::Layout(args) => run_pack(args, false, true),
        Commands::Bench(b) => run_bench(b),
    }
}

fn build_config(opts: &LayoutOpts) -> anyhow::Result<PackerConfig> {
    let export_order: TraversalOrder = opts
        .order
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown traversal order: {}", opts.order))?;
    let base = PackerConfig {
        initial_size: opts.initial_size,
        padding: opts.padding,
        max_size: opts.max_size,
        export_order,
        texture_outlines: opts.outlines,
        ignore_large_images: opts.ignore_large_images,
    };
    // Load config file if provided; its fields win over the command line
    let cfg = if let Some(path) = &opts.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse {}", path.display()))?;
        y.into_packer_config(base)?
    } else {
        base
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Returns true when the config was printed and the command should stop.
fn maybe_print_config(opts: &LayoutOpts, cfg: &PackerConfig) -> anyhow::Result<bool> {
    if !opts.print_config {
        return Ok(false);
    }
    match opts.print_config_format.as_str() {
        "yaml" => println!("{}", serde_yaml::to_string(cfg)?),
        _ => println!("{}", serde_json::to_string_pretty(cfg)?),
    }
    Ok(true)
}

fn run_pack(cli: &PackArgs, show_progress: bool, layout_only: bool) -> anyhow::Result<()> {
    let cfg = build_config(&cli.layout)?;
    if maybe_print_config(&cli.layout, &cfg)? {
        return Ok(());
    }
    let format: ManifestFormat = cli
        .format
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown manifest format: {}", cli.format))?;

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let texture = format!("{}.{}", cli.name, cli.image_format);
    let start = Instant::now();

    let layout = if layout_only {
        let items = read_dimensions(&cli.input, &paths);
        info!(count = items.len(), "read image sizes");
        pack_layout(items, cfg)?
    } else {
        let inputs = load_images_with_progress(&cli.input, &paths, show_progress)?;
        info!(count = inputs.len(), "loaded input images");
        let PackOutput { layout, rgba } = pack_images(inputs, cfg)?;
        if !cli.dry_run {
            let atlas_path = cli.out_dir.join(&texture);
            save_atlas(rgba, &atlas_path, cli.quality)?;
            info!(?atlas_path, size = layout.size, "atlas written");
        }
        layout
    };
    for key in &layout.skipped {
        warn!(%key, "image too large for the atlas, skipped");
    }
    debug!(elapsed = %fmt_dur(start.elapsed()), "packed");

    let writer = writer_for(format);
    let manifest = writer.render(&layout, &texture)?;
    if !cli.dry_run {
        let manifest_path = cli
            .out_dir
            .join(format!("{}.{}", cli.name, writer.extension()));
        fs::write(&manifest_path, manifest)
            .with_context(|| format!("write {}", manifest_path.display()))?;
        info!(?manifest_path, placements = layout.placements.len(), "manifest written");
    }

    let stats = layout.stats();
    info!(
        size = layout.size,
        attempts = layout.attempts,
        "{}",
        stats.summary()
    );
    if let Some(stats_path) = &cli.export_stats {
        if !cli.dry_run {
            fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        } else {
            println!(
                "size={} attempts={} placements={} occupancy={:.2}%",
                layout.size,
                layout.attempts,
                stats.num_placements,
                stats.occupancy * 100.0
            );
        }
    }
    Ok(())
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    let cfg = build_config(&b.layout)?;
    if maybe_print_config(&b.layout, &cfg)? {
        return Ok(());
    }
    if b.min == 0 || b.min > b.max {
        anyhow::bail!("invalid side range {}..={}", b.min, b.max);
    }
    let seed = b.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let items: Vec<(String, u32, u32)> = (0..b.count)
        .map(|i| {
            let w = rng.gen_range(b.min..=b.max);
            let h = rng.gen_range(b.min..=b.max);
            (format!("img_{i:05}"), w, h)
        })
        .collect();

    let start = Instant::now();
    let layout = pack_layout(items, cfg)?;
    let dur = start.elapsed();
    let stats = layout.stats();
    println!(
        "size={} attempts={} images={} occupancy={:.2}% seed={} time={}",
        layout.size,
        layout.attempts,
        stats.num_placements,
        stats.occupancy * 100.0,
        seed,
        fmt_dur(dur)
    );

    if let Some(path) = &b.preview {
        let canvas = render_preview(&layout, &mut rng);
        canvas
            .save(path)
            .with_context(|| format!("write {}", path.display()))?;
        info!(?path, "preview written");
    }
    Ok(())
}

/// JPEG drops alpha and honours `quality`; every other format is picked from
/// the file extension.
fn save_atlas(rgba: RgbaImage, path: &Path, quality: u8) -> anyhow::Result<()> {
    let is_jpeg = matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())
            .as_deref(),
        Some("jpg") | Some("jpeg")
    );
    if is_jpeg {
        let file = fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
        DynamicImage::ImageRgba8(rgba)
            .to_rgb8()
            .write_with_encoder(encoder)
            .with_context(|| format!("write {}", path.display()))?;
    } else {
        rgba.save(path)
            .with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

fn render_preview(layout: &Layout, rng: &mut StdRng) -> RgbaImage {
    let mut canvas = RgbaImage::new(layout.size, layout.size);
    for p in &layout.placements {
        let color = Rgba([rng.r#gen(), rng.r#gen(), rng.r#gen(), 255]);
        fill_rgba(&mut canvas, p.content_rect(), color);
    }
    canvas
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("glob {pat}"))?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if exclude.is_some_and(|ex| ex.is_match(&s)) {
        return true;
    }
    include.is_some_and(|inc| !inc.is_match(&s))
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())
            .as_deref(),
        Some(ext) if IMAGE_FORMATS.contains(&ext)
    )
}

/// Manifest key: path relative to the input root, forward slashes.
fn key_for(root: &Path, p: &Path) -> String {
    let rel = match p.strip_prefix(root) {
        Ok(r) if !r.as_os_str().is_empty() => r,
        _ => p.file_name().map(Path::new).unwrap_or(p),
    };
    rel.to_string_lossy().replace('\\', "/")
}

fn read_dimensions(root: &Path, paths: &[PathBuf]) -> Vec<(String, u32, u32)> {
    let mut items = Vec::with_capacity(paths.len());
    for p in paths {
        match image::image_dimensions(p) {
            Ok((w, h)) => items.push((key_for(root, p), w, h)),
            Err(e) => error!(?p, error = %e, "skip image"),
        }
    }
    items
}

fn load_images_with_progress(
    root: &Path,
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<Vec<InputImage>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(img) => list.push(InputImage {
                key: key_for(root, p),
                image: img,
            }),
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    initial_size: Option<u32>,
    padding: Option<u32>,
    max_size: Option<u32>,
    export_order: Option<String>,
    texture_outlines: Option<bool>,
    ignore_large_images: Option<bool>,
}

impl YamlConfig {
    fn into_packer_config(self, mut cfg: PackerConfig) -> anyhow::Result<PackerConfig> {
        if let Some(v) = self.initial_size {
            cfg.initial_size = v;
        }
        if let Some(v) = self.padding {
            cfg.padding = v;
        }
        if let Some(v) = self.max_size {
            cfg.max_size = v;
        }
        if let Some(v) = self.export_order {
            cfg.export_order = v
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown export_order: {}", v))?;
        }
        if let Some(v) = self.texture_outlines {
            cfg.texture_outlines = v;
        }
        if let Some(v) = self.ignore_large_images {
            cfg.ignore_large_images = v;
        }
        Ok(cfg)
    }
}
