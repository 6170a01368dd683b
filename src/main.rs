//! Moongen CLI - procedural lunar terrain generator.
//!
//! Builds a cratered heightfield, exports it and optionally writes the
//! camera placements an external renderer needs.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use moongen::config::{ConfigError, TerrainConfig};
use moongen::export::{self, ExportError, RawFormat};
use moongen::pipeline::{PipelineError, SleepGovernor, TerrainBuilder};
use moongen::terrain::RockStyle;
use moongen::{plan_cameras, TerrainError};

/// Procedural lunar terrain generator.
#[derive(Parser)]
#[command(name = "moongen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a terrain and export it.
    Generate {
        /// TOML configuration file; flags below override its values.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Start from a named preset instead of the defaults.
        #[arg(long, conflicts_with = "config")]
        preset: Option<Preset>,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Side length of the square terrain.
        #[arg(long)]
        size: Option<f32>,

        /// Grid cells per side.
        #[arg(long)]
        subdivisions: Option<u32>,

        /// Number of decorative rocks.
        #[arg(long)]
        rocks: Option<u32>,

        /// Number of hills.
        #[arg(long)]
        hills: Option<u32>,

        /// Number of depressions.
        #[arg(long)]
        depressions: Option<u32>,

        /// Number of large craters.
        #[arg(long)]
        craters: Option<u32>,

        /// Number of small craters.
        #[arg(long)]
        small_craters: Option<u32>,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "moon")]
        name: String,

        /// Export format.
        #[arg(short, long, default_value = "png")]
        format: OutputFormat,

        /// Also write NAME_cameras.json with the default camera sweep.
        #[arg(long)]
        cameras: bool,

        /// Sleep factor between batches; 0 disables throttling.
        #[arg(long, default_value = "0")]
        pause_factor: f32,

        /// Write the effective configuration to this TOML file.
        #[arg(long)]
        save_config: Option<PathBuf>,
    },

    /// Display size estimates for a terrain configuration.
    Info {
        /// Grid cells per side.
        #[arg(long, default_value = "100")]
        subdivisions: u32,

        /// Number of decorative rocks.
        #[arg(long, default_value = "1000")]
        rocks: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Flat plain with dense small craters.
    Mare,
    /// Rough terrain with many hills and craters.
    Highlands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// 16-bit PNG heightmap (universal compatibility).
    Png,
    /// 16-bit RAW little-endian (Unity).
    Raw,
    /// 32-bit float RAW (high precision).
    RawFloat,
    /// Wavefront OBJ of the full mesh, rocks included.
    Obj,
    /// JSON mesh snapshot.
    Json,
}

impl From<OutputFormat> for export::ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Png => export::ExportFormat::Png,
            OutputFormat::Raw => export::ExportFormat::Raw(RawFormat::R16LittleEndian),
            OutputFormat::RawFloat => export::ExportFormat::Raw(RawFormat::R32Float),
            OutputFormat::Obj => export::ExportFormat::Obj,
            OutputFormat::Json => export::ExportFormat::Json,
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Error during generation: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error("Camera placement failed: {0}")]
    Camera(#[from] TerrainError),
}

/// Flags that override configuration values.
struct Overrides {
    seed: Option<u64>,
    size: Option<f32>,
    subdivisions: Option<u32>,
    rocks: Option<u32>,
    hills: Option<u32>,
    depressions: Option<u32>,
    craters: Option<u32>,
    small_craters: Option<u32>,
}

impl Overrides {
    fn apply(self, config: &mut TerrainConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(subdivisions) = self.subdivisions {
            config.subdivisions = subdivisions;
        }
        if let Some(count) = self.rocks {
            config.rocks.count = count;
        }
        if let Some(count) = self.hills {
            config.hills.count = count;
        }
        if let Some(count) = self.depressions {
            config.depressions.count = count;
        }
        if let Some(count) = self.craters {
            config.craters.count = count;
        }
        if let Some(count) = self.small_craters {
            config.small_craters.count = count;
        }
    }
}

struct GenerateArgs {
    config: Option<PathBuf>,
    preset: Option<Preset>,
    overrides: Overrides,
    output: PathBuf,
    name: String,
    format: OutputFormat,
    cameras: bool,
    pause_factor: f32,
    save_config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            config,
            preset,
            seed,
            size,
            subdivisions,
            rocks,
            hills,
            depressions,
            craters,
            small_craters,
            output,
            name,
            format,
            cameras,
            pause_factor,
            save_config,
        } => run_generate(GenerateArgs {
            config,
            preset,
            overrides: Overrides {
                seed,
                size,
                subdivisions,
                rocks,
                hills,
                depressions,
                craters,
                small_craters,
            },
            output,
            name,
            format,
            cameras,
            pause_factor,
            save_config,
        }),
        Commands::Info {
            subdivisions,
            rocks,
        } => {
            run_info(subdivisions, rocks);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let mut config = match (&args.config, args.preset) {
        (Some(path), _) => TerrainConfig::load(path)?,
        (None, Some(Preset::Mare)) => TerrainConfig::mare(42),
        (None, Some(Preset::Highlands)) => TerrainConfig::highlands(42),
        (None, None) => TerrainConfig::default(),
    };
    args.overrides.apply(&mut config);
    config.validate()?;

    if let Some(path) = &args.save_config {
        config.save(path)?;
        println!("Saved configuration to {}", path.display());
    }

    println!("Moongen - Lunar Terrain Generator");
    println!("=================================");
    println!(
        "Terrain: {} x {} ({} subdivisions)",
        config.size, config.size, config.subdivisions
    );
    println!("Seed: {}", config.seed);
    println!(
        "Features: {} rocks, {} hills, {} depressions, {} craters, {} small craters",
        config.rocks.count,
        config.hills.count,
        config.depressions.count,
        config.craters.count,
        config.small_craters.count
    );
    println!("Output: {}", args.output.display());

    let start = Instant::now();

    println!("\nRunning generation pipeline...");
    let mut builder = TerrainBuilder::new(config);
    if args.pause_factor > 0.0 {
        builder = builder.with_governor(SleepGovernor::new(args.pause_factor));
        println!("Throttling enabled: pause factor {}", args.pause_factor);
    }

    let terrain = builder.build_with_callbacks(
        |name, i, total| {
            println!("  [{}/{}] Starting: {}", i + 1, total, name);
        },
        |name, i, total| {
            println!("  [{}/{}] Completed: {}", i + 1, total, name);
        },
    )?;

    let gen_time = start.elapsed();
    println!("Generation completed in {:.2?}", gen_time);

    let mesh = terrain.mesh();
    let summary = terrain.summary();
    let (min_h, max_h) = summary.elevation_range;
    println!(
        "Mesh: {} vertices ({} surface), {} triangles",
        mesh.vertex_count(),
        mesh.surface_vertex_count(),
        mesh.triangle_count()
    );
    println!("Surface height range: [{:.4}, {:.4}]", min_h, max_h);
    if summary.clamped > 0 {
        println!("Clamped vertices: {}", summary.clamped);
    }

    println!("\nExporting...");
    let path = export::export_terrain(mesh, &args.output, &args.name, args.format.into())?;
    println!("  Wrote {}", path.display());

    if args.cameras {
        let cameras = plan_cameras(&terrain.height_query())?;
        let camera_path = args.output.join(format!("{}_cameras.json", args.name));
        export::write_json(&cameras, &camera_path)?;
        println!("  Wrote {} ({} cameras)", camera_path.display(), cameras.len());
    }

    let total_time = start.elapsed();
    println!("\nDone in {:.2?}", total_time);
    Ok(())
}

fn run_info(subdivisions: u32, rocks: u32) {
    let resolution = subdivisions as u64 + 1;
    let surface_vertices = resolution * resolution;
    let surface_triangles = 2 * (subdivisions as u64) * (subdivisions as u64);

    let style = RockStyle::default();
    let rock_vertices = rocks as u64 * style.vertices_per_rock() as u64;
    let rock_triangles = rocks as u64 * style.triangles_per_rock() as u64;

    let vertices = surface_vertices + rock_vertices;
    let triangles = surface_triangles + rock_triangles;

    let bytes_positions = vertices * 8; // Vec2
    let bytes_elevations = vertices * 4; // f32
    let bytes_triangles = triangles * 12; // [u32; 3]
    let bytes_index = surface_vertices * 12; // points + bucket entries
    let bytes_png = surface_vertices * 2;
    let bytes_raw_r16 = surface_vertices * 2;
    let bytes_raw_r32 = surface_vertices * 4;

    println!("Moongen - Terrain Configuration Info");
    println!("====================================");
    println!();
    println!("Grid: {}x{} vertices ({} subdivisions)", resolution, resolution, subdivisions);
    println!(
        "Rocks: {} ({} vertices, {} triangles each)",
        rocks,
        style.vertices_per_rock(),
        style.triangles_per_rock()
    );
    println!();
    println!("Element counts:");
    println!("  Surface vertices:  {:>12}", surface_vertices);
    println!("  Rock vertices:     {:>12}", rock_vertices);
    println!("  Total vertices:    {:>12}", vertices);
    println!("  Total triangles:   {:>12}", triangles);
    println!();
    println!("Memory usage (in-memory):");
    println!("  Positions:   {:>12} bytes ({:.2} MB)", bytes_positions, mb(bytes_positions));
    println!("  Elevations:  {:>12} bytes ({:.2} MB)", bytes_elevations, mb(bytes_elevations));
    println!("  Triangles:   {:>12} bytes ({:.2} MB)", bytes_triangles, mb(bytes_triangles));
    println!("  Height index:{:>12} bytes ({:.2} MB)", bytes_index, mb(bytes_index));
    let total_memory = bytes_positions + bytes_elevations + bytes_triangles + bytes_index;
    println!("  Total:       {:>12} bytes ({:.2} MB)", total_memory, mb(total_memory));
    println!();
    println!("Export file sizes:");
    println!("  PNG (16-bit):   {:>10} bytes ({:.2} MB) uncompressed", bytes_png, mb(bytes_png));
    println!("  RAW (R16):      {:>10} bytes ({:.2} MB)", bytes_raw_r16, mb(bytes_raw_r16));
    println!("  RAW (R32):      {:>10} bytes ({:.2} MB)", bytes_raw_r32, mb(bytes_raw_r32));
    println!();

    // Engine compatibility notes
    println!("Engine compatibility notes:");
    if is_power_of_two(subdivisions) {
        println!("  Unity:    OK (2^n + 1 vertices per side)");
        println!("  Unreal:   OK (2^n + 1 vertices per side)");
    } else {
        println!("  Unity:    Requires 2^n + 1 vertices per side");
        println!("  Unreal:   Prefers power-of-2 subdivisions");
    }
}

fn mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

fn is_power_of_two(n: u32) -> bool {
    n > 0 && (n & (n - 1)) == 0
}
