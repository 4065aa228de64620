//! sdf-trace CLI
//!
//! Compiles scene descriptions to GLSL, prints built-in demos and renders
//! scenes with the software tracer.

#![allow(clippy::uninlined_format_args, clippy::needless_pass_by_value)]

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use sdf_trace::prelude::*;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "sdf-trace")]
#[command(version = sdf_trace::VERSION)]
#[command(about = "Compile SDF scenes into a path-tracing fragment shader", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON scene description
    Compile {
        /// Scene description (.json)
        scene: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        options: OptionArgs,
    },

    /// Compile a built-in scene
    Demo {
        /// Scene name
        #[arg(value_enum)]
        name: Demo,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        options: OptionArgs,
    },

    /// Render a scene with the software tracer
    Render {
        /// Scene description (.json); ignored with --demo
        scene: Option<PathBuf>,
        /// Render a built-in scene instead
        #[arg(long, value_enum)]
        demo: Option<Demo>,
        /// Output image; the format follows the extension (.png, .ppm)
        #[arg(short, long)]
        output: PathBuf,
        /// Frames to accumulate
        #[arg(long, default_value = "1")]
        frames: u32,
        #[command(flatten)]
        options: OptionArgs,
    },
}

/// Overrides applied on top of the defaults or an options file
#[cfg(feature = "cli")]
#[derive(Args)]
struct OptionArgs {
    /// Options file (.json)
    #[arg(long = "options")]
    file: Option<PathBuf>,
    /// Image width
    #[arg(long)]
    width: Option<u32>,
    /// Image height
    #[arg(long)]
    height: Option<u32>,
    /// Hit tolerance
    #[arg(long)]
    epsilon: Option<f32>,
    /// Marching steps per bounce
    #[arg(long)]
    steps: Option<u32>,
    /// Bounces per sample
    #[arg(long)]
    bounces: Option<u32>,
    /// Extra samples per frame
    #[arg(long)]
    iterations: Option<u32>,
}

#[cfg(feature = "cli")]
impl OptionArgs {
    fn resolve(&self) -> Result<Options, OptionsError> {
        let mut options = match &self.file {
            Some(path) => Options::load(path)?,
            None => Options::default(),
        };
        if let Some(width) = self.width {
            options.width = width;
        }
        if let Some(height) = self.height {
            options.height = height;
        }
        if let Some(epsilon) = self.epsilon {
            options.epsilon = epsilon;
        }
        if let Some(steps) = self.steps {
            options.steps = steps;
        }
        if let Some(bounces) = self.bounces {
            options.bounces = bounces;
        }
        if let Some(iterations) = self.iterations {
            options.iterations = iterations;
        }
        options.validate()?;
        Ok(options)
    }
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            scene,
            output,
            options,
        } => cmd_compile(scene, output, options),
        Commands::Demo {
            name,
            output,
            options,
        } => cmd_demo(name, output, options),
        Commands::Render {
            scene,
            demo,
            output,
            frames,
            options,
        } => cmd_render(scene, demo, output, frames, options),
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI not enabled. Build with --features cli");
    std::process::exit(1);
}

#[cfg(feature = "cli")]
fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, error);
    std::process::exit(1);
}

#[cfg(feature = "cli")]
fn cmd_compile(scene: PathBuf, output: Option<PathBuf>, options: OptionArgs) {
    let options = options.resolve().unwrap_or_else(|e| fail("Options error", e));
    let scene = load_scene(&scene).unwrap_or_else(|e| fail("Scene error", e));
    write_program(&compile(&scene, &options), output.as_deref());
}

#[cfg(feature = "cli")]
fn cmd_demo(name: Demo, output: Option<PathBuf>, options: OptionArgs) {
    let options = options.resolve().unwrap_or_else(|e| fail("Options error", e));
    let scene = name.scene().unwrap_or_else(|e| fail("Scene error", e));
    write_program(&compile(&scene, &options), output.as_deref());
}

#[cfg(feature = "cli")]
fn write_program(glsl: &str, output: Option<&Path>) {
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, glsl) {
                fail("Write error", e);
            }
            println!("Wrote {} ({} bytes)", path.display(), glsl.len());
        }
        None => print!("{}", glsl),
    }
}

#[cfg(feature = "cli")]
fn cmd_render(scene: Option<PathBuf>, demo: Option<Demo>, output: PathBuf, frames: u32, options: OptionArgs) {
    let options = options.resolve().unwrap_or_else(|e| fail("Options error", e));
    let scene = match (demo, scene) {
        (Some(demo), _) => demo.scene(),
        (None, Some(path)) => load_scene(&path),
        (None, None) => fail("Usage error", "give a scene file or --demo"),
    }
    .unwrap_or_else(|e| fail("Scene error", e));

    let tracer = PathTracer::new(&scene, options).unwrap_or_else(|e| fail("Options error", e));
    let start = std::time::Instant::now();
    let accum = tracer.render(frames.max(1)).unwrap_or_else(|e| fail("Render error", e));
    tracing::info!(frames, elapsed_ms = start.elapsed().as_millis() as u64, "rendered");

    let image = tracer.present(&accum);
    if let Err(e) = sdf_trace::tracer::save(&image, &output) {
        fail("Write error", e);
    }
    println!(
        "Rendered {}x{} ({} frame(s)) -> {}",
        image.width(),
        image.height(),
        frames.max(1),
        output.display()
    );
}
