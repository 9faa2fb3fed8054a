use clap::{Parser, Subcommand};
use cli::{config_schema, summary, ConfigFile, DetectionReport};
use color_eyre::eyre::Result;
use shape_detect::{debug, DebugView, PipelineBuilder, PipelineConfig, ShapeError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

/// Exit code when the image holds no recognisable shape
const NO_SHAPE_EXIT_CODE: i32 = 2;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the shape in an image
    Detect {
        /// Path to the input image
        #[arg(short, long)]
        input: PathBuf,
        /// Pipeline configuration (.toml or .json); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Intermediate result to render: edges, lines or contours
        #[arg(long, requires = "debug_output")]
        debug: Option<DebugView>,
        /// Where to write the debug overlay
        #[arg(long, requires = "debug")]
        debug_output: Option<PathBuf>,
        /// Print the detection as JSON instead of a summary line
        #[arg(long)]
        json: bool,
    },
    /// Print the JSON schema of the configuration file
    Schema,
    /// Write the default configuration as TOML or JSON
    DefaultConfig {
        /// Output path; the extension picks the format
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Detect {
            input,
            config,
            debug,
            debug_output,
            json,
        } => {
            let found = detect(
                input,
                config.as_deref(),
                (*debug).zip(debug_output.as_deref()),
                *json,
            )?;
            if !found {
                std::process::exit(NO_SHAPE_EXIT_CODE);
            }
        }
        Commands::Schema => {
            println!("{}", config_schema()?);
        }
        Commands::DefaultConfig { output } => {
            PipelineConfig::default().to_file(output)?;
            info!("Default configuration saved to: {:?}", output);
        }
    }

    Ok(())
}

/// Returns whether a shape was found
fn detect(
    input: &Path,
    config_path: Option<&Path>,
    overlay: Option<(DebugView, &Path)>,
    json: bool,
) -> Result<bool> {
    let config = match config_path {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    let pipeline = PipelineBuilder::from_config(&config)?.build();

    let image = image::open(input)?.to_luma8();
    info!("Input image: {:?} ({}x{})", input, image.width(), image.height());

    let run = pipeline.run(&image)?;

    if let Some((view, output)) = overlay {
        debug::render(&run, &image, view).save(output)?;
        info!("{} overlay saved to: {:?}", view, output);
    }

    match run.detection() {
        Ok(detection) => {
            if json {
                println!("{}", DetectionReport::new(input, detection).to_json()?);
            } else {
                println!("{}", summary(detection));
            }
            Ok(true)
        }
        Err(ShapeError::NoShapeDetected) => {
            warn!("No shape detected in {:?}", input);
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}
