use clap::{Parser, Subcommand, ValueEnum};
use cli::ExportJob;
use color_eyre::eyre::{Result, eyre};
use passport::{
    EditorCommand, EncodedImage, ExportOutcome, PassportConfig, SegmentationOutcome,
    SegmentationProvider, Session, algorithms::normalize_encoded,
};
use segmentation::{GeminiConfig, GeminiSegmenter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaTarget {
    /// Editor command protocol
    Commands,
    /// Export job configuration file
    Job,
}

#[derive(Subcommand)]
enum Commands {
    /// List the supported passport formats
    Formats {
        /// Print density used for the pixel sizes
        #[arg(long, default_value_t = 300)]
        dpi: u32,
    },
    /// Run an export job from a TOML or JSON configuration file
    Process {
        /// Path to the job configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Generate a person mask and save it as an alpha matte PNG
    Segment {
        /// Path to the portrait
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the matte
        #[arg(short, long)]
        output: PathBuf,
        /// API key (or set GEMINI_API_KEY environment variable)
        #[arg(long)]
        api_key: Option<String>,
        /// Model name override
        #[arg(long)]
        model: Option<String>,
    },
    /// Print a JSON schema
    Schema {
        #[arg(value_enum, default_value = "commands")]
        target: SchemaTarget,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Formats { dpi } => list_formats(*dpi),
        Commands::Process { config } => {
            process_job(config).await?;
        }
        Commands::Segment { input, output, api_key, model } => {
            let mut config = GeminiConfig {
                api_key: api_key.clone(),
                ..GeminiConfig::default()
            };
            if let Some(model) = model {
                config.model = model.clone();
            }
            segment_to_file(input, output, config).await?;
        }
        Commands::Schema { target } => {
            let schema = match target {
                SchemaTarget::Commands => serde_json::to_string_pretty(&EditorCommand::schema())?,
                SchemaTarget::Job => serde_json::to_string_pretty(&schemars::schema_for!(ExportJob))?,
            };
            println!("{schema}");
        }
    }

    Ok(())
}

fn list_formats(dpi: u32) {
    for config in PassportConfig::all() {
        let (width, height) = config.size.pixels(dpi);
        println!(
            "{} {:<14} {:>4}x{:<4} mm  {:>4}x{:<4} px  {}",
            config.flag,
            config.country.to_string(),
            config.size.width_mm,
            config.size.height_mm,
            width,
            height,
            config.description,
        );
    }
}

fn read_image(path: &Path) -> Result<EncodedImage> {
    let bytes = std::fs::read(path).map_err(|err| eyre!("Failed to read {}: {err}", path.display()))?;
    Ok(EncodedImage::from_bytes(bytes))
}

async fn process_job(config_path: &Path) -> Result<()> {
    let job = ExportJob::from_file(config_path)?;
    info!(image = %job.image.display(), country = %job.country, "Loaded export job");

    let session = Session::new(job.settings.clone());
    let photo = read_image(&job.image)?;
    session.with_editor(|editor| editor.import_image(photo)).await?;

    if let Some(mask_path) = &job.mask {
        let mask = normalize_encoded(read_image(mask_path)?);
        session.with_editor(|editor| editor.set_mask(mask)).await?;
        info!(mask = %mask_path.display(), "Using supplied mask");
    } else if job.segment {
        let segmenter = GeminiSegmenter::new(job.gemini.clone())?;
        match session.segment(&segmenter).await? {
            SegmentationOutcome::Applied => info!("Background mask generated"),
            SegmentationOutcome::Stale => warn!("Mask arrived for a replaced photo and was dropped"),
        }
    }

    for command in job.commands() {
        session.execute(command).await?;
    }

    // batch jobs are run by the operator, who owns the download right
    session.with_editor(|editor| editor.grant_entitlement()).await;

    std::fs::create_dir_all(&job.output_dir)?;
    for mode in &job.modes {
        match session.export(*mode).await? {
            ExportOutcome::Ready(artifact) => {
                let path = job.output_path(&artifact.file_name);
                std::fs::write(&path, &artifact.bytes)?;
                info!(
                    %mode,
                    path = %path.display(),
                    width = artifact.width,
                    height = artifact.height,
                    "Wrote export"
                );
            }
            ExportOutcome::PrintRequested => warn!(%mode, "Printing needs a host print dialog, skipped"),
            ExportOutcome::Declined => warn!(%mode, "Nothing to render for this job"),
            ExportOutcome::PurchaseRequired => warn!(%mode, "Export is locked"),
        }
    }

    info!("✅ Export job completed!");
    Ok(())
}

async fn segment_to_file(input: &Path, output: &Path, config: GeminiConfig) -> Result<()> {
    let photo = read_image(input)?;
    let segmenter = GeminiSegmenter::new(config)?;
    info!(input = %input.display(), model = %segmenter.config().model, "Segmenting portrait");

    let raw = segmenter.segment(&photo).await?;
    let matte = normalize_encoded(raw);
    if !matte.is_matte() {
        warn!("Model output could not be decoded; saving it unnormalized");
    }
    std::fs::write(output, matte.to_encoded()?.bytes)?;

    info!(output = %output.display(), "Saved mask");
    Ok(())
}
