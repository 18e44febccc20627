//! Retouch CLI: apply adjustments to a local image file.
//!
//! Configuration comes from the environment or a `.env` file: STORAGE_PATH,
//! TEMP_DIR, IMAGE_DEFAULT_QUALITY, IMAGE_DEFAULT_OPTIONS,
//! IMAGE_SIZE_CACHE_CAPACITY and PARALLEL_FRAMES. Logs go to stderr and are
//! filtered through RUST_LOG.

use anyhow::Context;
use clap::{Parser, Subcommand};
use retouch_cli::{init_tracing, output_options, AdjustmentArgs};
use retouch_core::constants::DEFAULT_COLLECTION;
use retouch_core::Config;
use retouch_processing::ImageService;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "retouch", about = "Apply image adjustments to local files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a file, apply adjustments and store the result
    Process {
        /// Path to the source image
        file: PathBuf,
        #[command(flatten)]
        adjustments: AdjustmentArgs,
        /// Output quality (0-100), overrides IMAGE_DEFAULT_QUALITY
        #[arg(long)]
        quality: Option<i64>,
        /// Collection the result is imported into
        #[arg(long, default_value = DEFAULT_COLLECTION)]
        collection: String,
    },
    /// Import a file and print its dimensions
    Size {
        /// Path to the image
        file: PathBuf,
        #[arg(long, default_value = DEFAULT_COLLECTION)]
        collection: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize result")?;
    println!("{}", out);
    Ok(())
}

fn file_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(
        storage_path = %config.storage_path().display(),
        "Configuration loaded"
    );
    let service = ImageService::from_config(&config).await?;

    match cli.command {
        Commands::Process {
            file,
            adjustments,
            quality,
            collection,
        } => {
            let adjustments = adjustments.build()?;
            let options = output_options(quality)?;

            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let source = service
                .store()
                .import(data, &file_name(&file)?, &collection)
                .await
                .context("Failed to import source image")?;

            let result = service
                .process_image(&source, &adjustments, &options)
                .await?;
            print_json(&result)?;
        }
        Commands::Size { file, collection } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let resource = service
                .store()
                .import(data, &file_name(&file)?, &collection)
                .await
                .context("Failed to import image")?;

            let size = service.get_image_size(&resource).await?;
            print_json(&serde_json::json!({
                "resource": resource,
                "width": size.width,
                "height": size.height,
            }))?;
        }
    }

    Ok(())
}
