use clap::{Parser, Subcommand};
use cli::{completion_message, ConsoleReporter, SorterConfig};
use color_eyre::eyre::{Result, WrapErr};
use sorter::{discover_images, Annotator, FileSink, PipelineRunner, RunReport};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect, classify and bin every image in the input directory
    Run {
        /// Path to a TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory with the input images
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Directory for annotated images and the result log
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Font file used to draw annotation labels instead of the built-in one
        #[arg(long)]
        font: Option<PathBuf>,
        /// Pause after every annotated image until Enter is pressed
        #[arg(long)]
        review: bool,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            input,
            output,
            font,
            review,
        } => {
            let mut settings = match config {
                Some(path) => SorterConfig::from_file(&path)
                    .wrap_err_with(|| format!("Failed to load config {}", path.display()))?,
                None => SorterConfig::default(),
            };
            if let Some(input) = input {
                settings.input_dir = input;
            }
            if let Some(output) = output {
                settings.output_dir = output;
            }
            if font.is_some() {
                settings.label_font = font;
            }
            settings.review |= review;

            run(settings).await?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&SorterConfig::schema())?);
        }
    }

    Ok(())
}

async fn run(settings: SorterConfig) -> Result<()> {
    info!("Settings: {:?}", settings);

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing the current image");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let report = tokio::task::spawn_blocking(move || sort_images(&settings, cancel)).await??;

    if !report.images_failed.is_empty() {
        warn!("{} image(s) could not be read", report.images_failed.len());
    }
    if report.cancelled {
        warn!("{}", completion_message(&report));
    } else {
        info!("{}", completion_message(&report));
    }
    Ok(())
}

/// The pipeline itself is synchronous and runs on a blocking thread
fn sort_images(settings: &SorterConfig, cancel: Arc<AtomicBool>) -> Result<RunReport> {
    let sources = discover_images(&settings.input_dir, &settings.extensions)
        .wrap_err_with(|| format!("Failed to list images in {}", settings.input_dir.display()))?;

    let sink = FileSink::create(&settings.output_dir, &settings.log_file)?;
    let log_path = sink.log_path().to_path_buf();

    let annotator = match &settings.label_font {
        Some(path) => Annotator::from_font_file(path)?,
        None => Annotator::default(),
    };

    let mut runner = PipelineRunner::builder()
        .with_sink(sink)
        .with_annotator(annotator)
        .with_cancel_flag(cancel)
        .build()?;

    let stdin = std::io::stdin();
    let mut reporter = ConsoleReporter::new(std::io::stdout(), stdin.lock(), log_path)
        .with_review(settings.review);

    Ok(runner.run(&sources, &mut reporter)?)
}
