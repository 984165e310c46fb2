use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use subtrans::config::{Config, Provider};
use subtrans::translate::create_translator;
use subtrans::{print_summary, translate_srt_file, PipelineConfig};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "subtrans")]
#[command(version, about = "Translate SRT subtitles using AI")]
#[command(long_about = "Translate SRT subtitle files with OpenAI or Google Gemini, merging nearby cues into one request and keeping the original timing.")]
struct Cli {
    /// Input SRT file
    input: PathBuf,

    /// Output SRT file (defaults to <input>.<target>.srt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source language code (e.g., ja, en)
    #[arg(short, long)]
    source: Option<String>,

    /// Target language code (e.g., zh, es)
    #[arg(short, long)]
    target: Option<String>,

    /// Translation provider: openai, gemini
    #[arg(short, long)]
    provider: Option<String>,

    /// Model identifier (defaults to the provider's model)
    #[arg(short, long)]
    model: Option<String>,

    /// Attempts per group before keeping the original text
    #[arg(long)]
    max_retries: Option<u32>,

    /// Largest gap in seconds between cues merged into one request
    #[arg(long)]
    max_gap: Option<f64>,

    /// Largest combined cue length in characters per request
    #[arg(long)]
    max_length: Option<usize>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut Config) -> Result<()> {
        if let Some(ref provider) = self.provider {
            config.provider = provider
                .parse::<Provider>()
                .map_err(|e: String| anyhow::anyhow!(e))?;
        }
        if let Some(ref model) = self.model {
            config.model = Some(model.clone());
        }
        if let Some(ref source) = self.source {
            config.source_language = source.clone();
        }
        if let Some(ref target) = self.target {
            config.target_language = target.clone();
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if let Some(gap) = self.max_gap {
            config.max_gap_secs = gap;
        }
        if let Some(length) = self.max_length {
            config.max_length = length;
        }
        Ok(())
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn derive_output_path(input: &Path, target_language: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut output = input.to_path_buf();
    output.set_file_name(format!("{}.{}.srt", stem.to_string_lossy(), target_language));
    output
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Load and validate configuration
    let mut config = Config::load().context("Failed to load configuration")?;
    cli.apply_to(&mut config)?;
    config.validate().context("Configuration validation failed")?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| derive_output_path(&cli.input, &config.target_language));

    info!("Input:    {}", cli.input.display());
    info!("Output:   {}", output.display());
    info!("Provider: {} ({})", config.provider, config.model());
    info!(
        "Language: {} -> {}",
        config.source_language, config.target_language
    );

    let translator = create_translator(&config)?;
    let pipeline_config = PipelineConfig::from_config(&config).with_progress(!cli.no_progress);

    let result = translate_srt_file(&cli.input, &output, translator.as_ref(), &pipeline_config)
        .await
        .context("Subtitle translation failed")?;

    print_summary(&result);

    Ok(())
}
