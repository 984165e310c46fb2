use crate::config::Config;
use crate::error::{Result, SubtransError};
use crate::subtitle::{compose_srt, group_cues, parse_srt, reassemble, Cue, GroupingOptions};
use crate::translate::{translate_with_retry, RetryPolicy, Translator};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for the subtitle translation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Source language code.
    pub source_language: String,
    /// Target language code.
    pub target_language: String,
    /// Thresholds for merging cues into one request.
    pub grouping: GroupingOptions,
    /// Attempts per group before falling back to the original text.
    pub retry: RetryPolicy,
    /// Show progress bars.
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_language: "ja".to_string(),
            target_language: "zh".to_string(),
            grouping: GroupingOptions::default(),
            retry: RetryPolicy::default(),
            show_progress: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            grouping: config.grouping(),
            retry: config.retry_policy(),
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

/// Statistics from the translation run.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Number of cues read and written.
    pub cues: usize,
    /// Number of translation groups.
    pub groups: usize,
    /// Groups that received a translation.
    pub translated_groups: usize,
    /// Groups that kept their original text after all attempts failed.
    pub fallback_groups: usize,
    /// Translation requests made, including failed ones.
    pub attempts: u32,
    pub total_time: Duration,
}

/// Result of translating one subtitle file.
#[derive(Debug)]
pub struct PipelineResult {
    /// Path to the output subtitle file.
    pub output_path: PathBuf,
    /// Cues as written to the output.
    pub cues: Vec<Cue>,
    pub stats: PipelineStats,
}

/// Translate cues group by group, in order.
///
/// Groups are sent one at a time; a group whose translation fails on every
/// attempt keeps its joined original text.
pub async fn translate_cues(
    cues: &[Cue],
    translator: &dyn Translator,
    config: &PipelineConfig,
) -> (Vec<Cue>, PipelineStats) {
    let start_time = Instant::now();
    let groups = group_cues(cues, &config.grouping);

    info!(
        "Translating {} cues in {} groups from {} to {} using {}",
        cues.len(),
        groups.len(),
        config.source_language,
        config.target_language,
        translator.name()
    );

    let progress_bar = if config.show_progress && !groups.is_empty() {
        let pb = ProgressBar::new(groups.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} groups ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut stats = PipelineStats {
        cues: cues.len(),
        groups: groups.len(),
        ..PipelineStats::default()
    };
    let mut output = Vec::with_capacity(cues.len());

    for (i, group) in groups.iter().enumerate() {
        let text = group.joined_text();
        debug!(
            "Group {}/{}: {} cues, {} chars",
            i + 1,
            groups.len(),
            group.len(),
            group.char_count()
        );

        let outcome = translate_with_retry(
            translator,
            &text,
            &config.source_language,
            &config.target_language,
            &config.retry,
        )
        .await;

        stats.attempts += outcome.attempts;
        if outcome.fell_back {
            warn!(
                "Group {} (cues {}..={}) left untranslated",
                i + 1,
                group.cues()[0].index,
                group.cues()[group.len() - 1].index
            );
            stats.fallback_groups += 1;
        } else {
            stats.translated_groups += 1;
        }

        output.extend(reassemble(group, &outcome.text));

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    stats.total_time = start_time.elapsed();
    (output, stats)
}

/// Translate an SRT file and write the result.
///
/// Read, parse and write failures abort the run; nothing is written unless
/// every group has been processed.
pub async fn translate_srt_file(
    input: &Path,
    output: &Path,
    translator: &dyn Translator,
    config: &PipelineConfig,
) -> Result<PipelineResult> {
    let start_time = Instant::now();

    info!("Reading {:?}", input);
    let content = fs::read_to_string(input).map_err(|source| SubtransError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let cues = parse_srt(&content)?;
    info!("Parsed {} cues", cues.len());

    let (translated, mut stats) = translate_cues(&cues, translator, config).await;

    let srt = compose_srt(&translated);
    fs::write(output, srt).map_err(|source| SubtransError::Write {
        path: output.to_path_buf(),
        source,
    })?;

    info!("Wrote {} cues to {:?}", translated.len(), output);

    stats.total_time = start_time.elapsed();

    Ok(PipelineResult {
        output_path: output.to_path_buf(),
        cues: translated,
        stats,
    })
}

/// Print a summary of the pipeline results.
pub fn print_summary(result: &PipelineResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                     Subtitle Translation Complete             ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output:      {}", result.output_path.display());
    println!("  Cues:        {}", result.stats.cues);
    println!(
        "  Groups:      {} ({} translated, {} kept original)",
        result.stats.groups, result.stats.translated_groups, result.stats.fallback_groups
    );
    println!("  Requests:    {}", result.stats.attempts);
    println!(
        "  Total:       {:.2}s",
        result.stats.total_time.as_secs_f64()
    );
    if result.stats.fallback_groups > 0 {
        println!();
        println!(
            "  Note: {} group(s) could not be translated and keep their source text",
            result.stats.fallback_groups
        );
    }
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
