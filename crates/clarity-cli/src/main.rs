//! Clarity CLI - evidence-based reframes for anxious spirals.
//!
//! Reads the pattern document and context files from a notes vault, serves
//! a stored reframe when a known pattern matches strongly enough, and asks
//! Gemini for a fresh one otherwise.
//!
//! # Configuration
//!
//! - `--config FILE` loads a `.toml`, `.json` or `.yaml` file
//! - otherwise `CLARITY_*` variables and `GEMINI_API_KEY` are read, after
//!   loading a `.env` file if present
//!
//! # Usage
//!
//! ```text
//! clarity reframe "I feel worthless and nobody likes me" --certainty 8
//! clarity match "I'm going to get fired"
//! clarity patterns
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clarity_core::{
    ClarityConfig, ClarityError, ErrorCode, FsDocumentSource, PatternMode, ReframeDecisionFlow,
    ReframeResult, SpiralData,
};
use clarity_llm::LlmFactory;

#[derive(Parser)]
#[command(name = "clarity", version)]
#[command(about = "Evidence-based reframes for anxious spirals")]
struct Cli {
    /// Configuration file (.toml, .json or .yaml)
    #[arg(short, long, env = "CLARITY_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Notes vault all document paths are relative to
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Produce a reframe for a spiral
    Reframe {
        /// The anxious narrative
        narrative: String,

        /// How true it feels right now (1-10)
        #[arg(short = 'n', long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=10))]
        certainty: u8,

        /// What triggered it
        #[arg(long)]
        context: Option<String>,

        /// Pattern mode (full, patterns-api, off)
        #[arg(long)]
        mode: Option<PatternMode>,

        /// Minimum match score for a stored reframe (0.0-1.0)
        #[arg(long)]
        threshold: Option<f64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the best matching pattern without generating anything
    Match {
        /// The anxious narrative
        narrative: String,
    },

    /// List the patterns parsed from the pattern document
    Patterns,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(&cli)?;
    tracing::info!(vault = %config.vault_dir.display(), "Using vault");

    let source = Arc::new(FsDocumentSource::new(&config.vault_dir));
    let flow = ReframeDecisionFlow::from_config(source, &config);

    match cli.command {
        Command::Reframe {
            narrative,
            certainty,
            context,
            mode,
            threshold,
            json,
        } => {
            let mut spiral = SpiralData::new(narrative, certainty).map_err(describe)?;
            if let Some(context) = context {
                spiral = spiral.with_context(context);
            }
            let mode = mode.unwrap_or(config.patterns.mode);
            let threshold = threshold.unwrap_or(config.patterns.match_threshold);
            if !(0.0..=1.0).contains(&threshold) {
                return Err(anyhow!("Threshold must be between 0 and 1, got {}", threshold));
            }

            // A provider that cannot be built only matters once generation runs.
            let (flow, setup_error) = match LlmFactory::from_config(&config.llm) {
                Ok(llm) => (flow.with_llm(llm, config.llm.provider), None),
                Err(e) => {
                    tracing::warn!(error = %e, "Generation provider unavailable");
                    (flow, Some(e))
                }
            };

            let result = match flow.decide(&spiral, mode, threshold).await {
                Ok(result) => result,
                Err(e) if e.code() == ErrorCode::LlmNotInitialized => {
                    return Err(describe(setup_error.unwrap_or(e)));
                }
                Err(e) => return Err(describe(e)),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_reframe(&result);
            }
        }

        Command::Match { narrative } => match flow.matcher().find_match(&narrative).await {
            Some(m) => {
                println!("{} ({}%)", m.pattern_name(), m.percent());
                println!("Triggers: {}", m.matched_triggers.join(", "));
                let verdict = if m.meets(flow.threshold()) {
                    "stored reframe would be served"
                } else {
                    "below threshold, a reframe would be generated"
                };
                println!("Threshold {:.2}: {}", flow.threshold(), verdict);
            }
            None => println!("No pattern matched."),
        },

        Command::Patterns => {
            let matcher = flow.matcher();
            let patterns = matcher.patterns().await;
            if patterns.is_empty() {
                println!("No patterns found in {}", matcher.pattern_path());
                return Ok(());
            }
            for pattern in patterns.iter() {
                match pattern.frequency {
                    Some(n) => println!("{} (seen {} times)", pattern.name, n),
                    None => println!("{}", pattern.name),
                }
                println!("  Triggers: {}", pattern.triggers.join(", "));
                if !pattern.sources.is_empty() {
                    println!("  Sources: {}", pattern.sources.join(", "));
                }
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ClarityConfig> {
    let mut config = match &cli.config {
        Some(path) => ClarityConfig::from_file(path)
            .map_err(describe)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ClarityConfig::from_env(),
    };

    if let Some(vault) = &cli.vault {
        config.vault_dir = vault.clone();
    }

    config.validate().map_err(describe)?;
    Ok(config)
}

fn describe(err: ClarityError) -> anyhow::Error {
    match err.suggestion().map(str::to_owned) {
        Some(hint) => anyhow!("{} ({})", err, hint),
        None => anyhow!(err),
    }
}

fn print_reframe(result: &ReframeResult) {
    println!("{}", result.content.trim_end());
    println!();

    if result.is_cache_hit {
        if let (Some(name), Some(score)) = (&result.matched_pattern_name, result.score) {
            println!(
                "Known pattern: {} ({:.0}% match)",
                name,
                score * 100.0
            );
        }
    } else if let Some(model) = &result.model {
        println!("Generated by {}", model);
    }

    if !result.sources.is_empty() {
        println!("Sources:");
        for source in &result.sources {
            println!("  - {}", source);
        }
    }
}
