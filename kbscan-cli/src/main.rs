//! kbscan CLI - scan document trees into scrubbed Markdown surrogates
//!
//! Usage:
//!   kbscan scan --config <scan.yaml> [--out <dir>] [--state <file>] [--dry-run]
//!   kbscan init-config <path>

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kbscan_core::{ScanConfig, ScanOrchestrator};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kbscan")]
#[command(about = "Document tree scanner with privacy scrubbing", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scan over the configured roots
    Scan {
        /// Scan configuration file (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Output directory for surrogates, state and the latest map
        #[arg(short, long, default_value = "kb_out")]
        out: PathBuf,

        /// State file location (default: <out>/state.json)
        #[arg(long)]
        state: Option<PathBuf>,

        /// Walk and report without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a commented starter configuration
    InitConfig {
        /// Where to write the config file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Scan {
            config,
            out,
            state,
            dry_run,
        } => run_scan(&config, out, state, dry_run),
        Commands::InitConfig { path } => init_config(&path),
    }
}

fn run_scan(
    config_path: &PathBuf,
    out: PathBuf,
    state: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let config = ScanConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    println!("Scanning...");
    println!("  Config: {}", config_path.display());
    println!("  Output: {}", out.display());
    if dry_run {
        println!("  Mode:   dry run (nothing will be written)");
    }
    println!();

    let start = std::time::Instant::now();

    let mut orchestrator = ScanOrchestrator::new(config, out).with_dry_run(dry_run);
    if let Some(state) = state {
        orchestrator = orchestrator.with_state_path(state);
    }
    let outcome = orchestrator.run().context("Scan failed")?;

    println!("Done in {:.2}s", start.elapsed().as_secs_f64());
    println!();
    println!("  Extracted: {}", outcome.extracted);
    println!("  Unchanged: {}", outcome.reused);
    println!("  Deleted:   {}", outcome.deleted.len());

    if !outcome.skips.is_empty() {
        println!();
        println!("Skipped {} file(s):", outcome.skips.len());
        for skip in outcome.skips.iter().take(20) {
            println!("  {}: {}", skip.path.display(), skip.reason);
        }
        if outcome.skips.len() > 20 {
            println!("  ... and {} more", outcome.skips.len() - 20);
        }
    }

    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"# kbscan configuration
roots:
  - /srv/share/docs

# Extensions to index (without the leading dot)
allowed_extensions: [docx, xlsx, pptx, pdf, md, txt, sql]

# Directory names skipped entirely
exclude_dirs: []
# Directory names skipped by substring, e.g. "old", "backup"
exclude_dir_keywords: [old, backup, tmp]
# Regex patterns excluding whole paths
exclude_path_patterns: []

shortcuts:
  enabled: true
  follow_dir_targets: true
  allow_outside_roots: false
  max_chain: 2

masking:
  email: true
  phone: true
  ip: true
  password_like: true
  # custom:
  #   - pattern: 'EMP\d{6}'
  #     replace: '[EMPLOYEE]'

classify:
  system_from_path: true
  system_depth: 1
  # First capture group becomes the screen id
  screen_id_patterns: []
  # First matching rule wins
  doc_type_rules: []
  #  - contains_any: [design, 設計]
  #    doc_type: design

version:
  date: true
  semver: true
  revision: true

latest_map:
  enabled: true
  allow_fallback_keys: true

# SHA-256 file contents in fingerprints (slower, stronger)
hash_contents: false
summary_sentences: 3
keywords_topk: 15
"#;

fn init_config(path: &PathBuf) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists, not overwriting", path.display());
    }
    std::fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote starter config to {}", path.display());
    println!("Edit the roots, then run: kbscan scan --config {}", path.display());
    Ok(())
}
