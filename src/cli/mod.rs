//! Command-line interface for allele-join.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **annotate**: Annotate a VCF with identifiers and allele frequencies from a
//!   population reference
//! - **membership**: Flag which rows of a superset table are present in a subset VCF
//!
//! ## Usage
//!
//! ```text
//! # Annotate against a directory of per-chromosome 1000 Genomes VCFs
//! allele-join annotate sample.vcf.gz 1000genomes/ -o sample.annotated.tsv
//!
//! # Small reference, held in memory
//! allele-join annotate sample.vcf panel.vcf --in-memory
//!
//! # Membership of superset rows in a subset VCF, JSON run summary
//! allele-join --format json membership all_sites.tsv filtered.vcf --column IN_FILTERED
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::JoinConfig;
use crate::core::types::MatchMode;
use crate::matching::engine::JoinStats;

pub mod annotate;
pub mod membership;

#[derive(Parser)]
#[command(name = "allele-join")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Merge-join sorted variant calls against chromosome-partitioned references")]
#[command(
    long_about = "allele-join streams a position-sorted VCF against a reference variant store in a single pass.\n\nEach query record is reported exactly once as:\n- EXACT when the allele sets are equal\n- COMPLEMENT when they are equal after a strand flip\n- ABSENT otherwise"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Format of the run summary written to stderr
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Annotate query variants with reference identifiers and allele frequencies
    Annotate(annotate::AnnotateArgs),

    /// Mark superset rows that are present in a subset VCF
    Membership(membership::MembershipArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Options shared by every join command
#[derive(clap::Args)]
pub struct JoinOptions {
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Allele comparison strategy (overrides the config file)
    #[arg(long, value_enum)]
    pub match_mode: Option<MatchMode>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl JoinOptions {
    /// Load the config file, if any, and apply command-line overrides
    pub fn resolve(&self, window_size: Option<u64>) -> anyhow::Result<JoinConfig> {
        let mut config = match &self.config {
            Some(path) => JoinConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => JoinConfig::default(),
        };

        if let Some(mode) = self.match_mode {
            config.match_mode = mode;
        }
        if let Some(size) = window_size {
            config.window_size = size;
        }
        config.validate()?;

        Ok(config)
    }

    /// Buffered writer for the output file, or stdout
    pub fn writer(&self) -> anyhow::Result<Box<dyn Write>> {
        open_output(self.output.as_deref())
    }
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

#[derive(Serialize)]
struct RunSummary<'a> {
    command: &'a str,
    generated_at: String,
    #[serde(flatten)]
    stats: &'a JoinStats,
}

/// Write the run summary to stderr
pub fn print_summary(
    command: &str,
    stats: &JoinStats,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let summary = RunSummary {
                command,
                generated_at: chrono::Utc::now().to_rfc3339(),
                stats,
            };
            eprintln!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            eprintln!(
                "{command}: {} query records ({} exact, {} complement, {} absent)",
                stats.total, stats.exact, stats.complement, stats.absent
            );
            if verbose {
                eprintln!(
                    "  {} absent with a differing reference record at the same position",
                    stats.mismatched
                );
                eprintln!(
                    "  {} reference windows fetched, {} reference records skipped",
                    stats.windows_fetched, stats.reference_skipped
                );
                for count in &stats.per_chromosome {
                    eprintln!("  {:<8} {:>12}", count.chrom, count.queries);
                }
            }
        }
    }
    Ok(())
}
