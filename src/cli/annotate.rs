use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::cli::{print_summary, JoinOptions, OutputFormat};
use crate::core::chrom::ChromosomeOrder;
use crate::matching::allele::ModeMatcher;
use crate::matching::engine::{JoinStats, MergeJoinEngine};
use crate::output::PopulationTsvSink;
use crate::parsing::vcf::VcfReader;
use crate::store::chunked::ChunkedLookaheadFetcher;
use crate::store::memory::InMemoryLookup;
use crate::store::vcf::{VcfDirectoryStore, VcfFileStore};
use crate::store::ReferenceStore;

#[derive(Args)]
pub struct AnnotateArgs {
    /// Query VCF, sorted by chromosome and position (plain or gzipped)
    #[arg(required = true)]
    pub query: PathBuf,

    /// Reference: a directory of per-chromosome VCFs, or one sorted VCF
    #[arg(required = true)]
    pub reference: PathBuf,

    /// Load the whole reference into memory instead of reading it in windows
    #[arg(long)]
    pub in_memory: bool,

    /// Positions covered by one reference window (overrides the config file)
    #[arg(long)]
    pub window_size: Option<u64>,

    #[command(flatten)]
    pub options: JoinOptions,
}

pub fn run(args: AnnotateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.options.resolve(args.window_size)?;
    let order = config.order();
    let matcher = ModeMatcher::from(config.match_mode);

    let query = VcfReader::open(&args.query, true)
        .with_context(|| format!("Failed to open query {}", args.query.display()))?;
    let samples = query.sample_names().to_vec();
    info!(
        query = %args.query.display(),
        samples = samples.len(),
        mode = ?config.match_mode,
        "Annotating query VCF"
    );

    let mut sink = PopulationTsvSink::new(args.options.writer()?, samples)?;

    let stats = if args.reference.is_dir() {
        let store = VcfDirectoryStore::open(&args.reference, &order)
            .with_context(|| format!("Failed to open reference {}", args.reference.display()))?;
        join_store(store, &args, config.window_size, matcher, order, query, &mut sink)?
    } else {
        let store = VcfFileStore::open(&args.reference, &order)
            .with_context(|| format!("Failed to open reference {}", args.reference.display()))?;
        join_store(store, &args, config.window_size, matcher, order, query, &mut sink)?
    };

    print_summary("annotate", &stats, format, verbose)
}

/// Join against a store, either windowed or fully loaded
fn join_store<S, R>(
    mut store: S,
    args: &AnnotateArgs,
    window_size: u64,
    matcher: ModeMatcher,
    order: ChromosomeOrder,
    query: VcfReader<R>,
    sink: &mut PopulationTsvSink<Box<dyn Write>>,
) -> anyhow::Result<JoinStats>
where
    S: ReferenceStore,
    R: BufRead,
{
    let stats = if args.in_memory {
        let lookup = InMemoryLookup::from_store(&mut store, order.clone())
            .with_context(|| format!("Failed to load reference {}", args.reference.display()))?;
        info!(records = lookup.len(), "Loaded reference into memory");
        MergeJoinEngine::new(lookup, matcher, order).run(query.records(), sink)?
    } else {
        let fetcher = ChunkedLookaheadFetcher::new(store, order.clone(), window_size);
        MergeJoinEngine::new(fetcher, matcher, order).run(query.records(), sink)?
    };
    Ok(stats)
}
