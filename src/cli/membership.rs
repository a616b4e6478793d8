use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::cli::{print_summary, JoinOptions, OutputFormat};
use crate::matching::allele::ModeMatcher;
use crate::matching::engine::MergeJoinEngine;
use crate::output::MembershipTsvSink;
use crate::parsing::tsv::SupersetReader;
use crate::parsing::vcf::VcfReader;
use crate::store::memory::InMemoryLookup;

#[derive(Args)]
pub struct MembershipArgs {
    /// Superset table (tab-separated, header `CHROM POS REF ALT ...`), sorted
    #[arg(required = true)]
    pub superset: PathBuf,

    /// Subset VCF, sorted; held in memory
    #[arg(required = true)]
    pub subset: PathBuf,

    /// Name of the True/False membership column
    #[arg(long, required = true)]
    pub column: String,

    #[command(flatten)]
    pub options: JoinOptions,
}

pub fn run(args: MembershipArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.options.resolve(None)?;
    let order = config.order();

    let subset = VcfReader::open(&args.subset, false)
        .with_context(|| format!("Failed to open subset {}", args.subset.display()))?;
    let lookup = InMemoryLookup::from_records(subset.records(), order.clone())
        .with_context(|| format!("Failed to load subset {}", args.subset.display()))?;

    let superset = SupersetReader::open(&args.superset, '\t')
        .with_context(|| format!("Failed to open superset {}", args.superset.display()))?;
    info!(
        superset = %args.superset.display(),
        subset_records = lookup.len(),
        mode = ?config.match_mode,
        "Checking superset membership"
    );

    let mut sink =
        MembershipTsvSink::new(args.options.writer()?, &args.column, superset.extra_columns())?;

    let mut engine = MergeJoinEngine::new(lookup, ModeMatcher::from(config.match_mode), order);
    let stats = engine.run(superset.records(), &mut sink)?;

    print_summary("membership", &stats, format, verbose)
}
