//! # allele-join
//!
//! A library for annotating variant calls against chromosome-partitioned reference
//! variant stores with a single-pass sort-merge join.
//!
//! Both inputs are sorted by a canonical chromosome order and then by position. The
//! query stream is walked once; reference candidates are read forward in bounded
//! windows, so memory stays flat however large the reference is.
//!
//! ## Features
//!
//! - **Allele-set matching**: REF/ALT compared as unordered sets, so swapped roles
//!   and multi-allelic ordering still match
//! - **Strand flips**: complemented allele sets are reported as `COMPLEMENT`
//! - **Chromosome naming**: `chr1` and `1` (and `chrM`/`MT`) are the same chromosome
//! - **Fail-fast ordering**: unsorted input and ambiguous reference sites abort the run
//!
//! ## Example
//!
//! ```rust,no_run
//! use allele_join::{ChromosomeOrder, InMemoryLookup, MergeJoinEngine, SetEquality};
//! use allele_join::output::CollectingSink;
//! use allele_join::parsing::vcf::VcfReader;
//! use std::path::Path;
//!
//! let order = ChromosomeOrder::human();
//! let reference = VcfReader::open(Path::new("panel.vcf"), false).unwrap();
//! let lookup = InMemoryLookup::from_records(reference.records(), order.clone()).unwrap();
//!
//! let query = VcfReader::open(Path::new("sample.vcf"), true).unwrap();
//! let mut engine = MergeJoinEngine::new(lookup, SetEquality, order);
//! let mut sink = CollectingSink::default();
//! let stats = engine.run(query.records(), &mut sink).unwrap();
//!
//! println!("{} of {} query records matched", stats.matched(), stats.total);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Chromosome order, variant records, and shared types
//! - [`parsing`]: VCF and superset table decoders
//! - [`store`]: Windowed and in-memory reference lookups
//! - [`matching`]: Allele matching, stream cursor, and the merge-join engine
//! - [`output`]: Row writers
//! - [`config`]: Run configuration
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod config;
pub mod core;
pub mod matching;
pub mod output;
pub mod parsing;
pub mod store;

// Re-export commonly used types for convenience
pub use config::JoinConfig;
pub use core::chrom::{ChromosomeOrder, UnknownChromosomeError};
pub use core::types::*;
pub use core::variant::{GenotypeCounts, Locus, VariantRecord};
pub use matching::allele::{AlleleMatcher, AnyOverlap, SetEquality};
pub use matching::engine::{JoinError, JoinStats, MatchResult, MergeJoinEngine};
pub use store::chunked::ChunkedLookaheadFetcher;
pub use store::memory::InMemoryLookup;
pub use store::{ReferenceLookup, Window};
