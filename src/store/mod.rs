//! Chromosome-partitioned reference variant stores.
//!
//! The merge-join engine reads reference candidates through the
//! [`ReferenceLookup`] trait, one bounded window at a time. Two lookups exist:
//!
//! - [`ChunkedLookaheadFetcher`](chunked::ChunkedLookaheadFetcher): batches reads
//!   from a forward-only [`ReferenceStore`], such as a directory of per-chromosome
//!   VCFs or a single sorted VCF
//! - [`InMemoryLookup`](memory::InMemoryLookup): a fully materialised group-by
//!   chromosome, for references that fit in memory
//!
//! ## Example
//!
//! ```rust,no_run
//! use allele_join::core::chrom::ChromosomeOrder;
//! use allele_join::store::chunked::ChunkedLookaheadFetcher;
//! use allele_join::store::vcf::VcfDirectoryStore;
//! use allele_join::store::{ReferenceLookup, Window};
//! use std::path::Path;
//!
//! let order = ChromosomeOrder::human();
//! let store = VcfDirectoryStore::open(Path::new("1000genomes/"), &order).unwrap();
//! let mut fetcher = ChunkedLookaheadFetcher::new(store, order, 10_000);
//!
//! if let Window::Candidates { records, end } = fetcher.fetch_window("chr1", 1).unwrap() {
//!     println!("{} candidates before {end}", records.len());
//! }
//! ```

use thiserror::Error;

use crate::core::chrom::UnknownChromosomeError;
use crate::core::types::OrderViolation;
use crate::core::variant::VariantRecord;
use crate::parsing::ParseError;

pub mod chunked;
pub mod memory;
pub mod vcf;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode reference: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    UnknownChromosome(#[from] UnknownChromosomeError),

    #[error("{0}")]
    OrderViolation(OrderViolation),

    #[error("Reference for {expected} contains a record on {found}")]
    ChromosomeMismatch { expected: String, found: String },

    #[error("Reference store has no chromosome files under {0}")]
    Empty(String),
}

/// One batch of reference candidates
#[derive(Debug, Clone, PartialEq)]
pub enum Window {
    /// Every candidate with position in `[from_pos, end)`, in position order
    Candidates {
        records: Vec<VariantRecord>,
        end: u64,
    },
    /// No more candidates exist for the chromosome at or past `from_pos`
    Exhausted,
}

/// Windowed access to reference candidates for one chromosome at a time.
///
/// Callers move forward only: within a chromosome each `from_pos` is at or past
/// the previous one, and chromosomes are visited in non-decreasing rank.
pub trait ReferenceLookup {
    /// Fetch the window of candidates on `chrom` starting at `from_pos`
    ///
    /// # Errors
    ///
    /// Propagates I/O and decode failures, and reports reference records that
    /// are out of order or on the wrong chromosome.
    fn fetch_window(&mut self, chrom: &str, from_pos: u64) -> Result<Window, StoreError>;

    /// The caller has moved permanently past `chrom`; release its resources
    fn release(&mut self, _chrom: &str) {}
}

/// Forward-only, chromosome-keyed source of reference records
pub trait ReferenceStore {
    /// Next record on `chrom`, or `None` once the store has no more for it.
    ///
    /// Readers are opened lazily on the first request for a chromosome.
    ///
    /// # Errors
    ///
    /// Propagates I/O and decode failures.
    fn next_record(&mut self, chrom: &str) -> Result<Option<VariantRecord>, StoreError>;

    /// Close any reader held for `chrom`
    fn close(&mut self, chrom: &str);

    /// Number of readers currently open
    fn open_readers(&self) -> usize;
}
