//! Core data types for sorted-stream variant annotation.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`ChromosomeOrder`](chrom::ChromosomeOrder): canonical chromosome ranking
//! - [`VariantRecord`](variant::VariantRecord): a decoded variant, the unit the engine consumes
//! - [`GenotypeCall`](variant::GenotypeCall): per-sample fields passed through to the output
//! - [`GenotypeCounts`](variant::GenotypeCounts): per-record genotype tallies
//! - [`MatchKind`](types::MatchKind), [`MatchMode`](types::MatchMode): match verdicts and strategies
//!
//! ## Chromosome Naming
//!
//! Different reference sources use different naming conventions:
//!
//! | Source | Chromosome 1 | Mitochondrial |
//! |--------|--------------|---------------|
//! | UCSC   | chr1         | chrM          |
//! | NCBI   | 1            | MT            |
//!
//! Both spellings rank identically, so a query written against UCSC names can be
//! joined against a reference written with NCBI names.

pub mod chrom;
pub mod types;
pub mod variant;
