//! Row writers for merge-join results.
//!
//! Every sink receives exactly one [`MatchResult`] per query record, in query
//! order. Rows follow the layout
//! `[coordinate][query alleles][verdict][reference annotation][pass-through]`,
//! with `NA` for any missing value.
//!
//! - [`PopulationTsvSink`]: reference ID and allele frequency, the query's own ID
//!   and genotype tallies, then per-sample genotype fields of the query
//! - [`MembershipTsvSink`]: a `True`/`False` membership column followed by the
//!   query's own extra columns
//! - [`CollectingSink`]: keeps rows in memory

use std::io;

use crate::core::types::MatchKind;
use crate::core::variant::VariantRecord;
use crate::matching::engine::MatchResult;

pub mod membership;
pub mod population;

pub use membership::MembershipTsvSink;
pub use population::PopulationTsvSink;

/// Placeholder written for a missing value
pub const NA: &str = "NA";

/// Destination for merge-join rows
pub trait OutputSink {
    /// Write the row for one query record
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn emit(&mut self, result: &MatchResult<'_>) -> io::Result<()>;

    /// Flush buffered rows once the join has finished
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Value or `NA`
pub(crate) fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NA.to_string(), |v| v.to_string())
}

/// An owned copy of one emitted row
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedRow {
    pub query: VariantRecord,
    pub reference: Option<VariantRecord>,
    pub kind: MatchKind,
    pub reference_id: Option<String>,
    pub allele_frequency: Option<String>,
}

/// Keeps every row in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub rows: Vec<CollectedRow>,
}

impl OutputSink for CollectingSink {
    fn emit(&mut self, result: &MatchResult<'_>) -> io::Result<()> {
        self.rows.push(CollectedRow {
            query: result.query.clone(),
            reference: result.reference.clone(),
            kind: result.kind,
            reference_id: result.reference_id().map(str::to_string),
            allele_frequency: result.allele_frequency().map(str::to_string),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_na() {
        assert_eq!(or_na(Some(5)), "5");
        assert_eq!(or_na(None::<u32>), "NA");
        assert_eq!(or_na(Some("rs1")), "rs1");
    }
}
