//! Allele-set comparison between a query record and a reference candidate.
//!
//! Alleles are compared as unordered sets of `{REF} ∪ ALT`, so multi-allelic sites
//! match regardless of ALT order, and a reference that swaps the REF/ALT roles still
//! matches. A query whose complemented alleles (A<->T, C<->G) equal the reference
//! set is reported as a strand flip.

use std::collections::BTreeSet;

use crate::core::types::{MatchKind, MatchMode};
use crate::core::variant::VariantRecord;

/// Complement of a single base; any other symbol maps to itself
#[must_use]
pub fn complement_base(base: char) -> char {
    match base {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        'a' => 't',
        't' => 'a',
        'c' => 'g',
        'g' => 'c',
        other => other,
    }
}

/// Base-wise complement of an allele (not reversed)
#[must_use]
pub fn complement_allele(allele: &str) -> String {
    allele.chars().map(complement_base).collect()
}

/// `{REF} ∪ ALT` as an unordered set
fn allele_set<'a>(reference: &'a str, alternates: &'a [String]) -> BTreeSet<&'a str> {
    std::iter::once(reference)
        .chain(alternates.iter().map(String::as_str))
        .collect()
}

/// Decides how a query allele set relates to a candidate reference allele set
pub trait AlleleMatcher {
    fn classify(
        &self,
        query_ref: &str,
        query_alt: &[String],
        reference_ref: &str,
        reference_alt: &[String],
    ) -> MatchKind;

    /// Classify two records that share a coordinate
    fn classify_records(&self, query: &VariantRecord, reference: &VariantRecord) -> MatchKind {
        self.classify(
            &query.reference,
            &query.alternates,
            &reference.reference,
            &reference.alternates,
        )
    }
}

/// Full allele-set equality, checked directly and then on the complemented query
#[derive(Debug, Clone, Copy, Default)]
pub struct SetEquality;

impl AlleleMatcher for SetEquality {
    fn classify(
        &self,
        query_ref: &str,
        query_alt: &[String],
        reference_ref: &str,
        reference_alt: &[String],
    ) -> MatchKind {
        let reference = allele_set(reference_ref, reference_alt);
        if allele_set(query_ref, query_alt) == reference {
            return MatchKind::Exact;
        }

        let flipped_ref = complement_allele(query_ref);
        let flipped_alt: Vec<String> = query_alt.iter().map(|a| complement_allele(a)).collect();
        if allele_set(&flipped_ref, &flipped_alt) == reference {
            return MatchKind::Complement;
        }

        MatchKind::Absent
    }
}

/// Set equality, or a shared REF with at least one shared ALT.
///
/// Looser than [`SetEquality`]: a bi-allelic query matches a multi-allelic
/// reference site carrying its ALT.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyOverlap;

impl AnyOverlap {
    fn overlaps(
        query_ref: &str,
        query_alt: &[String],
        reference_ref: &str,
        reference_alt: &[String],
    ) -> bool {
        allele_set(query_ref, query_alt) == allele_set(reference_ref, reference_alt)
            || (query_ref == reference_ref && query_alt.iter().any(|a| reference_alt.contains(a)))
    }
}

impl AlleleMatcher for AnyOverlap {
    fn classify(
        &self,
        query_ref: &str,
        query_alt: &[String],
        reference_ref: &str,
        reference_alt: &[String],
    ) -> MatchKind {
        if Self::overlaps(query_ref, query_alt, reference_ref, reference_alt) {
            return MatchKind::Exact;
        }

        let flipped_ref = complement_allele(query_ref);
        let flipped_alt: Vec<String> = query_alt.iter().map(|a| complement_allele(a)).collect();
        if Self::overlaps(&flipped_ref, &flipped_alt, reference_ref, reference_alt) {
            return MatchKind::Complement;
        }

        MatchKind::Absent
    }
}

/// Strategy selected at runtime from a [`MatchMode`]
#[derive(Debug, Clone, Copy)]
pub enum ModeMatcher {
    SetEquality(SetEquality),
    AnyOverlap(AnyOverlap),
}

impl From<MatchMode> for ModeMatcher {
    fn from(mode: MatchMode) -> Self {
        match mode {
            MatchMode::SetEquality => Self::SetEquality(SetEquality),
            MatchMode::AnyOverlap => Self::AnyOverlap(AnyOverlap),
        }
    }
}

impl AlleleMatcher for ModeMatcher {
    fn classify(
        &self,
        query_ref: &str,
        query_alt: &[String],
        reference_ref: &str,
        reference_alt: &[String],
    ) -> MatchKind {
        match self {
            Self::SetEquality(m) => m.classify(query_ref, query_alt, reference_ref, reference_alt),
            Self::AnyOverlap(m) => m.classify(query_ref, query_alt, reference_ref, reference_alt),
        }
    }
}

/// Reference record re-expressed in the query's strand orientation.
///
/// For [`MatchKind::Complement`] the reference REF/ALT are complemented back so the
/// alleles reported on an output row read on the same strand as the query.
#[must_use]
pub fn orient_reference(reference: &VariantRecord, kind: MatchKind) -> VariantRecord {
    let mut oriented = reference.clone();
    if kind == MatchKind::Complement {
        oriented.reference = complement_allele(&reference.reference);
        oriented.alternates = reference
            .alternates
            .iter()
            .map(|a| complement_allele(a))
            .collect();
    }
    oriented
}

/// Index of the first (oriented) reference ALT that the query also carries; 0 if none
#[must_use]
pub fn shared_alternate_index(query: &VariantRecord, oriented_reference: &VariantRecord) -> usize {
    oriented_reference
        .alternates
        .iter()
        .position(|alt| query.alternates.contains(alt))
        .unwrap_or(0)
}
