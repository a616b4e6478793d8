use serde::{Deserialize, Serialize};

use crate::core::variant::Locus;

/// Verdict for one query record against its reference candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchKind {
    /// Same allele set (order and REF/ALT role ignored)
    Exact,
    /// Same allele set after complementing the query (strand flip)
    Complement,
    /// No candidate, or a candidate with different alleles
    Absent,
}

impl MatchKind {
    /// True when reference annotation should be copied onto the row
    #[must_use]
    pub fn is_match(self) -> bool {
        matches!(self, Self::Exact | Self::Complement)
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "EXACT"),
            Self::Complement => write!(f, "COMPLEMENT"),
            Self::Absent => write!(f, "ABSENT"),
        }
    }
}

/// How allele sets are compared at a shared coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Full allele-set equality
    #[default]
    SetEquality,
    /// Same REF and at least one shared ALT
    AnyOverlap,
}

/// Which input a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Query,
    Reference,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

/// A record observed out of non-decreasing (chromosome rank, position) order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderViolation {
    pub stream: StreamKind,
    pub previous: Locus,
    pub current: Locus,
}

impl std::fmt::Display for OrderViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} stream is not sorted: {} follows {}",
            self.stream, self.current, self.previous
        )
    }
}
