use std::cmp::Ordering;
use std::collections::HashMap;

use thiserror::Error;

/// A chromosome name that is absent from the canonical order table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown chromosome '{name}': not present in the chromosome order")]
pub struct UnknownChromosomeError {
    pub name: String,
}

/// Canonical human chromosome order: mitochondrial, autosomes 1-22, X, Y
pub const HUMAN_CHROMOSOMES: [&str; 25] = [
    "chrM", "chr1", "chr2", "chr3", "chr4", "chr5", "chr6", "chr7", "chr8", "chr9", "chr10",
    "chr11", "chr12", "chr13", "chr14", "chr15", "chr16", "chr17", "chr18", "chr19", "chr20",
    "chr21", "chr22", "chrX", "chrY",
];

/// Names that all refer to the mitochondrial chromosome
const MITOCHONDRIAL_NAMES: [&str; 4] = ["chrM", "chrMT", "M", "MT"];

/// A fixed total order over chromosome names.
///
/// Ranks are precomputed into a hash index so lookups are O(1). Every name is
/// registered under both its UCSC (`chr1`) and NCBI (`1`) spelling, which therefore
/// compare as equal.
#[derive(Debug, Clone)]
pub struct ChromosomeOrder {
    /// Display names, indexed by rank
    names: Vec<String>,

    /// Index: any accepted spelling -> rank
    ranks: HashMap<String, usize>,
}

impl ChromosomeOrder {
    /// The canonical human order (chrM, chr1..chr22, chrX, chrY)
    #[must_use]
    pub fn human() -> Self {
        Self::from_names(HUMAN_CHROMOSOMES)
    }

    /// Build an order from names listed lowest rank first.
    ///
    /// A name repeated (under any spelling) keeps its first rank.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut order = Self {
            names: Vec::new(),
            ranks: HashMap::new(),
        };

        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || order.ranks.contains_key(name) {
                continue;
            }

            let rank = order.names.len();
            order.names.push(name.to_string());
            for spelling in spellings(name) {
                order.ranks.entry(spelling).or_insert(rank);
            }
        }

        order
    }

    /// Rank of a chromosome name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownChromosomeError` if the name is not in the order.
    pub fn rank(&self, name: &str) -> Result<usize, UnknownChromosomeError> {
        self.ranks
            .get(name)
            .copied()
            .ok_or_else(|| UnknownChromosomeError {
                name: name.to_string(),
            })
    }

    /// Compare two chromosome names by rank.
    ///
    /// # Errors
    ///
    /// Returns `UnknownChromosomeError` if either name is not in the order.
    pub fn compare(&self, a: &str, b: &str) -> Result<Ordering, UnknownChromosomeError> {
        Ok(self.rank(a)?.cmp(&self.rank(b)?))
    }

    /// The name this order uses for `name` (e.g. `chr7` for `7`).
    ///
    /// # Errors
    ///
    /// Returns `UnknownChromosomeError` if the name is not in the order.
    pub fn canonical(&self, name: &str) -> Result<&str, UnknownChromosomeError> {
        let rank = self.rank(name)?;
        Ok(&self.names[rank])
    }

    /// Display name at a rank
    #[must_use]
    pub fn name_at(&self, rank: usize) -> Option<&str> {
        self.names.get(rank).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.ranks.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ChromosomeOrder {
    fn default() -> Self {
        Self::human()
    }
}

/// All accepted spellings of a chromosome name, the name itself first
fn spellings(name: &str) -> Vec<String> {
    if MITOCHONDRIAL_NAMES.contains(&name) {
        let mut all = vec![name.to_string()];
        all.extend(
            MITOCHONDRIAL_NAMES
                .iter()
                .filter(|n| **n != name)
                .map(|n| (*n).to_string()),
        );
        return all;
    }

    match name.strip_prefix("chr") {
        Some(bare) if !bare.is_empty() => vec![name.to_string(), bare.to_string()],
        _ => vec![name.to_string(), format!("chr{name}")],
    }
}
