use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A genomic coordinate (1-based position)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locus {
    pub chrom: String,
    pub pos: u64,
}

impl Locus {
    pub fn new(chrom: impl Into<String>, pos: u64) -> Self {
        Self {
            chrom: chrom.into(),
            pos,
        }
    }
}

impl std::fmt::Display for Locus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chrom, self.pos)
    }
}

/// Diploid genotype classification of a single sample call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genotype {
    HomRef,
    Het,
    HomAlt,
    Missing,
    /// Any other call (multi-allelic, haploid, ...), kept verbatim
    Other(String),
}

impl Genotype {
    /// Classify a raw GT value; phased and unphased separators are treated alike
    pub fn parse(gt: &str) -> Self {
        match gt {
            "." | "./." | ".|." => Self::Missing,
            "0/0" | "0|0" => Self::HomRef,
            "0/1" | "1/0" | "0|1" | "1|0" => Self::Het,
            "1/1" | "1|1" => Self::HomAlt,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Genotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HomRef => write!(f, "HOM_REF"),
            Self::Het => write!(f, "HET"),
            Self::HomAlt => write!(f, "HOM_ALT"),
            Self::Missing => write!(f, "MISSING"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Per-sample call fields carried through to the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenotypeCall {
    /// Sample name from the VCF header
    pub sample: String,

    /// GT, or `None` when the FORMAT has no GT key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genotype: Option<Genotype>,

    /// GQ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,

    /// DP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,

    /// AD, one depth per allele (REF first)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allele_depths: Vec<u32>,

    /// PL, phred-scaled likelihoods in VCF order (hom-ref, het, hom-alt)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub likelihoods: Vec<u32>,
}

impl GenotypeCall {
    pub fn new(sample: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
            genotype: None,
            quality: None,
            depth: None,
            allele_depths: Vec::new(),
            likelihoods: Vec::new(),
        }
    }
}

/// Genotype tally across the samples of one record.
///
/// Calls that are neither HOM_REF, HET nor HOM_ALT, including calls without a
/// GT, count as missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenotypeCounts {
    pub hom_ref: u32,
    pub het: u32,
    pub hom_alt: u32,
    pub missing: u32,
}

impl GenotypeCounts {
    pub fn tally<'a>(calls: impl IntoIterator<Item = &'a GenotypeCall>) -> Self {
        let mut counts = Self::default();
        for call in calls {
            match call.genotype {
                Some(Genotype::HomRef) => counts.hom_ref += 1,
                Some(Genotype::Het) => counts.het += 1,
                Some(Genotype::HomAlt) => counts.hom_alt += 1,
                _ => counts.missing += 1,
            }
        }
        counts
    }
}

/// A decoded variant record, the unit consumed by the merge-join engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    /// Chromosome name as written in the source
    pub chrom: String,

    /// 1-based position
    pub pos: u64,

    /// Reference allele
    pub reference: String,

    /// Alternate alleles, in source order
    pub alternates: Vec<String>,

    /// Variant identifier (e.g. an rsID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// INFO key/values; flags map to an empty value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub info: BTreeMap<String, String>,

    /// Per-sample calls, when the decoder was asked to keep them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<GenotypeCall>>,

    /// Extra source columns carried verbatim to the output
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub passthrough: Vec<String>,
}

impl VariantRecord {
    pub fn new(
        chrom: impl Into<String>,
        pos: u64,
        reference: impl Into<String>,
        alternates: Vec<String>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            pos,
            reference: reference.into(),
            alternates,
            id: None,
            info: BTreeMap::new(),
            samples: None,
            passthrough: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_samples(mut self, samples: Vec<GenotypeCall>) -> Self {
        self.samples = Some(samples);
        self
    }

    #[must_use]
    pub fn locus(&self) -> Locus {
        Locus::new(self.chrom.clone(), self.pos)
    }

    /// Alternate alleles joined the way VCF writes them
    #[must_use]
    pub fn alternates_joined(&self) -> String {
        self.alternates.join(",")
    }

    /// Tally of the decoded sample genotypes; all zero without samples
    #[must_use]
    pub fn genotype_counts(&self) -> GenotypeCounts {
        GenotypeCounts::tally(self.samples.iter().flatten())
    }

    /// Allele frequency for one alternate, from a per-allele INFO/AF list
    #[must_use]
    pub fn allele_frequency(&self, alt_index: usize) -> Option<&str> {
        self.info
            .get("AF")
            .and_then(|af| af.split(',').nth(alt_index))
            .filter(|af| !af.is_empty() && *af != ".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genotype_parse() {
        assert_eq!(Genotype::parse("0/0"), Genotype::HomRef);
        assert_eq!(Genotype::parse("0|1"), Genotype::Het);
        assert_eq!(Genotype::parse("1/0"), Genotype::Het);
        assert_eq!(Genotype::parse("1|1"), Genotype::HomAlt);
        assert_eq!(Genotype::parse("./."), Genotype::Missing);
        assert_eq!(Genotype::parse("."), Genotype::Missing);
        assert_eq!(Genotype::parse("1/2"), Genotype::Other("1/2".to_string()));
        assert_eq!(Genotype::parse("0/1").to_string(), "HET");
    }

    #[test]
    fn test_genotype_counts() {
        let calls: Vec<GenotypeCall> = ["0/0", "0|0", "0/1", "1|0", "1/1", "./.", "1/2"]
            .iter()
            .map(|gt| {
                let mut call = GenotypeCall::new("S");
                call.genotype = Some(Genotype::parse(gt));
                call
            })
            .chain(std::iter::once(GenotypeCall::new("no_gt")))
            .collect();
        let record = VariantRecord::new("chr1", 5, "A", vec!["G".into()]).with_samples(calls);

        assert_eq!(
            record.genotype_counts(),
            GenotypeCounts {
                hom_ref: 2,
                het: 2,
                hom_alt: 1,
                missing: 3,
            }
        );

        let bare = VariantRecord::new("chr1", 5, "A", vec!["G".into()]);
        assert_eq!(bare.genotype_counts(), GenotypeCounts::default());
    }

    #[test]
    fn test_allele_frequency() {
        let record = VariantRecord::new("chr1", 100, "A", vec!["T".into(), "G".into()])
            .with_info("AF", "0.1,0.25");
        assert_eq!(record.allele_frequency(0), Some("0.1"));
        assert_eq!(record.allele_frequency(1), Some("0.25"));
        assert_eq!(record.allele_frequency(2), None);

        let no_af = VariantRecord::new("chr1", 100, "A", vec!["T".into()]);
        assert_eq!(no_af.allele_frequency(0), None);
    }

    #[test]
    fn test_locus_display() {
        let record = VariantRecord::new("chr2", 50, "C", vec!["G".into()]);
        assert_eq!(record.locus().to_string(), "chr2:50");
        assert_eq!(record.alternates_joined(), "G");
    }
}
