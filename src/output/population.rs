use std::io::{self, Write};

use crate::core::variant::GenotypeCall;
use crate::matching::engine::MatchResult;
use crate::output::{or_na, OutputSink, NA};

/// Fixed leading columns of a population annotation row
pub const POPULATION_COLUMNS: [&str; 14] = [
    "CHROM",
    "POS",
    "REF",
    "ALT",
    "MATCH",
    "ID",
    "AF",
    "REFERENCE_REF",
    "REFERENCE_ALT",
    "QUERY_ID",
    "HOM_REF",
    "HET",
    "HOM_ALT",
    "MISSING",
];

/// Per-sample column suffixes, one group per query sample
pub const SAMPLE_COLUMNS: [&str; 8] = [
    "GT",
    "GQ",
    "DP",
    "REF_DP",
    "ALT_DP",
    "HOM_REF_PHRED",
    "HET_PHRED",
    "HOM_ALT_PHRED",
];

/// Tab-separated population annotation writer.
///
/// The header is written on construction. The genotype tallies count the query's
/// own sample calls. Sample columns follow the order of the query VCF header,
/// which is also the order the decoder produces calls in.
pub struct PopulationTsvSink<W: Write> {
    writer: W,
    samples: Vec<String>,
}

impl<W: Write> PopulationTsvSink<W> {
    /// Create the sink and write the header line
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn new(mut writer: W, samples: Vec<String>) -> io::Result<Self> {
        let mut header: Vec<String> = POPULATION_COLUMNS.iter().map(|c| (*c).to_string()).collect();
        for sample in &samples {
            header.extend(SAMPLE_COLUMNS.iter().map(|c| format!("{sample}_{c}")));
        }
        writeln!(writer, "{}", header.join("\t"))?;
        Ok(Self { writer, samples })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// The eight per-sample fields; AD and PL are reported only when bi-allelic
fn sample_fields(call: Option<&GenotypeCall>) -> [String; 8] {
    let Some(call) = call else {
        return std::array::from_fn(|_| NA.to_string());
    };

    let (ref_depth, alt_depth) = match call.allele_depths.as_slice() {
        [r, a] => (Some(*r), Some(*a)),
        _ => (None, None),
    };
    let (hom_ref, het, hom_alt) = match call.likelihoods.as_slice() {
        [r, h, a] => (Some(*r), Some(*h), Some(*a)),
        _ => (None, None, None),
    };

    [
        or_na(call.genotype.as_ref()),
        or_na(call.quality),
        or_na(call.depth),
        or_na(ref_depth),
        or_na(alt_depth),
        or_na(hom_ref),
        or_na(het),
        or_na(hom_alt),
    ]
}

impl<W: Write> OutputSink for PopulationTsvSink<W> {
    fn emit(&mut self, result: &MatchResult<'_>) -> io::Result<()> {
        let query = result.query;
        let mut fields = vec![
            query.chrom.clone(),
            query.pos.to_string(),
            query.reference.clone(),
            query.alternates_joined(),
            result.kind.to_string(),
            or_na(result.reference_id()),
            or_na(result.allele_frequency()),
            or_na(result.reference.as_ref().map(|r| r.reference.as_str())),
            or_na(result.reference.as_ref().map(|r| r.alternates_joined())),
            or_na(query.id.as_deref()),
        ];

        let counts = query.genotype_counts();
        fields.extend(
            [counts.hom_ref, counts.het, counts.hom_alt, counts.missing].map(|n| n.to_string()),
        );

        let mut calls = query.samples.as_deref().unwrap_or_default().iter();
        for _ in &self.samples {
            fields.extend(sample_fields(calls.next()));
        }

        writeln!(self.writer, "{}", fields.join("\t"))
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
