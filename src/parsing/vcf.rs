//! VCF record decoding using noodles.
//!
//! Records are read into a reusable noodles [`RecordBuf`] and mapped onto the
//! thin [`VariantRecord`] the merge-join consumes: CHROM, POS, ID, REF, ALT and
//! INFO, plus the per-sample GT/GQ/DP/AD/PL fields when asked for. Reference
//! panels can carry thousands of samples that are never emitted, so calls are
//! only mapped for readers opened with `keep_samples`.

use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::path::Path;

use noodles::vcf;
use noodles::vcf::variant::record::samples::series::value::genotype::Phasing;
use noodles::vcf::variant::record::{AlternateBases, Ids};
use noodles::vcf::variant::record_buf::info::field::value::Array as InfoArray;
use noodles::vcf::variant::record_buf::info::field::Value as InfoValue;
use noodles::vcf::variant::record_buf::samples::sample::value::{
    Array as SampleArray, Genotype as GenotypeValue,
};
use noodles::vcf::variant::record_buf::samples::sample::Value as SampleValue;
use noodles::vcf::variant::RecordBuf;
use tracing::warn;

use crate::core::variant::{Genotype, GenotypeCall, VariantRecord};
use crate::parsing::{check_position, open_text, ParseError};

/// Streaming VCF reader yielding [`VariantRecord`]s
pub struct VcfReader<R> {
    inner: vcf::io::Reader<R>,
    header: vcf::Header,
    samples: Vec<String>,
    keep_samples: bool,
    record: RecordBuf,
    record_number: usize,
}

impl VcfReader<Box<dyn BufRead>> {
    /// Open a VCF file (plain, gzip, or bgzip) and read its header
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be read, or
    /// `ParseError::InvalidHeader` if the header does not parse.
    pub fn open(path: &Path, keep_samples: bool) -> Result<Self, ParseError> {
        let reader = open_text(path)?;
        Self::new(reader, keep_samples)
    }
}

impl<R: BufRead> VcfReader<R> {
    /// Create a reader and consume the header
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidHeader` if the meta lines or the `#CHROM`
    /// line are missing or malformed.
    pub fn new(inner: R, keep_samples: bool) -> Result<Self, ParseError> {
        let mut inner = vcf::io::Reader::new(inner);
        let header = inner
            .read_header()
            .map_err(|e| ParseError::InvalidHeader(e.to_string()))?;

        let samples = header
            .sample_names()
            .iter()
            .map(ToString::to_string)
            .collect();

        Ok(Self {
            inner,
            header,
            samples,
            keep_samples,
            record: RecordBuf::default(),
            record_number: 0,
        })
    }

    /// Sample names from the `#CHROM` line
    pub fn sample_names(&self) -> &[String] {
        &self.samples
    }

    /// Read the next record, or `None` at end of input
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` on read failure or `ParseError::InvalidRecord`
    /// for a record that does not decode.
    pub fn read_record(&mut self) -> Result<Option<VariantRecord>, ParseError> {
        let record = self.record_number + 1;
        match self.inner.read_record_buf(&self.header, &mut self.record) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(ParseError::InvalidRecord {
                    record,
                    message: e.to_string(),
                });
            }
            Err(e) => return Err(ParseError::Io(e)),
        }
        self.record_number = record;

        let samples = self.keep_samples.then_some(self.samples.as_slice());
        convert_record(&self.record, samples).map(Some).map_err(|message| {
            ParseError::InvalidRecord { record, message }
        })
    }

    /// Iterate over all remaining records
    pub fn records(self) -> VcfRecords<R> {
        VcfRecords {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over VCF records; stops after the first error
pub struct VcfRecords<R> {
    reader: VcfReader<R>,
    done: bool,
}

impl<R: BufRead> Iterator for VcfRecords<R> {
    type Item = Result<VariantRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Map a noodles record onto a [`VariantRecord`]
///
/// `samples` carries the header sample names when calls should be mapped.
fn convert_record(record: &RecordBuf, samples: Option<&[String]>) -> Result<VariantRecord, String> {
    let chrom = record.reference_sequence_name();

    let pos = record
        .variant_start()
        .map(|p| p.get() as u64)
        .ok_or_else(|| "missing position".to_string())
        .and_then(check_position)?;

    let reference = record.reference_bases();
    if reference.is_empty() {
        return Err("empty REF".to_string());
    }

    let mut alternates: Vec<String> = record
        .alternate_bases()
        .iter()
        .map(|allele| allele.map(str::to_string))
        .collect::<io::Result<_>>()
        .map_err(|e| format!("invalid ALT: {e}"))?;
    if alternates.iter().any(String::is_empty) {
        return Err("empty ALT allele".to_string());
    }
    if alternates.is_empty() {
        alternates.push(".".to_string());
    }

    let mut variant = VariantRecord::new(chrom, pos, reference, alternates);

    let ids = record.ids();
    if !ids.is_empty() {
        variant.id = Some(ids.iter().collect::<Vec<_>>().join(";"));
    }

    variant.info = record
        .info()
        .as_ref()
        .iter()
        .map(|(key, value)| (key.clone(), info_text(value.as_ref())))
        .collect::<BTreeMap<_, _>>();

    if let Some(names) = samples {
        variant.samples = Some(convert_calls(record, names)?);
    }

    Ok(variant)
}

/// Render an INFO value as VCF text; flags and missing values are empty
fn info_text(value: Option<&InfoValue>) -> String {
    match value {
        None | Some(InfoValue::Flag) => String::new(),
        Some(InfoValue::Integer(n)) => n.to_string(),
        Some(InfoValue::Float(x)) => x.to_string(),
        Some(InfoValue::Character(c)) => c.to_string(),
        Some(InfoValue::String(s)) => s.clone(),
        Some(InfoValue::Array(InfoArray::Integer(values))) => join_list(values),
        Some(InfoValue::Array(InfoArray::Float(values))) => join_list(values),
        Some(InfoValue::Array(InfoArray::Character(values))) => join_list(values),
        Some(InfoValue::Array(InfoArray::String(values))) => join_list(values),
    }
}

/// Comma-join a list, writing `.` for missing entries
fn join_list<T: ToString>(values: &[Option<T>]) -> String {
    values
        .iter()
        .map(|v| v.as_ref().map_or_else(|| ".".to_string(), ToString::to_string))
        .collect::<Vec<_>>()
        .join(",")
}

fn convert_calls(record: &RecordBuf, names: &[String]) -> Result<Vec<GenotypeCall>, String> {
    let samples = record.samples();
    let keys = samples.keys().as_ref();

    let calls: Vec<GenotypeCall> = names
        .iter()
        .zip(samples.values())
        .map(|(name, sample)| {
            let mut call = GenotypeCall::new(name.as_str());
            for (key, value) in keys.iter().zip(sample.values()) {
                apply_field(&mut call, key, value.as_ref());
            }
            call
        })
        .collect();

    if calls.len() != names.len() {
        return Err(format!(
            "expected {} sample columns, found {}",
            names.len(),
            calls.len()
        ));
    }
    Ok(calls)
}

fn apply_field(call: &mut GenotypeCall, key: &str, value: Option<&SampleValue>) {
    match (key, value) {
        ("GT", None) => call.genotype = Some(Genotype::Missing),
        ("GT", Some(SampleValue::Genotype(genotype))) => {
            call.genotype = Some(Genotype::parse(&genotype_text(genotype)));
        }
        ("GT", Some(SampleValue::String(raw))) => call.genotype = Some(Genotype::parse(raw)),
        ("GQ", Some(SampleValue::Integer(n))) => call.quality = u32::try_from(*n).ok(),
        ("DP", Some(SampleValue::Integer(n))) => call.depth = u32::try_from(*n).ok(),
        ("AD", Some(value)) => call.allele_depths = int_list(&call.sample, key, value),
        ("PL", Some(value)) => call.likelihoods = int_list(&call.sample, key, value),
        _ => {}
    }
}

/// Rebuild the GT text from its alleles, e.g. `0|1` or `./.`
fn genotype_text(genotype: &GenotypeValue) -> String {
    let mut text = String::new();
    for (i, allele) in genotype.as_ref().iter().enumerate() {
        if i > 0 {
            text.push(match allele.phasing() {
                Phasing::Phased => '|',
                Phasing::Unphased => '/',
            });
        }
        match allele.position() {
            Some(position) => text.push_str(&position.to_string()),
            None => text.push('.'),
        }
    }
    text
}

/// Integer list field; empty when any element is missing or negative
fn int_list(sample: &str, key: &str, value: &SampleValue) -> Vec<u32> {
    let SampleValue::Array(SampleArray::Integer(values)) = value else {
        warn!(sample, key, "Ignoring sample field that is not an integer list");
        return Vec::new();
    };

    let parsed: Option<Vec<u32>> = values
        .iter()
        .map(|v| v.and_then(|n| u32::try_from(n).ok()))
        .collect();
    parsed.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{BufReader, Write};

    const VCF: &str = "##fileformat=VCFv4.2
##contig=<ID=chr1,length=248956422>
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\">
##INFO=<ID=DB,Number=0,Type=Flag,Description=\"dbSNP membership\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=GQ,Number=1,Type=Integer,Description=\"Genotype Quality\">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read Depth\">
##FORMAT=<ID=AD,Number=R,Type=Integer,Description=\"Allelic depths\">
##FORMAT=<ID=PL,Number=G,Type=Integer,Description=\"Phred-scaled genotype likelihoods\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA001\tNA002
chr1\t100\trs1\tA\tT\t50\tPASS\tAF=0.3;DB\tGT:AD:DP:GQ:PL\t0/1:10,12:22:99:300,0,250\t./.:.:.:.:.
chr1\t200\t.\tC\tG,T\t.\t.\tAF=0.1,0.25\tGT:GQ\t1/1:40\t0|0:.
";

    /// Header for records without sample columns
    const SITES: &str = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";

    fn reader(text: &str, keep_samples: bool) -> VcfReader<BufReader<&[u8]>> {
        VcfReader::new(BufReader::new(text.as_bytes()), keep_samples).unwrap()
    }

    #[test]
    fn test_parse_records_with_samples() {
        let reader = reader(VCF, true);
        assert_eq!(reader.sample_names(), ["NA001", "NA002"]);

        let records: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.chrom, "chr1");
        assert_eq!(first.pos, 100);
        assert_eq!(first.id.as_deref(), Some("rs1"));
        assert_eq!(first.reference, "A");
        assert_eq!(first.alternates, vec!["T"]);
        assert_eq!(first.info.get("AF").map(String::as_str), Some("0.3"));
        assert_eq!(first.info.get("DB").map(String::as_str), Some(""));

        let calls = first.samples.as_ref().unwrap();
        assert_eq!(calls[0].sample, "NA001");
        assert_eq!(calls[0].genotype, Some(Genotype::Het));
        assert_eq!(calls[0].allele_depths, vec![10, 12]);
        assert_eq!(calls[0].depth, Some(22));
        assert_eq!(calls[0].quality, Some(99));
        assert_eq!(calls[0].likelihoods, vec![300, 0, 250]);
        assert_eq!(calls[1].genotype, Some(Genotype::Missing));
        assert_eq!(calls[1].depth, None);
        assert!(calls[1].allele_depths.is_empty());

        let second = &records[1];
        assert!(second.id.is_none());
        assert_eq!(second.alternates, vec!["G", "T"]);
        assert_eq!(second.allele_frequency(1), Some("0.25"));
        let calls = second.samples.as_ref().unwrap();
        assert_eq!(calls[0].genotype, Some(Genotype::HomAlt));
        assert_eq!(calls[0].quality, Some(40));
        assert_eq!(calls[1].genotype, Some(Genotype::HomRef));
        assert_eq!(calls[1].quality, None);
    }

    #[test]
    fn test_samples_skipped_when_not_requested() {
        let records: Vec<_> = reader(VCF, false)
            .records()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(records.iter().all(|r| r.samples.is_none()));
    }

    #[test]
    fn test_sites_only_record() {
        let text = format!("{SITES}chr2\t7\trs7\tC\t.\t.\t.\t.\n");
        let record = reader(&text, true).read_record().unwrap().unwrap();
        assert_eq!(record.alternates, vec!["."]);
        assert!(record.info.is_empty());
        assert_eq!(record.samples, Some(Vec::new()));
    }

    #[test]
    fn test_missing_fileformat_rejected() {
        let text = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\nchr1\t100\t.\tA\tT\t.\t.\t.\n";
        let result = VcfReader::new(BufReader::new(text.as_bytes()), false);
        assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
    }

    #[test]
    fn test_invalid_position() {
        let text = format!("{SITES}chr1\tabc\t.\tA\tT\t.\t.\t.\n");
        let err = reader(&text, false).read_record().unwrap_err();
        assert!(matches!(err, ParseError::InvalidRecord { record: 1, .. }));
    }

    #[test]
    fn test_position_beyond_vcf_range_rejected() {
        let text = format!("{SITES}chr1\t2147483648\t.\tA\tT\t.\t.\t.\n");
        assert!(reader(&text, false).read_record().is_err());

        let text = format!("{SITES}chr1\t18446744073709551615\t.\tA\tT\t.\t.\t.\n");
        assert!(reader(&text, false).read_record().is_err());

        let text = format!("{SITES}chr1\t2147483647\t.\tA\tT\t.\t.\t.\n");
        let record = reader(&text, false).read_record().unwrap().unwrap();
        assert_eq!(record.pos, 2_147_483_647);
    }

    #[test]
    fn test_empty_alternate_rejected() {
        let text = format!("{SITES}chr1\t5\t.\tA\tT,\t.\t.\t.\n");
        assert!(reader(&text, false).read_record().is_err());
    }

    #[test]
    fn test_sample_column_count_mismatch() {
        let text = "##fileformat=VCFv4.2\n\
                    #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\n\
                    chr1\t5\t.\tA\tT\t.\t.\t.\tGT\t0/1\n";
        assert!(reader(text, true).read_record().is_err());
    }

    #[test]
    fn test_records_stop_after_error() {
        let text = format!("{SITES}chr1\tx\t.\tA\tT\t.\t.\t.\nchr1\t6\t.\tA\tT\t.\t.\t.\n");
        let mut records = reader(&text, false).records();
        assert!(records.next().unwrap().is_err());
        assert!(records.next().is_none());
    }

    #[test]
    fn test_open_gzipped() {
        let mut file = tempfile::Builder::new().suffix(".vcf.gz").tempfile().unwrap();
        {
            let mut encoder =
                flate2::write::GzEncoder::new(&mut file, flate2::Compression::default());
            encoder.write_all(VCF.as_bytes()).unwrap();
            encoder.finish().unwrap();
        }

        let reader = VcfReader::open(file.path(), false).unwrap();
        let records: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].pos, 200);
    }

    #[test]
    fn test_open_bgzipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.vcf.bgz");
        {
            let mut writer = noodles::bgzf::Writer::new(File::create(&path).unwrap());
            writer.write_all(VCF.as_bytes()).unwrap();
        }

        let reader = VcfReader::open(&path, true).unwrap();
        let records: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("rs1"));
    }
}
