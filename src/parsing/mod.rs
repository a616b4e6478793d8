//! Decoders that turn text inputs into [`VariantRecord`](crate::core::variant::VariantRecord) streams.
//!
//! This module provides:
//!
//! - **VCF files**: read with noodles, plain, gzip or bgzip compressed
//! - **Superset tables**: tab-separated tables whose first four columns are
//!   `CHROM POS REF ALT`, with any further columns carried through verbatim
//!
//! Both decoders map their rows into the same thin
//! [`VariantRecord`](crate::core::variant::VariantRecord), keeping only the fields
//! the merge-join and the output sinks use.
//!
//! ## Example
//!
//! ```rust,no_run
//! use allele_join::parsing::vcf::VcfReader;
//! use std::path::Path;
//!
//! let reader = VcfReader::open(Path::new("cohort.vcf.gz"), true).unwrap();
//! for record in reader.records() {
//!     let record = record.unwrap();
//!     println!("{}:{} {}", record.chrom, record.pos, record.reference);
//! }
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::bgzf;
use thiserror::Error;

pub mod tsv;
pub mod vcf;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format on line {line}: {message}")]
    InvalidFormat { line: usize, message: String },

    #[error("Missing header: {0}")]
    MissingHeader(String),

    #[error("Invalid VCF header: {0}")]
    InvalidHeader(String),

    #[error("Invalid VCF record {record}: {message}")]
    InvalidRecord { record: usize, message: String },
}

/// Largest position accepted; VCF positions are 32-bit signed integers
pub const MAX_POSITION: u64 = i32::MAX as u64;

impl ParseError {
    pub(crate) fn invalid(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            line,
            message: message.into(),
        }
    }
}

/// Validate a 1-based position
pub(crate) fn check_position(pos: u64) -> Result<u64, String> {
    if pos == 0 || pos > MAX_POSITION {
        return Err(format!("position {pos} is outside 1..={MAX_POSITION}"));
    }
    Ok(pos)
}

/// Split a comma-separated ALT column; `None` if any allele is empty
pub(crate) fn parse_alternates(alt: &str) -> Option<Vec<String>> {
    let alternates: Vec<String> = alt.split(',').map(str::to_string).collect();
    if alternates.iter().any(String::is_empty) {
        return None;
    }
    Some(alternates)
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Gzip magic with the FEXTRA flag, followed by the `BC` extra subfield
fn has_bgzf_header(header: &[u8; 14]) -> bool {
    header[..4] == [0x1f, 0x8b, 0x08, 0x04] && header[12..14] == *b"BC"
}

/// Whether the file starts with a BGZF block header; the file is rewound
fn is_bgzf(file: &mut File) -> io::Result<bool> {
    let mut header = [0u8; 14];
    let bgzf = match file.read_exact(&mut header) {
        Ok(()) => has_bgzf_header(&header),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(e),
    };
    file.rewind()?;
    Ok(bgzf)
}

/// Open a text file, transparently decompressing gzip/bgzip input.
///
/// BGZF files are read with the noodles block reader. Plain gzip files, which
/// may hold several members, use a multi-member decoder.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let mut file = File::open(path)?;
    if !is_gzipped(path) {
        return Ok(Box::new(BufReader::new(file)));
    }

    if is_bgzf(&mut file)? {
        Ok(Box::new(BufReader::new(bgzf::Reader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    }
}
