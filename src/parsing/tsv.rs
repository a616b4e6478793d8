//! Decoder for superset tables.
//!
//! A superset table is delimited text with a header line. The first four columns
//! are `CHROM POS REF ALT` (ALT may be comma-separated); any further columns are
//! carried through to the output untouched. Consecutive rows may repeat the same
//! variant (e.g. one row per sample); each row is its own query record.

use std::io::BufRead;
use std::path::Path;

use crate::core::variant::VariantRecord;
use crate::parsing::{check_position, open_text, parse_alternates, ParseError};

/// Number of leading columns that describe the variant
const VARIANT_COLUMNS: usize = 4;

/// Streaming reader over a superset table
pub struct SupersetReader<R> {
    inner: R,
    delimiter: char,
    header: Vec<String>,
    line_number: usize,
    buf: String,
}

impl SupersetReader<Box<dyn BufRead>> {
    /// Open a superset table (plain or gzipped) and read its header
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be read, or
    /// `ParseError::MissingHeader` if the header is absent or too short.
    pub fn open(path: &Path, delimiter: char) -> Result<Self, ParseError> {
        let reader = open_text(path)?;
        Self::new(reader, delimiter)
    }
}

impl<R: BufRead> SupersetReader<R> {
    /// Create a reader and consume the header line
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingHeader` if the input is empty or the header
    /// has fewer than four columns.
    pub fn new(inner: R, delimiter: char) -> Result<Self, ParseError> {
        let mut reader = Self {
            inner,
            delimiter,
            header: Vec::new(),
            line_number: 0,
            buf: String::new(),
        };

        if !reader.next_line()? {
            return Err(ParseError::MissingHeader("superset table is empty".to_string()));
        }

        let header: Vec<String> = reader
            .buf
            .trim_end_matches(['\r', '\n'])
            .split(delimiter)
            .map(str::to_string)
            .collect();

        if header.len() < VARIANT_COLUMNS {
            return Err(ParseError::MissingHeader(format!(
                "expected at least {VARIANT_COLUMNS} header columns (CHROM POS REF ALT), found {}",
                header.len()
            )));
        }

        reader.header = header;
        Ok(reader)
    }

    /// All header columns
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Header names of the pass-through columns
    pub fn extra_columns(&self) -> &[String] {
        &self.header[VARIANT_COLUMNS..]
    }

    /// Read the next row, or `None` at end of input
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` for rows with too few columns, an
    /// invalid position, or an empty allele.
    pub fn read_record(&mut self) -> Result<Option<VariantRecord>, ParseError> {
        loop {
            if !self.next_line()? {
                return Ok(None);
            }

            let line = self.buf.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }

            let line_num = self.line_number;
            let fields: Vec<&str> = line.split(self.delimiter).collect();
            if fields.len() < VARIANT_COLUMNS {
                return Err(ParseError::invalid(
                    line_num,
                    format!(
                        "expected at least {VARIANT_COLUMNS} fields, found {}",
                        fields.len()
                    ),
                ));
            }

            let pos: u64 = fields[1].trim().parse().map_err(|_| {
                ParseError::invalid(line_num, format!("invalid position '{}'", fields[1]))
            })?;
            let pos = check_position(pos).map_err(|message| ParseError::invalid(line_num, message))?;

            if fields[2].is_empty() {
                return Err(ParseError::invalid(line_num, "empty REF"));
            }

            let alternates = parse_alternates(fields[3]).ok_or_else(|| {
                ParseError::invalid(line_num, format!("invalid ALT '{}'", fields[3]))
            })?;

            let mut record = VariantRecord::new(fields[0].trim(), pos, fields[2], alternates);
            record.passthrough = fields[VARIANT_COLUMNS..]
                .iter()
                .map(|f| (*f).to_string())
                .collect();

            return Ok(Some(record));
        }
    }

    /// Iterate over all remaining rows; stops after the first error
    pub fn records(mut self) -> impl Iterator<Item = Result<VariantRecord, ParseError>> {
        let mut done = false;
        std::iter::from_fn(move || {
            if done {
                return None;
            }
            match self.read_record() {
                Ok(Some(record)) => Some(Ok(record)),
                Ok(None) => {
                    done = true;
                    None
                }
                Err(e) => {
                    done = true;
                    Some(Err(e))
                }
            }
        })
    }

    fn next_line(&mut self) -> Result<bool, ParseError> {
        self.buf.clear();
        let read = self.inner.read_line(&mut self.buf)?;
        if read == 0 {
            return Ok(false);
        }
        self.line_number += 1;
        Ok(true)
    }
}
