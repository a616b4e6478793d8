use std::io::{self, Write};

use crate::matching::engine::MatchResult;
use crate::output::OutputSink;

/// Tab-separated subset-membership writer.
///
/// Each query row is written back with a `True`/`False` column recording
/// whether the reference holds the same variant, followed by the query's own
/// extra columns.
pub struct MembershipTsvSink<W: Write> {
    writer: W,
}

impl<W: Write> MembershipTsvSink<W> {
    /// Create the sink and write the header line
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn new(mut writer: W, column: &str, extra_columns: &[String]) -> io::Result<Self> {
        let mut header = vec!["CHROM", "POS", "REF", "ALT", "MATCH", column];
        header.extend(extra_columns.iter().map(String::as_str));
        writeln!(writer, "{}", header.join("\t"))?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for MembershipTsvSink<W> {
    fn emit(&mut self, result: &MatchResult<'_>) -> io::Result<()> {
        let query = result.query;
        let member = if result.kind.is_match() { "True" } else { "False" };

        write!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            query.chrom,
            query.pos,
            query.reference,
            query.alternates_joined(),
            result.kind,
            member
        )?;
        for value in &query.passthrough {
            write!(self.writer, "\t{value}")?;
        }
        writeln!(self.writer)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
