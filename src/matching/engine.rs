use std::collections::VecDeque;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::chrom::{ChromosomeOrder, UnknownChromosomeError};
use crate::core::types::{MatchKind, OrderViolation, StreamKind};
use crate::core::variant::{Locus, VariantRecord};
use crate::matching::allele::{orient_reference, shared_alternate_index, AlleleMatcher};
use crate::matching::cursor::{Peeked, SortedStreamCursor};
use crate::output::OutputSink;
use crate::parsing::ParseError;
use crate::store::{ReferenceLookup, StoreError, Window};

#[derive(Error, Debug)]
pub enum JoinError {
    #[error(transparent)]
    UnknownChromosome(#[from] UnknownChromosomeError),

    #[error("Ambiguous match at {locus}: {candidates} reference records share the coordinate")]
    AmbiguousMatch { locus: Locus, candidates: usize },

    #[error("{0}")]
    StreamOrderViolation(OrderViolation),

    #[error("Failed to decode input: {0}")]
    Parse(#[from] ParseError),

    #[error("Reference store error: {0}")]
    Store(StoreError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl From<StoreError> for JoinError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownChromosome(e) => Self::UnknownChromosome(e),
            StoreError::OrderViolation(v) => Self::StreamOrderViolation(v),
            other => Self::Store(other),
        }
    }
}

/// Verdict for one query record
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'a> {
    /// The query record, in input order
    pub query: &'a VariantRecord,

    /// The matched reference record, re-oriented to the query strand.
    /// `None` unless `kind` is a match.
    pub reference: Option<VariantRecord>,

    pub kind: MatchKind,
}

impl MatchResult<'_> {
    /// Reference allele frequency for the ALT the query shares, if any
    #[must_use]
    pub fn allele_frequency(&self) -> Option<&str> {
        let reference = self.reference.as_ref()?;
        reference.allele_frequency(shared_alternate_index(self.query, reference))
    }

    /// Reference identifier, when matched
    #[must_use]
    pub fn reference_id(&self) -> Option<&str> {
        self.reference.as_ref().and_then(|r| r.id.as_deref())
    }
}

/// Query count for one chromosome, in stream order, under its canonical name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChromosomeCount {
    pub chrom: String,
    pub queries: u64,
}

/// Counters for one merge-join run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    pub total: u64,
    pub exact: u64,
    pub complement: u64,
    pub absent: u64,
    /// Absent rows that had a reference record at their coordinate
    pub mismatched: u64,
    /// Reference candidates passed over without a query at their coordinate
    pub reference_skipped: u64,
    pub windows_fetched: u64,
    pub per_chromosome: Vec<ChromosomeCount>,
}

impl JoinStats {
    fn record(&mut self, chrom: &str, kind: MatchKind, mismatched: bool) {
        self.total += 1;
        match kind {
            MatchKind::Exact => self.exact += 1,
            MatchKind::Complement => self.complement += 1,
            MatchKind::Absent => self.absent += 1,
        }
        if mismatched {
            self.mismatched += 1;
        }

        match self.per_chromosome.last_mut() {
            Some(last) if last.chrom == chrom => last.queries += 1,
            _ => self.per_chromosome.push(ChromosomeCount {
                chrom: chrom.to_string(),
                queries: 1,
            }),
        }
    }

    /// Number of rows with a reference match
    #[must_use]
    pub fn matched(&self) -> u64 {
        self.exact + self.complement
    }
}

/// Steps of the join loop
#[derive(Debug, Clone, PartialEq)]
enum EngineState {
    Init,
    Compare,
    FetchWindow { anchor: u64 },
    AdvanceReference,
    Emit {
        kind: MatchKind,
        reference: Option<VariantRecord>,
        mismatched: bool,
    },
    AdvanceQuery,
    Done,
}

/// Reference candidates for the chromosome of the current query
#[derive(Debug)]
struct WindowBuffer {
    chrom: String,
    rank: usize,
    candidates: VecDeque<VariantRecord>,
    /// Exclusive end of the positions fetched so far; 0 before the first fetch
    end: u64,
    /// The lookup has no further candidates on this chromosome
    terminal: bool,
}

impl WindowBuffer {
    fn new(chrom: &str, rank: usize) -> Self {
        Self {
            chrom: chrom.to_string(),
            rank,
            candidates: VecDeque::new(),
            end: 0,
            terminal: false,
        }
    }
}

/// Sort-merge join of a sorted query stream against a windowed reference.
///
/// Emits exactly one [`MatchResult`] per query record, in query order. The
/// reference is read forward only through a [`ReferenceLookup`], one window at a
/// time, and released chromosome by chromosome as the query moves on.
pub struct MergeJoinEngine<L, M> {
    lookup: L,
    matcher: M,
    order: ChromosomeOrder,
}

impl<L: ReferenceLookup, M: AlleleMatcher> MergeJoinEngine<L, M> {
    pub fn new(lookup: L, matcher: M, order: ChromosomeOrder) -> Self {
        Self {
            lookup,
            matcher,
            order,
        }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub fn into_lookup(self) -> L {
        self.lookup
    }

    /// Join `queries` against the reference, writing one row per query to `sink`
    ///
    /// # Errors
    ///
    /// Fails fast on an unknown chromosome, an unsorted stream, more than one
    /// reference record at a query coordinate, or any decode, store, or output
    /// error. Rows emitted before the failure stay in the sink.
    pub fn run<I, E, S>(&mut self, queries: I, sink: &mut S) -> Result<JoinStats, JoinError>
    where
        I: IntoIterator<Item = Result<VariantRecord, E>>,
        JoinError: From<E>,
        S: OutputSink + ?Sized,
    {
        let mut stats = JoinStats::default();
        let mut buffer: Option<WindowBuffer> = None;
        let mut cursor =
            SortedStreamCursor::new(queries.into_iter(), &self.order, StreamKind::Query)?;
        let mut state = EngineState::Init;

        loop {
            state = match state {
                EngineState::Init => {
                    debug!("Starting merge-join");
                    EngineState::Compare
                }

                EngineState::Compare => {
                    let (Peeked::Record(query), Some(rank)) = (cursor.peek(), cursor.rank()) else {
                        break;
                    };

                    if buffer.as_ref().map_or(true, |b| b.rank != rank) {
                        if let Some(stale) = buffer.take() {
                            debug!(chrom = %stale.chrom, "Query moved past reference chromosome");
                            self.lookup.release(&stale.chrom);
                        }
                        buffer = Some(WindowBuffer::new(&query.chrom, rank));
                    }

                    match buffer.as_ref() {
                        Some(window) => Self::compare(&self.matcher, query, window)?,
                        None => EngineState::Done,
                    }
                }

                EngineState::FetchWindow { anchor } => {
                    if let Some(window) = buffer.as_mut() {
                        stats.windows_fetched += 1;
                        match self.lookup.fetch_window(&window.chrom, anchor)? {
                            Window::Candidates { records, end } => {
                                window.candidates.extend(records);
                                window.end = end;
                                window.terminal = end == u64::MAX;
                            }
                            Window::Exhausted => window.terminal = true,
                        }
                    }
                    EngineState::Compare
                }

                EngineState::AdvanceReference => {
                    if let Some(window) = buffer.as_mut() {
                        window.candidates.pop_front();
                        stats.reference_skipped += 1;
                    }
                    EngineState::Compare
                }

                EngineState::Emit {
                    kind,
                    reference,
                    mismatched,
                } => {
                    if let Peeked::Record(query) = cursor.peek() {
                        let chrom = self.order.canonical(&query.chrom)?;
                        let result = MatchResult {
                            query,
                            reference,
                            kind,
                        };
                        sink.emit(&result)?;
                        stats.record(chrom, kind, mismatched);
                    }
                    EngineState::AdvanceQuery
                }

                EngineState::AdvanceQuery => {
                    cursor.advance()?;
                    EngineState::Compare
                }

                EngineState::Done => break,
            };
        }

        if let Some(window) = buffer.take() {
            self.lookup.release(&window.chrom);
        }
        sink.finish()?;

        info!(
            total = stats.total,
            exact = stats.exact,
            complement = stats.complement,
            absent = stats.absent,
            mismatched = stats.mismatched,
            windows = stats.windows_fetched,
            "Merge-join complete"
        );

        Ok(stats)
    }

    /// Decide the next step for the query at the head of the stream
    fn compare(
        matcher: &M,
        query: &VariantRecord,
        window: &WindowBuffer,
    ) -> Result<EngineState, JoinError> {
        let Some(front) = window.candidates.front() else {
            if !window.terminal && query.pos >= window.end {
                return Ok(EngineState::FetchWindow {
                    anchor: query.pos.max(window.end),
                });
            }
            return Ok(EngineState::Emit {
                kind: MatchKind::Absent,
                reference: None,
                mismatched: false,
            });
        };

        if front.pos < query.pos {
            return Ok(EngineState::AdvanceReference);
        }
        if front.pos > query.pos {
            return Ok(EngineState::Emit {
                kind: MatchKind::Absent,
                reference: None,
                mismatched: false,
            });
        }

        let candidates = window
            .candidates
            .iter()
            .take_while(|r| r.pos == query.pos)
            .count();
        if candidates > 1 {
            return Err(JoinError::AmbiguousMatch {
                locus: query.locus(),
                candidates,
            });
        }

        let kind = matcher.classify_records(query, front);
        let reference = kind.is_match().then(|| orient_reference(front, kind));
        Ok(EngineState::Emit {
            kind,
            reference,
            mismatched: !kind.is_match(),
        })
    }
}
