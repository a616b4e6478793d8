use crate::core::chrom::ChromosomeOrder;
use crate::core::types::{OrderViolation, StreamKind};
use crate::core::variant::VariantRecord;
use crate::matching::engine::JoinError;

/// The head of a [`SortedStreamCursor`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Peeked<'a> {
    Record(&'a VariantRecord),
    Exhausted,
}

/// Forward-only peek/advance wrapper over one sorted record source.
///
/// Every record loaded is checked against the chromosome order: an unknown
/// chromosome or a record sorting before its predecessor is a fatal error. Once
/// the source ends the cursor stays exhausted.
pub struct SortedStreamCursor<'o, I> {
    source: I,
    order: &'o ChromosomeOrder,
    stream: StreamKind,
    current: Option<(usize, VariantRecord)>,
    exhausted: bool,
    loaded: u64,
}

impl<'o, I, E> SortedStreamCursor<'o, I>
where
    I: Iterator<Item = Result<VariantRecord, E>>,
    JoinError: From<E>,
{
    /// Wrap a source and load its first record
    ///
    /// # Errors
    ///
    /// Propagates source errors and fails on an unknown chromosome.
    pub fn new(source: I, order: &'o ChromosomeOrder, stream: StreamKind) -> Result<Self, JoinError> {
        let mut cursor = Self {
            source,
            order,
            stream,
            current: None,
            exhausted: false,
            loaded: 0,
        };
        cursor.load_next()?;
        Ok(cursor)
    }

    pub fn peek(&self) -> Peeked<'_> {
        match &self.current {
            Some((_, record)) => Peeked::Record(record),
            None => Peeked::Exhausted,
        }
    }

    /// Chromosome rank of the current record
    pub fn rank(&self) -> Option<usize> {
        self.current.as_ref().map(|(rank, _)| *rank)
    }

    /// Consume the current record and load the next one
    ///
    /// # Errors
    ///
    /// Propagates source errors, and fails on an unknown chromosome or a record
    /// out of (chromosome rank, position) order.
    pub fn advance(&mut self) -> Result<Option<VariantRecord>, JoinError> {
        let consumed = self.current.take();
        if let Some((rank, record)) = &consumed {
            self.load_next()?;
            if let Some((next_rank, next)) = &self.current {
                if (*next_rank, next.pos) < (*rank, record.pos) {
                    return Err(JoinError::StreamOrderViolation(OrderViolation {
                        stream: self.stream,
                        previous: record.locus(),
                        current: next.locus(),
                    }));
                }
            }
        }
        Ok(consumed.map(|(_, record)| record))
    }

    /// Number of records loaded from the source so far
    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    fn load_next(&mut self) -> Result<(), JoinError> {
        if self.exhausted {
            return Ok(());
        }

        match self.source.next() {
            Some(record) => {
                let record = record?;
                let rank = self.order.rank(&record.chrom)?;
                self.loaded += 1;
                self.current = Some((rank, record));
            }
            None => self.exhausted = true,
        }
        Ok(())
    }
}
