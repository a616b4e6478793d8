use tracing::debug;

use crate::core::chrom::ChromosomeOrder;
use crate::core::types::{OrderViolation, StreamKind};
use crate::core::variant::{Locus, VariantRecord};
use crate::store::{ReferenceLookup, ReferenceStore, StoreError, Window};

/// Default number of positions covered by one lookahead window
pub const DEFAULT_WINDOW_SIZE: u64 = 10_000;

/// Read state for the chromosome currently being fetched
#[derive(Debug)]
struct ActiveChromosome {
    name: String,
    rank: usize,
    /// First record past the end of the last window
    pending: Option<VariantRecord>,
    /// Position of the last record pulled from the store
    last_pos: Option<u64>,
    /// The store has no more records for this chromosome
    drained: bool,
}

impl ActiveChromosome {
    fn new(name: &str, rank: usize) -> Self {
        Self {
            name: name.to_string(),
            rank,
            pending: None,
            last_pos: None,
            drained: false,
        }
    }
}

/// Bounded-window batch reader over a chromosome-partitioned [`ReferenceStore`].
///
/// Each fetch returns every record with position in `[from_pos, from_pos + window_size)`,
/// holding back one record of lookahead for the next window. Records before
/// `from_pos` are skipped. A window whose end saturates at `u64::MAX` takes every
/// remaining record, so the last position is never left outside a window. Only
/// one chromosome is active at a time; switching chromosome closes the previous
/// chromosome's reader.
pub struct ChunkedLookaheadFetcher<S> {
    store: S,
    order: ChromosomeOrder,
    window_size: u64,
    active: Option<ActiveChromosome>,
}

impl<S: ReferenceStore> ChunkedLookaheadFetcher<S> {
    /// Create a fetcher; a zero window size is treated as one position
    pub fn new(store: S, order: ChromosomeOrder, window_size: u64) -> Self {
        Self {
            store,
            order,
            window_size: window_size.max(1),
            active: None,
        }
    }

    /// Number of readers the underlying store holds open
    pub fn open_readers(&self) -> usize {
        self.store.open_readers()
    }

    /// Make `chrom` the active chromosome, closing any other
    fn activate(&mut self, chrom: &str, rank: usize) {
        if self.active.as_ref().is_some_and(|a| a.rank == rank) {
            return;
        }

        if let Some(previous) = self.active.take() {
            debug!(chrom = %previous.name, "Closing reference chromosome");
            self.store.close(&previous.name);
        }
        self.active = Some(ActiveChromosome::new(chrom, rank));
    }

    /// Pull the next record for the active chromosome, validating it
    fn pull(&mut self) -> Result<Option<VariantRecord>, StoreError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(None);
        };

        if let Some(record) = active.pending.take() {
            return Ok(Some(record));
        }
        if active.drained {
            return Ok(None);
        }

        let Some(record) = self.store.next_record(&active.name)? else {
            active.drained = true;
            return Ok(None);
        };

        if self.order.rank(&record.chrom)? != active.rank {
            return Err(StoreError::ChromosomeMismatch {
                expected: active.name.clone(),
                found: record.chrom,
            });
        }

        if let Some(last) = active.last_pos {
            if record.pos < last {
                return Err(StoreError::OrderViolation(OrderViolation {
                    stream: StreamKind::Reference,
                    previous: Locus::new(record.chrom.clone(), last),
                    current: record.locus(),
                }));
            }
        }
        active.last_pos = Some(record.pos);

        Ok(Some(record))
    }
}

impl<S: ReferenceStore> ReferenceLookup for ChunkedLookaheadFetcher<S> {
    fn fetch_window(&mut self, chrom: &str, from_pos: u64) -> Result<Window, StoreError> {
        let rank = self.order.rank(chrom)?;
        self.activate(chrom, rank);

        let end = from_pos.saturating_add(self.window_size);
        let unbounded = end == u64::MAX;
        let mut records = Vec::new();

        while let Some(record) = self.pull()? {
            if record.pos < from_pos {
                continue;
            }
            if record.pos >= end && !unbounded {
                if let Some(active) = self.active.as_mut() {
                    active.pending = Some(record);
                }
                break;
            }
            records.push(record);
        }

        let drained = self
            .active
            .as_ref()
            .map_or(true, |a| a.drained && a.pending.is_none());

        debug!(
            chrom,
            from_pos,
            end,
            candidates = records.len(),
            drained,
            "Fetched reference window"
        );

        if records.is_empty() && drained {
            return Ok(Window::Exhausted);
        }
        Ok(Window::Candidates { records, end })
    }

    fn release(&mut self, chrom: &str) {
        let Ok(rank) = self.order.rank(chrom) else {
            return;
        };
        if self.active.as_ref().is_some_and(|a| a.rank == rank) {
            if let Some(active) = self.active.take() {
                debug!(chrom = %active.name, "Releasing reference chromosome");
                self.store.close(&active.name);
            }
        }
    }
}
