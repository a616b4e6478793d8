use std::collections::HashMap;

use tracing::debug;

use crate::core::chrom::ChromosomeOrder;
use crate::core::types::{OrderViolation, StreamKind};
use crate::core::variant::{Locus, VariantRecord};
use crate::store::{ReferenceLookup, ReferenceStore, StoreError, Window};

/// A reference fully materialised in memory, grouped by chromosome.
///
/// Suited to small references such as a subset VCF. A fetch returns every
/// remaining candidate on the chromosome at once, so each chromosome is fetched
/// at most once per pass.
#[derive(Debug)]
pub struct InMemoryLookup {
    order: ChromosomeOrder,

    /// Index: chromosome rank -> records in position order
    by_rank: HashMap<usize, Vec<VariantRecord>>,

    total: usize,
}

impl InMemoryLookup {
    /// Materialise a sorted record stream
    ///
    /// # Errors
    ///
    /// Propagates source errors, and fails on an unknown chromosome or a record
    /// out of (chromosome rank, position) order.
    pub fn from_records<I, E>(records: I, order: ChromosomeOrder) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = Result<VariantRecord, E>>,
        StoreError: From<E>,
    {
        let mut by_rank: HashMap<usize, Vec<VariantRecord>> = HashMap::new();
        let mut previous: Option<(usize, Locus)> = None;
        let mut total = 0;

        for record in records {
            let record = record?;
            let rank = order.rank(&record.chrom)?;

            if let Some((prev_rank, prev)) = &previous {
                if (rank, record.pos) < (*prev_rank, prev.pos) {
                    return Err(StoreError::OrderViolation(OrderViolation {
                        stream: StreamKind::Reference,
                        previous: prev.clone(),
                        current: record.locus(),
                    }));
                }
            }

            previous = Some((rank, record.locus()));
            by_rank.entry(rank).or_default().push(record);
            total += 1;
        }

        debug!(
            records = total,
            chromosomes = by_rank.len(),
            "Loaded reference into memory"
        );

        Ok(Self {
            order,
            by_rank,
            total,
        })
    }

    /// Materialise every chromosome of a store, visiting them in rank order
    ///
    /// # Errors
    ///
    /// Propagates store errors and fails on records out of order.
    pub fn from_store<S: ReferenceStore>(
        store: &mut S,
        order: ChromosomeOrder,
    ) -> Result<Self, StoreError> {
        let mut records = Vec::new();
        for rank in 0..order.len() {
            let Some(chrom) = order.name_at(rank) else {
                continue;
            };
            while let Some(record) = store.next_record(chrom)? {
                records.push(record);
            }
            store.close(chrom);
        }
        Self::from_records(records.into_iter().map(Ok::<_, StoreError>), order)
    }

    /// Total number of records held
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Records held for a chromosome (any accepted spelling)
    pub fn records_for(&self, chrom: &str) -> &[VariantRecord] {
        self.order
            .rank(chrom)
            .ok()
            .and_then(|rank| self.by_rank.get(&rank))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl ReferenceLookup for InMemoryLookup {
    fn fetch_window(&mut self, chrom: &str, from_pos: u64) -> Result<Window, StoreError> {
        let rank = self.order.rank(chrom)?;
        let Some(records) = self.by_rank.get(&rank) else {
            return Ok(Window::Exhausted);
        };

        let start = records.partition_point(|r| r.pos < from_pos);
        if start == records.len() {
            return Ok(Window::Exhausted);
        }

        Ok(Window::Candidates {
            records: records[start..].to_vec(),
            end: u64::MAX,
        })
    }

    fn release(&mut self, chrom: &str) {
        if let Ok(rank) = self.order.rank(chrom) {
            self.by_rank.remove(&rank);
        }
    }
}
