//! VCF-backed reference stores.
//!
//! Two on-disk layouts are supported:
//!
//! - a directory holding one VCF per chromosome, named like the 1000 Genomes
//!   release (`ALL.chr1.phase3_shapeit2.genotypes.vcf.gz`)
//! - a single VCF covering several chromosomes, sorted by the chromosome order

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::chrom::ChromosomeOrder;
use crate::core::types::{OrderViolation, StreamKind};
use crate::core::variant::{Locus, VariantRecord};
use crate::parsing::vcf::{VcfReader, VcfRecords};
use crate::store::{ReferenceStore, StoreError};

/// VCF file suffixes recognised when scanning a store directory
const VCF_SUFFIXES: [&str; 3] = [".vcf", ".vcf.gz", ".vcf.bgz"];

/// Extract the `chr<N>` token from a per-chromosome file name.
///
/// The token runs from `chr` up to the next `.`, `_` or `-`. Every occurrence of
/// `chr` is tried so that prefixes such as `chrom_` do not hide the real token.
fn chromosome_token<'a>(file_name: &'a str, order: &ChromosomeOrder) -> Option<&'a str> {
    file_name.match_indices("chr").find_map(|(start, _)| {
        let rest = &file_name[start..];
        let len = rest.find(['.', '_', '-']).unwrap_or(rest.len());
        let token = &rest[..len];
        order.contains(token).then_some(token)
    })
}

fn is_vcf(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    VCF_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Reader state for the one chromosome file currently open
struct OpenFile {
    rank: usize,
    records: VcfRecords<Box<dyn BufRead>>,
}

/// A directory of per-chromosome VCF files.
///
/// Files are discovered once at open time. A chromosome's reader is opened the
/// first time it is requested and closed on [`close`](ReferenceStore::close) or
/// when another chromosome is requested, so at most one file is open at a time.
pub struct VcfDirectoryStore {
    root: PathBuf,
    order: ChromosomeOrder,
    files: HashMap<usize, PathBuf>,
    open: Option<OpenFile>,
}

impl VcfDirectoryStore {
    /// Scan `root` for per-chromosome VCF files
    ///
    /// Files whose name carries no recognised chromosome are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be listed and
    /// `StoreError::Empty` if no chromosome file is found.
    pub fn open(root: &Path, order: &ChromosomeOrder) -> Result<Self, StoreError> {
        let mut names: Vec<(String, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_vcf(&name) {
                names.push((name, path));
            }
        }
        names.sort();

        let mut files: HashMap<usize, PathBuf> = HashMap::new();
        for (name, path) in names {
            let Some(token) = chromosome_token(&name, order) else {
                warn!(file = %name, "Skipping reference file with no chromosome in its name");
                continue;
            };
            let rank = order.rank(token)?;
            if let Some(existing) = files.get(&rank) {
                warn!(
                    file = %name,
                    kept = %existing.display(),
                    "Skipping duplicate reference file for chromosome"
                );
                continue;
            }
            files.insert(rank, path);
        }

        if files.is_empty() {
            return Err(StoreError::Empty(root.display().to_string()));
        }

        debug!(
            root = %root.display(),
            chromosomes = files.len(),
            "Discovered per-chromosome reference files"
        );

        Ok(Self {
            root: root.to_path_buf(),
            order: order.clone(),
            files,
            open: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of chromosomes with a file in the store
    pub fn chromosome_count(&self) -> usize {
        self.files.len()
    }

    /// Whether the store holds a file for `chrom` (any accepted spelling)
    pub fn has_chromosome(&self, chrom: &str) -> bool {
        self.order
            .rank(chrom)
            .is_ok_and(|rank| self.files.contains_key(&rank))
    }

    fn close_open(&mut self) {
        if let Some(open) = self.open.take() {
            debug!(
                chrom = self.order.name_at(open.rank).unwrap_or_default(),
                "Closed reference file"
            );
        }
    }
}

impl ReferenceStore for VcfDirectoryStore {
    fn next_record(&mut self, chrom: &str) -> Result<Option<VariantRecord>, StoreError> {
        let rank = self.order.rank(chrom)?;

        if self.open.as_ref().map_or(true, |open| open.rank != rank) {
            self.close_open();
            let Some(path) = self.files.get(&rank) else {
                return Ok(None);
            };
            debug!(chrom, file = %path.display(), "Opened reference file");
            let reader = VcfReader::open(path, false)?;
            self.open = Some(OpenFile {
                rank,
                records: reader.records(),
            });
        }

        match self.open.as_mut().and_then(|open| open.records.next()) {
            Some(record) => Ok(Some(record?)),
            None => Ok(None),
        }
    }

    fn close(&mut self, chrom: &str) {
        let Ok(rank) = self.order.rank(chrom) else {
            return;
        };
        if self.open.as_ref().is_some_and(|open| open.rank == rank) {
            self.close_open();
        }
    }

    fn open_readers(&self) -> usize {
        usize::from(self.open.is_some())
    }
}

/// A single VCF holding several chromosomes, read forward once.
///
/// Records on chromosomes ranked before the requested one are skipped. The first
/// record ranked after it is held back for the next request.
pub struct VcfFileStore<R> {
    records: VcfRecords<R>,
    order: ChromosomeOrder,
    held: Option<(usize, VariantRecord)>,
    last: Option<(usize, Locus)>,
    finished: bool,
}

impl VcfFileStore<Box<dyn BufRead>> {
    /// Open a sorted VCF (plain, gzip, or bgzip)
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Parse` if the file cannot be read or has no header.
    pub fn open(path: &Path, order: &ChromosomeOrder) -> Result<Self, StoreError> {
        debug!(file = %path.display(), "Opened reference file");
        Ok(Self::new(VcfReader::open(path, false)?, order))
    }
}

impl<R: BufRead> VcfFileStore<R> {
    pub fn new(reader: VcfReader<R>, order: &ChromosomeOrder) -> Self {
        Self {
            records: reader.records(),
            order: order.clone(),
            held: None,
            last: None,
            finished: false,
        }
    }

    /// Next record from the file with its rank, checked against the global order
    fn read_ranked(&mut self) -> Result<Option<(usize, VariantRecord)>, StoreError> {
        if let Some(held) = self.held.take() {
            return Ok(Some(held));
        }
        if self.finished {
            return Ok(None);
        }

        let Some(record) = self.records.next() else {
            self.finished = true;
            return Ok(None);
        };
        let record = record?;
        let rank = self.order.rank(&record.chrom)?;

        if let Some((last_rank, last)) = &self.last {
            if (rank, record.pos) < (*last_rank, last.pos) {
                return Err(StoreError::OrderViolation(OrderViolation {
                    stream: StreamKind::Reference,
                    previous: last.clone(),
                    current: record.locus(),
                }));
            }
        }
        self.last = Some((rank, record.locus()));

        Ok(Some((rank, record)))
    }
}

impl<R: BufRead> ReferenceStore for VcfFileStore<R> {
    fn next_record(&mut self, chrom: &str) -> Result<Option<VariantRecord>, StoreError> {
        let wanted = self.order.rank(chrom)?;

        while let Some((rank, record)) = self.read_ranked()? {
            if rank < wanted {
                continue;
            }
            if rank > wanted {
                self.held = Some((rank, record));
                return Ok(None);
            }
            return Ok(Some(record));
        }
        Ok(None)
    }

    fn close(&mut self, _chrom: &str) {}

    fn open_readers(&self) -> usize {
        usize::from(!self.finished || self.held.is_some())
    }
}
