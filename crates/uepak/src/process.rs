//! Archive processing pipeline.
//!
//! [`PakProcessor`] walks an archive's directory, asks a selection predicate
//! about every entry name, decodes the selected packages and hands each result
//! to a sink. Companion files (`.uexp`, `.ubulk`, `.uptnl`) are never decoded
//! on their own: a `.uexp` is read together with its `.uasset`/`.umap`.
//!
//! Failures are per entry. A package that cannot be read or decoded reaches
//! the sink as an [`EntryFailure`] and processing carries on with the next
//! entry.

use tracing::{debug, warn};
use uepak_archive::{ArchiveEntryRecord, PakArchive};
use uepak_asset::{DecodeOptions, PakEntrySet};

use crate::error::{EntryFailure, Result};

/// Extensions of files that only accompany a package.
pub const COMPANION_EXTENSIONS: &[&str] = &["uexp", "ubulk", "uptnl"];

/// Check whether an entry name is a package companion rather than a package.
pub fn is_companion(name: &str) -> bool {
    let Some(dot) = name.rfind('.') else {
        return false;
    };
    let extension = &name[dot + 1..];
    COMPANION_EXTENSIONS
        .iter()
        .any(|companion| extension.eq_ignore_ascii_case(companion))
}

/// Options for [`PakProcessor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    pub decode: DecodeOptions,
}

impl ProcessOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the options used for every package.
    pub fn with_decode_options(mut self, decode: DecodeOptions) -> Self {
        self.decode = decode;
        self
    }

    /// Set the struct nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.decode = self.decode.with_max_depth(max_depth);
        self
    }
}

/// Counts from one pass over an archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Entries decoded successfully.
    pub processed: usize,
    /// Entries selected but not decodable.
    pub failed: usize,
    /// Entries the predicate rejected.
    pub skipped: usize,
    /// Companion entries, never offered to the predicate.
    pub companions: usize,
}

impl ProcessReport {
    /// Entries handed to the sink.
    pub fn selected(&self) -> usize {
        self.processed + self.failed
    }

    /// Every entry in the archive.
    pub fn total(&self) -> usize {
        self.selected() + self.skipped + self.companions
    }

    /// Add another archive's counts.
    pub fn merge(&mut self, other: ProcessReport) {
        self.processed += other.processed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.companions += other.companions;
    }

    fn count<T, E>(&mut self, result: &std::result::Result<T, E>) {
        if result.is_ok() {
            self.processed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Decodes the packages of one archive.
///
/// Decompression and decryption come from the transform the archive was
/// opened with.
pub struct PakProcessor<'a> {
    archive: &'a PakArchive,
    options: ProcessOptions,
}

impl<'a> PakProcessor<'a> {
    /// Create a processor with default options.
    pub fn new(archive: &'a PakArchive) -> Self {
        Self {
            archive,
            options: ProcessOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ProcessOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the archive being processed.
    #[inline]
    pub fn archive(&self) -> &'a PakArchive {
        self.archive
    }

    /// Decode every selected entry, in directory order.
    ///
    /// `predicate` sees each non-companion entry name once, before anything
    /// is read. `sink` receives each selected entry's name, its decoded
    /// package or failure, and the archive.
    pub fn process<P, S>(&self, mut predicate: P, mut sink: S) -> ProcessReport
    where
        P: FnMut(&str) -> bool,
        S: FnMut(&str, std::result::Result<PakEntrySet, EntryFailure>, &PakArchive),
    {
        let (selected, mut report) = self.select(&mut predicate);

        for record in selected {
            let result = self.decode_entry(record);
            report.count(&result);
            sink(record.name(), result, self.archive);
        }

        debug!(
            archive = %self.archive.path().display(),
            processed = report.processed,
            failed = report.failed,
            skipped = report.skipped,
            "processed archive"
        );
        report
    }

    /// Decode the selected entries on the rayon thread pool.
    ///
    /// Selection happens up front on the calling thread. Sink calls are
    /// serialized but arrive in completion order, not directory order.
    #[cfg(feature = "parallel")]
    pub fn process_parallel<P, S>(&self, mut predicate: P, sink: S) -> ProcessReport
    where
        P: FnMut(&str) -> bool,
        S: FnMut(&str, std::result::Result<PakEntrySet, EntryFailure>, &PakArchive) + Send,
    {
        use std::sync::atomic::{AtomicUsize, Ordering};

        use parking_lot::Mutex;
        use rayon::prelude::*;

        let (selected, mut report) = self.select(&mut predicate);

        let processed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let sink = Mutex::new(sink);

        selected.par_iter().for_each(|record| {
            let result = self.decode_entry(record);
            match &result {
                Ok(_) => processed.fetch_add(1, Ordering::Relaxed),
                Err(_) => failed.fetch_add(1, Ordering::Relaxed),
            };
            (*sink.lock())(record.name(), result, self.archive);
        });

        report.processed = processed.load(Ordering::Relaxed);
        report.failed = failed.load(Ordering::Relaxed);

        debug!(
            archive = %self.archive.path().display(),
            processed = report.processed,
            failed = report.failed,
            skipped = report.skipped,
            "processed archive in parallel"
        );
        report
    }

    /// Read and decode one package entry, with its `.uexp` if present.
    pub fn decode_entry(&self, record: &ArchiveEntryRecord) -> std::result::Result<PakEntrySet, EntryFailure> {
        self.decode_record(record).map_err(|error| {
            warn!(
                archive = %self.archive.path().display(),
                entry = record.name(),
                error = %error,
                "failed to decode entry"
            );
            EntryFailure {
                archive: self.archive.path().to_path_buf(),
                entry: record.name().to_string(),
                error,
            }
        })
    }

    /// Read and decode one package entry by name.
    pub fn decode_by_name(&self, name: &str) -> std::result::Result<PakEntrySet, EntryFailure> {
        match self.archive.find(name) {
            Some(record) => self.decode_entry(record),
            None => Err(EntryFailure {
                archive: self.archive.path().to_path_buf(),
                entry: name.to_string(),
                error: uepak_archive::Error::EntryNotFound(name.to_string()).into(),
            }),
        }
    }

    fn decode_record(&self, record: &ArchiveEntryRecord) -> Result<PakEntrySet> {
        let header = self.archive.read_entry(record)?;

        let uexp_name = format!("{}.uexp", record.stem_path());
        let exports_data = match self.archive.find(&uexp_name) {
            Some(uexp) => Some(self.archive.read_entry(uexp)?),
            None => None,
        };

        let entry = PakEntrySet::decode(record.name(), &header, exports_data.as_deref(), self.options.decode)?;
        debug!(
            entry = record.name(),
            exports = entry.exports.len(),
            split = exports_data.is_some(),
            "decoded entry"
        );
        Ok(entry)
    }

    /// Split the directory into selected entries and the counts of the rest.
    fn select<P>(&self, predicate: &mut P) -> (Vec<&'a ArchiveEntryRecord>, ProcessReport)
    where
        P: FnMut(&str) -> bool,
    {
        let mut report = ProcessReport::default();
        let mut selected = Vec::new();

        for record in self.archive.entries() {
            if is_companion(record.name()) {
                report.companions += 1;
            } else if predicate(record.name()) {
                selected.push(record);
            } else {
                report.skipped += 1;
            }
        }

        (selected, report)
    }
}
