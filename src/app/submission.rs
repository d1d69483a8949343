use std::{
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread,
    time::Instant,
};

use tracing::{debug, info, warn};

use crate::{
    collection::{EntryId, ImageCollection, RemoteObject, SourceBytes},
    error::{BatchError, SubmitError},
    services::{RemovalService, StorageService},
};

/// Handle for a batch that has been handed to the workers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchTicket {
    pub batch: u64,
    pub entries: Vec<EntryId>,
}

/// A finished upload and the source bytes it was made from.
#[derive(Debug)]
pub struct Upload {
    pub id: EntryId,
    pub remote: RemoteObject,
    pub source: Arc<[u8]>,
}

#[derive(Debug)]
pub struct BatchReport {
    pub batch: u64,
    pub entries: Vec<EntryId>,
    pub uploaded: Vec<Upload>,
    /// Entries whose upload failed; they were submitted by name instead.
    pub upload_failures: Vec<String>,
    pub outcome: Result<(), BatchError>,
}

struct BatchItem {
    id: EntryId,
    name: String,
    source: SourceBytes,
    remote: Option<RemoteObject>,
}

/// Runs batches against the removal service, uploading sources first when storage is configured.
pub struct Submission {
    removal: Arc<dyn RemovalService>,
    storage: Option<Arc<dyn StorageService>>,
    report_tx: Sender<BatchReport>,
    report_rx: Receiver<BatchReport>,
    next_batch: u64,
    in_flight: usize,
}

impl Submission {
    pub fn new(removal: Arc<dyn RemovalService>, storage: Option<Arc<dyn StorageService>>) -> Self {
        let (report_tx, report_rx) = mpsc::channel();
        Self {
            removal,
            storage,
            report_tx,
            report_rx,
            next_batch: 0,
            in_flight: 0,
        }
    }

    /// Moves every Pending entry to Processing and starts the batch on a worker thread.
    pub fn submit(&mut self, collection: &mut ImageCollection) -> Result<BatchTicket, SubmitError> {
        if collection.pending_count() == 0 {
            return Err(SubmitError::NothingPending);
        }
        let entries = collection.begin_processing();
        let items: Vec<BatchItem> = entries
            .iter()
            .filter_map(|id| collection.get(id))
            .map(|entry| BatchItem {
                id: entry.id.clone(),
                name: entry.name.clone(),
                source: entry.source.clone(),
                remote: entry.remote.clone(),
            })
            .collect();

        self.next_batch += 1;
        let batch = self.next_batch;
        self.in_flight += 1;
        info!(batch, count = items.len(), "submitting batch");

        let removal = self.removal.clone();
        let storage = self.storage.clone();
        let tx = self.report_tx.clone();
        let ids = entries.clone();
        thread::spawn(move || {
            let report = run_batch(batch, ids, items, removal.as_ref(), storage.as_deref());
            let _ = tx.send(report);
        });

        Ok(BatchTicket { batch, entries })
    }

    /// Applies finished batches to the collection. Entries deleted or edited meanwhile are left alone.
    pub fn poll(&mut self, collection: &mut ImageCollection) -> Vec<BatchReport> {
        let mut reports = Vec::new();
        while let Ok(report) = self.report_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            for upload in &report.uploaded {
                match collection.get(&upload.id) {
                    Some(entry) if Arc::ptr_eq(&entry.source.bytes, &upload.source) => {
                        let _ = collection.set_remote(&upload.id, upload.remote.clone());
                    }
                    Some(_) => debug!(id = %upload.id, "entry edited during upload, dropping remote"),
                    None => debug!(id = %upload.id, "uploaded entry no longer exists"),
                }
            }
            match &report.outcome {
                Ok(()) => {
                    let done = collection.complete_processing(&report.entries);
                    info!(batch = report.batch, done, "batch complete");
                }
                Err(err) => {
                    let reverted = collection.revert_processing(&report.entries);
                    warn!(batch = report.batch, reverted, "batch failed: {err}");
                }
            }
            reports.push(report);
        }
        reports
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

fn run_batch(
    batch: u64,
    entries: Vec<EntryId>,
    items: Vec<BatchItem>,
    removal: &dyn RemovalService,
    storage: Option<&dyn StorageService>,
) -> BatchReport {
    let start = Instant::now();
    let mut uploaded = Vec::new();
    let mut upload_failures = Vec::new();
    let mut identifiers = Vec::with_capacity(items.len());

    for item in items {
        let remote = match (item.remote, storage) {
            (Some(remote), _) => Some(remote),
            (None, Some(storage)) => match storage.store(&item.name, &item.source) {
                Ok(remote) => {
                    uploaded.push(Upload {
                        id: item.id.clone(),
                        remote: remote.clone(),
                        source: item.source.bytes.clone(),
                    });
                    Some(remote)
                }
                Err(err) => {
                    warn!(batch, name = %item.name, "upload failed, submitting by name: {err}");
                    upload_failures.push(item.name.clone());
                    None
                }
            },
            (None, None) => None,
        };
        identifiers.push(remote.map(|r| r.remote_url).unwrap_or(item.name));
    }

    let outcome = removal.submit_batch(&identifiers).map_err(BatchError::from);
    debug!(batch, elapsed = ?start.elapsed(), ok = outcome.is_ok(), "batch finished");
    BatchReport {
        batch,
        entries,
        uploaded,
        upload_failures,
        outcome,
    }
}
