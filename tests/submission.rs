use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc, Mutex,
};
use std::time::Duration;

use cutout::app::submission::{BatchReport, Submission};
use cutout::collection::{EntryId, ImageCollection, ImageStatus, RemoteObject, SourceBytes};
use cutout::error::{BatchError, RemovalError, StorageError, SubmitError};
use cutout::previews::PreviewRegistry;
use cutout::services::{RemovalService, StorageService, UploadSlot};

mod common;
use common::{new_image, wait_until};

/// Removal fake that blocks each batch until the test releases it.
struct GatedRemoval {
    release: Mutex<Receiver<Result<(), RemovalError>>>,
    seen: Mutex<Vec<Vec<String>>>,
}

impl GatedRemoval {
    fn new() -> (Arc<Self>, Sender<Result<(), RemovalError>>) {
        let (tx, rx) = mpsc::channel();
        let removal = Arc::new(Self {
            release: Mutex::new(rx),
            seen: Mutex::new(Vec::new()),
        });
        (removal, tx)
    }
}

impl RemovalService for GatedRemoval {
    fn submit_batch(&self, identifiers: &[String]) -> Result<(), RemovalError> {
        self.seen.lock().unwrap().push(identifiers.to_vec());
        self.release
            .lock()
            .unwrap()
            .recv()
            .unwrap_or_else(|_| Err(RemovalError::Service("gate dropped".into())))
    }
}

/// Storage fake that refuses files whose name starts with "bad".
struct FakeStorage;

impl StorageService for FakeStorage {
    fn request_upload_slot(&self, file_name: &str, _mime: &str) -> Result<UploadSlot, StorageError> {
        if file_name.starts_with("bad") {
            return Err(StorageError::SlotRejected("quota".into()));
        }
        Ok(UploadSlot {
            upload_url: format!("https://upload.example/{file_name}?sig=1"),
            public_url: format!("https://cdn.example/uploads/{file_name}"),
            key: None,
        })
    }

    fn upload(&self, _slot: &UploadSlot, _source: &SourceBytes) -> Result<(), StorageError> {
        Ok(())
    }
}

fn collection_of(names: &[&str]) -> (ImageCollection, PreviewRegistry, Vec<EntryId>) {
    let mut collection = ImageCollection::new();
    let mut previews = PreviewRegistry::new();
    let ids = names
        .iter()
        .map(|name| collection.admit(new_image(name, 8, 8), &mut previews).unwrap())
        .collect();
    (collection, previews, ids)
}

fn wait_for_report(submission: &mut Submission, collection: &mut ImageCollection) -> BatchReport {
    let mut report = None;
    let arrived = wait_until(Duration::from_secs(5), || {
        report = submission.poll(collection).into_iter().next();
        report.is_some()
    });
    assert!(arrived, "batch never finished");
    report.unwrap()
}

#[test]
fn empty_submission_is_refused() {
    let (removal, _gate) = GatedRemoval::new();
    let mut submission = Submission::new(removal, None);
    let mut collection = ImageCollection::new();
    assert_eq!(submission.submit(&mut collection), Err(SubmitError::NothingPending));
    assert_eq!(submission.in_flight(), 0);
}

#[test]
fn entries_are_processing_until_the_service_completes() {
    let (removal, gate) = GatedRemoval::new();
    let mut submission = Submission::new(removal.clone(), None);
    let (mut collection, _previews, ids) = collection_of(&["a.png", "b.png", "c.png"]);

    let ticket = submission.submit(&mut collection).unwrap();
    assert_eq!(ticket.entries, ids);
    assert_eq!(collection.count_with(ImageStatus::Processing), 3);
    assert_eq!(submission.in_flight(), 1);
    assert!(submission.poll(&mut collection).is_empty());
    assert_eq!(collection.count_with(ImageStatus::Processing), 3);

    gate.send(Ok(())).unwrap();
    let report = wait_for_report(&mut submission, &mut collection);
    assert!(report.outcome.is_ok());
    assert_eq!(collection.count_with(ImageStatus::Done), 3);
    assert_eq!(submission.in_flight(), 0);
    assert_eq!(
        removal.seen.lock().unwrap()[0],
        vec!["a.png".to_string(), "b.png".to_string(), "c.png".to_string()]
    );
}

#[test]
fn failed_batch_reverts_to_pending() {
    let (removal, gate) = GatedRemoval::new();
    let mut submission = Submission::new(removal, None);
    let (mut collection, _previews, _ids) = collection_of(&["a.png", "b.png"]);

    submission.submit(&mut collection).unwrap();
    gate.send(Err(RemovalError::Service("503".into()))).unwrap();
    let report = wait_for_report(&mut submission, &mut collection);
    assert_eq!(
        report.outcome,
        Err(BatchError::Removal(RemovalError::Service("503".into())))
    );
    assert_eq!(collection.pending_count(), 2);
}

#[test]
fn entry_edited_mid_batch_stays_pending() {
    let (removal, gate) = GatedRemoval::new();
    let mut submission = Submission::new(removal, None);
    let (mut collection, mut previews, ids) = collection_of(&["a.png", "b.png"]);

    submission.submit(&mut collection).unwrap();
    collection.replace(&ids[0], new_image("Edited_a.png", 4, 4), &mut previews).unwrap();
    gate.send(Ok(())).unwrap();
    wait_for_report(&mut submission, &mut collection);

    assert_eq!(collection.get(&ids[0]).unwrap().status, ImageStatus::Pending);
    assert_eq!(collection.get(&ids[1]).unwrap().status, ImageStatus::Done);
}

#[test]
fn upload_of_replaced_bytes_is_not_attached() {
    let (removal, gate) = GatedRemoval::new();
    let mut submission = Submission::new(removal, Some(Arc::new(FakeStorage) as Arc<dyn StorageService>));
    let (mut collection, mut previews, ids) = collection_of(&["good.png"]);

    submission.submit(&mut collection).unwrap();
    collection.replace(&ids[0], new_image("Edited_good.png", 4, 4), &mut previews).unwrap();
    gate.send(Ok(())).unwrap();
    let report = wait_for_report(&mut submission, &mut collection);

    assert_eq!(report.uploaded.len(), 1);
    let entry = collection.get(&ids[0]).unwrap();
    assert_eq!(entry.status, ImageStatus::Pending);
    assert_eq!(entry.name, "Edited_good.png");
    assert_eq!(entry.remote, None);
}

#[test]
fn deleted_entry_does_not_break_completion() {
    let (removal, gate) = GatedRemoval::new();
    let mut submission = Submission::new(removal, None);
    let (mut collection, mut previews, ids) = collection_of(&["a.png", "b.png"]);

    submission.submit(&mut collection).unwrap();
    collection.remove(&ids[1], &mut previews).unwrap();
    gate.send(Ok(())).unwrap();
    let report = wait_for_report(&mut submission, &mut collection);
    assert_eq!(report.entries.len(), 2);
    assert_eq!(collection.count_with(ImageStatus::Done), 1);
}

#[test]
fn uploads_supply_remote_identifiers() {
    let (removal, gate) = GatedRemoval::new();
    let mut submission = Submission::new(removal.clone(), Some(Arc::new(FakeStorage) as Arc<dyn StorageService>));
    let (mut collection, _previews, ids) = collection_of(&["good.png", "bad.png"]);

    submission.submit(&mut collection).unwrap();
    gate.send(Ok(())).unwrap();
    let report = wait_for_report(&mut submission, &mut collection);

    assert_eq!(report.upload_failures, vec!["bad.png".to_string()]);
    assert_eq!(
        removal.seen.lock().unwrap()[0],
        vec!["https://cdn.example/uploads/good.png".to_string(), "bad.png".to_string()]
    );
    assert_eq!(
        collection.get(&ids[0]).unwrap().remote,
        Some(RemoteObject {
            storage_key: "uploads/good.png".into(),
            remote_url: "https://cdn.example/uploads/good.png".into(),
        })
    );
    assert_eq!(collection.get(&ids[1]).unwrap().remote, None);
    assert_eq!(collection.count_with(ImageStatus::Done), 2);
}
