use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc, Mutex,
    },
    thread,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use eframe::egui;
use tracing::{debug, info, warn};

use crate::{
    collection::{NewImage, SourceBytes, MAX_IMAGES},
    error::IntakeError,
    fs_utils::{display_name, mime_for_path},
    image_utils::{decode_image, preview_image, rgba_to_png},
};

#[derive(Clone, Debug)]
pub enum CandidateSource {
    Bytes(Arc<[u8]>),
    File(PathBuf),
}

/// One raw input awaiting validation and decoding.
#[derive(Clone, Debug)]
pub struct IntakeCandidate {
    pub name: String,
    pub mime: String,
    pub source: CandidateSource,
}

impl IntakeCandidate {
    pub fn from_bytes(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            source: CandidateSource::Bytes(bytes.into()),
        }
    }

    /// File picker / command line input. The file is read on a worker thread.
    pub fn from_path(path: &Path) -> Self {
        Self {
            name: display_name(path),
            mime: mime_for_path(path).to_string(),
            source: CandidateSource::File(path.to_path_buf()),
        }
    }

    pub fn from_dropped(file: &egui::DroppedFile) -> Option<Self> {
        let declared = (!file.mime.is_empty()).then(|| file.mime.clone());
        if let Some(bytes) = &file.bytes {
            let mime = declared.unwrap_or_else(|| mime_for_path(Path::new(&file.name)).to_string());
            return Some(Self::from_bytes(file.name.clone(), mime, bytes.clone()));
        }
        let path = file.path.as_ref()?;
        let mut candidate = Self::from_path(path);
        if let Some(mime) = declared {
            candidate.mime = mime;
        }
        Some(candidate)
    }

    /// Clipboard images carry no file name, so one is synthesized from the current time.
    pub fn from_clipboard_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let png = rgba_to_png(width, height, rgba)?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Some(Self::from_bytes(format!("Pasted_Image_{millis}.png"), "image/png", png))
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Drag-drop payloads: only files whose declared type is an image are considered.
pub fn image_drops(files: &[egui::DroppedFile]) -> Vec<IntakeCandidate> {
    files
        .iter()
        .filter_map(IntakeCandidate::from_dropped)
        .filter(IntakeCandidate::is_image)
        .collect()
}

pub enum IntakeEvent {
    Decoded(NewImage),
    Failed(IntakeError),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Candidates sent to the decoders.
    pub queued: usize,
    /// Candidates cut from the end of the batch for lack of room.
    pub over_quota: usize,
    pub rejected: Vec<IntakeError>,
}

pub struct Intake {
    job_tx: Sender<IntakeCandidate>,
    event_rx: Receiver<IntakeEvent>,
    in_flight: usize,
}

impl Intake {
    pub fn new(workers: usize) -> Self {
        let (job_tx, job_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let job_rx = Arc::new(Mutex::new(job_rx));
        for _ in 0..workers.max(1) {
            Self::spawn_decoder(job_rx.clone(), event_tx.clone());
        }
        Self {
            job_tx,
            event_rx,
            in_flight: 0,
        }
    }

    fn spawn_decoder(rx: Arc<Mutex<Receiver<IntakeCandidate>>>, tx: Sender<IntakeEvent>) {
        thread::spawn(move || loop {
            let candidate = {
                let Ok(lock) = rx.lock() else { break };
                match lock.recv() {
                    Ok(candidate) => candidate,
                    Err(_) => break,
                }
            };
            if tx.send(decode_candidate(candidate)).is_err() {
                break;
            }
        });
    }

    /// Validates a batch against the remaining quota and queues the survivors for decoding.
    ///
    /// Decodes already in flight count against the quota, so everything queued here is
    /// guaranteed a slot unless entries are added by another path meanwhile.
    pub fn ingest(&mut self, mut candidates: Vec<IntakeCandidate>, current_count: usize) -> Result<IngestReport, IntakeError> {
        if candidates.is_empty() {
            return Ok(IngestReport::default());
        }
        let capacity = MAX_IMAGES.saturating_sub(current_count + self.in_flight);
        if capacity == 0 {
            warn!(offered = candidates.len(), "intake rejected, image limit reached");
            return Err(IntakeError::CapacityExceeded { max: MAX_IMAGES });
        }

        let mut report = IngestReport::default();
        if candidates.len() > capacity {
            report.over_quota = candidates.len() - capacity;
            candidates.truncate(capacity);
        }

        for candidate in candidates {
            if !candidate.is_image() {
                warn!(name = %candidate.name, mime = %candidate.mime, "skipping non-image input");
                report.rejected.push(IntakeError::NotAnImage {
                    name: candidate.name,
                    mime: candidate.mime,
                });
                continue;
            }
            debug!(name = %candidate.name, "queueing decode");
            if self.job_tx.send(candidate).is_ok() {
                self.in_flight += 1;
                report.queued += 1;
            }
        }
        info!(queued = report.queued, over_quota = report.over_quota, rejected = report.rejected.len(), "intake batch accepted");
        Ok(report)
    }

    /// Drains finished decodes, in completion order.
    pub fn poll(&mut self) -> Vec<IntakeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            events.push(event);
        }
        events
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

pub fn decode_candidate(candidate: IntakeCandidate) -> IntakeEvent {
    let start = Instant::now();
    let IntakeCandidate { name, mime, source } = candidate;
    let bytes: Arc<[u8]> = match source {
        CandidateSource::Bytes(bytes) => bytes,
        CandidateSource::File(path) => match fs::read(&path) {
            Ok(bytes) => bytes.into(),
            Err(err) => {
                warn!(path = %path.display(), "failed to read: {err}");
                return IntakeEvent::Failed(IntakeError::Read {
                    name,
                    reason: err.to_string(),
                });
            }
        },
    };

    match decode_image(&bytes, &mime) {
        Ok(image) => {
            let preview = preview_image(&image);
            debug!(%name, width = image.width(), height = image.height(), elapsed = ?start.elapsed(), "decoded");
            IntakeEvent::Decoded(NewImage {
                width: image.width(),
                height: image.height(),
                source: SourceBytes::new(bytes, mime),
                name,
                preview,
            })
        }
        Err(err) => {
            warn!(%name, "failed to decode: {err}");
            IntakeEvent::Failed(IntakeError::Decode {
                name,
                reason: err.to_string(),
            })
        }
    }
}
