use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use eframe::egui;
use tracing::{debug, info, warn};

use crate::error::CollectionError;
use crate::previews::{PreviewHandle, PreviewRegistry};

/// Maximum number of images in the working set.
pub const MAX_IMAGES: usize = 12;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(String);

impl EntryId {
    /// Time-based id with a random suffix. Unique in practice, not guaranteed.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self(format!("{millis}{:08x}", rand::random::<u32>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw encoded bytes of an image together with their declared MIME type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceBytes {
    pub bytes: Arc<[u8]>,
    pub mime: String,
}

impl SourceBytes {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageStatus {
    Pending,
    Processing,
    Done,
}

impl ImageStatus {
    /// Forward moves are Pending -> Processing -> Done; anything may go back to Pending.
    pub fn can_become(self, next: ImageStatus) -> bool {
        matches!(
            (self, next),
            (ImageStatus::Pending, ImageStatus::Processing)
                | (ImageStatus::Processing, ImageStatus::Done)
                | (_, ImageStatus::Pending)
        )
    }
}

/// Location of an entry once it has been handed to object storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteObject {
    pub storage_key: String,
    pub remote_url: String,
}

#[derive(Debug)]
pub struct ImageEntry {
    pub id: EntryId,
    pub name: String,
    pub source: SourceBytes,
    pub preview: PreviewHandle,
    pub width: u32,
    pub height: u32,
    pub status: ImageStatus,
    pub remote: Option<RemoteObject>,
}

/// Decoded image ready to become (or replace) an entry.
pub struct NewImage {
    pub name: String,
    pub source: SourceBytes,
    pub width: u32,
    pub height: u32,
    pub preview: egui::ColorImage,
}

/// Ordered working set. All entry mutations go through here.
#[derive(Default)]
pub struct ImageCollection {
    entries: Vec<ImageEntry>,
}

impl ImageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        MAX_IMAGES.saturating_sub(self.entries.len())
    }

    pub fn get(&self, id: &EntryId) -> Option<&ImageEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    fn position(&self, id: &EntryId) -> Result<usize, CollectionError> {
        self.entries
            .iter()
            .position(|entry| &entry.id == id)
            .ok_or_else(|| CollectionError::NotFound(id.to_string()))
    }

    /// Capacity-checked append of a freshly decoded image. The preview is only
    /// allocated once there is room for it.
    pub fn admit(&mut self, image: NewImage, previews: &mut PreviewRegistry) -> Result<EntryId, CollectionError> {
        if self.entries.len() >= MAX_IMAGES {
            warn!(name = %image.name, "dropping decoded image, collection is full");
            return Err(CollectionError::Full { max: MAX_IMAGES });
        }
        let preview = previews.allocate(image.preview);
        let entry = ImageEntry {
            id: EntryId::generate(),
            name: image.name,
            source: image.source,
            preview,
            width: image.width,
            height: image.height,
            status: ImageStatus::Pending,
            remote: None,
        };
        let id = entry.id.clone();
        self.append(entry, previews)?;
        Ok(id)
    }

    /// Appends an entry that already owns a preview. If the collection is full the
    /// entry is discarded and its preview revoked.
    pub fn append(&mut self, entry: ImageEntry, previews: &mut PreviewRegistry) -> Result<(), CollectionError> {
        if self.entries.len() >= MAX_IMAGES {
            previews.revoke(entry.preview)?;
            return Err(CollectionError::Full { max: MAX_IMAGES });
        }
        debug!(id = %entry.id, name = %entry.name, "appended image");
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, id: &EntryId, previews: &mut PreviewRegistry) -> Result<ImageEntry, CollectionError> {
        let index = self.position(id)?;
        previews.revoke(self.entries[index].preview)?;
        let entry = self.entries.remove(index);
        info!(id = %entry.id, name = %entry.name, "removed image");
        Ok(entry)
    }

    /// Swaps in edited content at the same position. The entry keeps its id, goes back
    /// to Pending and loses any remote copy, which no longer matches its bytes.
    pub fn replace(&mut self, id: &EntryId, image: NewImage, previews: &mut PreviewRegistry) -> Result<(), CollectionError> {
        let index = self.position(id)?;
        let old_preview = self.entries[index].preview;
        previews.revoke(old_preview)?;
        let preview = previews.allocate(image.preview);
        let entry = &mut self.entries[index];
        entry.name = image.name;
        entry.source = image.source;
        entry.preview = preview;
        entry.width = image.width;
        entry.height = image.height;
        entry.status = ImageStatus::Pending;
        entry.remote = None;
        info!(id = %entry.id, width = entry.width, height = entry.height, "replaced image with edit");
        Ok(())
    }

    pub fn set_status(&mut self, id: &EntryId, status: ImageStatus) -> Result<(), CollectionError> {
        let index = self.position(id)?;
        let entry = &mut self.entries[index];
        if !entry.status.can_become(status) {
            return Err(CollectionError::InvalidTransition {
                id: id.to_string(),
                from: entry.status,
                to: status,
            });
        }
        entry.status = status;
        Ok(())
    }

    pub fn set_remote(&mut self, id: &EntryId, remote: RemoteObject) -> Result<(), CollectionError> {
        let index = self.position(id)?;
        self.entries[index].remote = Some(remote);
        Ok(())
    }

    /// Moves every Pending entry to Processing in one step and returns the batch.
    pub fn begin_processing(&mut self) -> Vec<EntryId> {
        self.entries
            .iter_mut()
            .filter(|entry| entry.status == ImageStatus::Pending)
            .map(|entry| {
                entry.status = ImageStatus::Processing;
                entry.id.clone()
            })
            .collect()
    }

    /// Marks the batch members that are still Processing as Done.
    pub fn complete_processing(&mut self, batch: &[EntryId]) -> usize {
        self.transition_batch(batch, ImageStatus::Done)
    }

    /// Returns the batch members that are still Processing to Pending.
    pub fn revert_processing(&mut self, batch: &[EntryId]) -> usize {
        self.transition_batch(batch, ImageStatus::Pending)
    }

    fn transition_batch(&mut self, batch: &[EntryId], status: ImageStatus) -> usize {
        let mut moved = 0;
        for entry in &mut self.entries {
            if entry.status == ImageStatus::Processing && batch.contains(&entry.id) {
                entry.status = status;
                moved += 1;
            }
        }
        moved
    }

    pub fn pending_count(&self) -> usize {
        self.count_with(ImageStatus::Pending)
    }

    pub fn count_with(&self, status: ImageStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn has_active_work(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.status, ImageStatus::Pending | ImageStatus::Processing))
    }

    /// Session teardown: revokes every preview and empties the collection.
    pub fn clear(&mut self, previews: &mut PreviewRegistry) -> usize {
        let mut revoked = 0;
        for entry in self.entries.drain(..) {
            if previews.revoke(entry.preview).is_ok() {
                revoked += 1;
            }
        }
        revoked
    }
}
