use thiserror::Error;

use crate::collection::ImageStatus;
use crate::previews::PreviewHandle;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("preview {0} was already revoked")]
    AlreadyRevoked(PreviewHandle),

    #[error("preview {0} was never allocated")]
    Unknown(PreviewHandle),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("image limit of {max} reached")]
    CapacityExceeded { max: usize },

    #[error("{name} is not an image ({mime})")]
    NotAnImage { name: String, mime: String },

    #[error("{name} could not be decoded: {reason}")]
    Decode { name: String, reason: String },

    #[error("{name} could not be read: {reason}")]
    Read { name: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    #[error("collection already holds {max} images")]
    Full { max: usize },

    #[error("no image with id {0}")]
    NotFound(String),

    #[error("image {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: String,
        from: ImageStatus,
        to: ImageStatus,
    },

    #[error(transparent)]
    Preview(#[from] PreviewError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("source image could not be decoded: {0}")]
    Decode(String),

    #[error("viewport never reported a usable size")]
    LayoutTimeout,

    #[error("editor is not ready")]
    NotReady,

    #[error("a save is still in progress")]
    SaveInProgress,

    #[error("cropped image could not be encoded: {0}")]
    Encode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("no pending images to process")]
    NothingPending,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage client could not be built: {0}")]
    Client(#[source] reqwest::Error),

    #[error("upload slot request failed: {0}")]
    Slot(#[source] reqwest::Error),

    #[error("upload slot response was rejected: {0}")]
    SlotRejected(String),

    #[error("upload failed: {0}")]
    Upload(#[source] reqwest::Error),

    #[error("upload rejected with status {0}")]
    UploadRejected(u16),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemovalError {
    #[error("removal service failed: {0}")]
    Service(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("sign-in is not available in this session")]
    Unavailable,
}

/// Why a submitted batch did not complete. The whole batch reverts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error(transparent)]
    Removal(#[from] RemovalError),
}
