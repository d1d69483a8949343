//! External collaborators. Each one is a trait object built once by the binary and
//! handed to the app, so tests can substitute in-process fakes.

pub mod identity;
pub mod removal;
pub mod storage;

pub use identity::{AuthProvider, IdentityProvider, OfflineIdentity, User};
pub use removal::{RemovalService, SimulatedRemoval};
pub use storage::{PresignedStorage, StorageService, UploadSlot};
