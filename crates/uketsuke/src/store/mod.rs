//! Storage layer for uketsuke.
//!
//! Collections live in memory and persist through a named-blob adapter.
//! The registration store and the event store each own one collection and
//! rewrite it in full after every mutation; loads are fail-open and writes
//! are best-effort, so storage trouble never blocks the desk.

pub mod blob;
pub mod events;
pub mod registrations;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use events::{EventStore, EVENTS_KEY};
pub use registrations::{EventStatistics, RegistrationStore, REGISTRATIONS_KEY};
