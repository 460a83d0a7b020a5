//! `uketsuke` - Event registration and reception desk
//!
//! This library provides the core functionality for running event
//! registrations: seat capacity tracking, QR-token check-in, CSV import and
//! export, and best-effort confirmation notifications.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod capacity;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod logging;
pub mod notify;
pub mod reception;
pub mod registration;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use event::{Event, EventForm, EventStatus};
pub use logging::init_logging;
pub use reception::Reception;
pub use registration::{Registration, RegistrationForm, RegistrationStatus};
pub use store::{BlobStore, EventStore, FileBlobStore, MemoryBlobStore, RegistrationStore};
