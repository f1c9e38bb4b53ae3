//! Logging backends that the stress harness writes through.
//!
//! Every backend implements [`Sink`], which accepts one message per call and persists it to an
//! append-only file whose size can be observed from the outside. Two backends are provided:
//!
//! - [`JsonSink`] writes newline-delimited JSON records through a write buffer.
//! - [`TextSink`] writes human-readable `timestamp level: message` lines straight to the file.
//!
//! The size of a backend's file is read through a [`SizeProbe`], see [`FileSize`].
//!
//! Sinks are shared by many concurrent writers. Each implementation serializes access to its
//! file internally, so callers never need to add their own locking.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::fmt::Debug;
use std::io;
use std::path::Path;

use tokio::fs::{File, OpenOptions};

mod error;
mod json;
mod probe;
mod text;

pub use error::WriteError;
pub use json::JsonSink;
pub use probe::{FileSize, SizeProbe};
pub use text::TextSink;

/// Write entry point of a logging backend.
#[async_trait::async_trait]
pub trait Sink: Debug + Send + Sync + 'static {
    /// The backend name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Persists a single log message.
    async fn write(&self, message: &str) -> Result<(), WriteError>;

    /// Pushes all buffered records down to the underlying file.
    ///
    /// Once this resolves, the file size reflects every write that completed before the call.
    async fn flush(&self) -> Result<(), WriteError>;
}

/// Opens `path` for appending, creating the file and its parent directories as needed.
async fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
}
