//! In-memory [`Sink`] implementations: one records every message it receives, the other
//! never completes a write.
//!
//! ```
//! use logstress_sink::Sink;
//! use logstress_test::sink::RecordingSink;
//!
//! #[tokio::main]
//! async fn main() {
//!     let sink = RecordingSink::new().fail_matching("#2");
//!     sink.write("entry #1").await.unwrap();
//!     assert!(sink.write("entry #2").await.is_err());
//!     assert_eq!(sink.messages(), ["entry #1"]);
//! }
//! ```

use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use logstress_sink::{Sink, WriteError};

/// A sink keeping all accepted messages in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
    fail_pattern: Option<String>,
    attempts: AtomicUsize,
    flushes: AtomicUsize,
}

impl RecordingSink {
    /// Creates a sink that accepts every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every message containing `pattern` with an I/O error.
    pub fn fail_matching(mut self, pattern: impl Into<String>) -> Self {
        self.fail_pattern = Some(pattern.into());
        self
    }

    /// Returns all accepted messages in the order they were written.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Returns the number of accepted messages.
    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    /// Returns `true` if no message was accepted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of write calls, including rejected ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Returns how often [`Sink::flush`] was called.
    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl Sink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn write(&self, message: &str) -> Result<(), WriteError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        let rejected = self
            .fail_pattern
            .as_deref()
            .is_some_and(|pattern| message.contains(pattern));
        if rejected {
            return Err(io::Error::other(format!("rejected `{message}`")).into());
        }

        self.messages.lock().unwrap().push(message.to_owned());
        Ok(())
    }

    async fn flush(&self) -> Result<(), WriteError> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// A sink whose writes and flushes never complete.
#[derive(Debug, Default)]
pub struct StalledSink {
    attempts: AtomicUsize,
}

impl StalledSink {
    /// Creates a stalled sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of write calls that started.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl Sink for StalledSink {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn write(&self, _message: &str) -> Result<(), WriteError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        std::future::pending().await
    }

    async fn flush(&self) -> Result<(), WriteError> {
        std::future::pending().await
    }
}
