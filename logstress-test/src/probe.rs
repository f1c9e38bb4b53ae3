//! A [`SizeProbe`] answering from a predefined script.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use logstress_sink::SizeProbe;

/// A probe that returns scripted sizes, one entry per call.
///
/// `None` entries fail with [`io::ErrorKind::NotFound`]. Once the script is exhausted, every
/// further call answers with the fallback.
#[derive(Debug)]
pub struct ScriptedSize {
    script: Mutex<VecDeque<Option<u64>>>,
    fallback: Option<u64>,
    calls: AtomicUsize,
}

impl ScriptedSize {
    /// Creates a probe that plays `script`, then keeps answering with `fallback`.
    pub fn new(script: impl IntoIterator<Item = Option<u64>>, fallback: Option<u64>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    /// Creates a probe for a resource that never exists.
    pub fn missing() -> Self {
        Self::new(Vec::new(), None)
    }

    /// Creates a probe that always reports `size`.
    pub fn fixed(size: u64) -> Self {
        Self::new(Vec::new(), Some(size))
    }

    /// Returns the number of times the size was requested.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl SizeProbe for ScriptedSize {
    async fn size(&self) -> io::Result<u64> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or(self.fallback)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "scripted missing resource"))
    }
}
