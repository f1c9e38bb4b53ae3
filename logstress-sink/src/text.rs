use std::path::Path;
use std::time::SystemTime;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::{Sink, WriteError, open_append};

/// Level name written in every line. The harness only emits informational records.
const LEVEL: &str = "info";

/// A backend writing `"<timestamp> <level>: <message>"` lines without a write buffer.
///
/// Every line reaches the file before [`Sink::write`] returns, so the file size tracks completed
/// writes.
///
/// Optionally mirrors every message to stderr, like a console transport next to the file.
#[derive(Debug)]
pub struct TextSink {
    mirror_stderr: bool,
    file: Mutex<File>,
}

impl TextSink {
    /// Opens the sink, appending to `path`.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = open_append(path.as_ref()).await?;

        Ok(Self {
            mirror_stderr: false,
            file: Mutex::new(file),
        })
    }

    /// Also prints every message as `"<level>: <message>"` to stderr.
    pub fn mirror_stderr(mut self, mirror: bool) -> Self {
        self.mirror_stderr = mirror;
        self
    }
}

fn format_line(now: SystemTime, message: &str) -> String {
    format!(
        "{} {LEVEL}: {message}\n",
        humantime::format_rfc3339_millis(now)
    )
}

#[async_trait::async_trait]
impl Sink for TextSink {
    fn name(&self) -> &'static str {
        "text"
    }

    async fn write(&self, message: &str) -> Result<(), WriteError> {
        let line = format_line(SystemTime::now(), message);
        {
            // The file handle completes writes in the background until flushed.
            let mut file = self.file.lock().await;
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }

        if self.mirror_stderr {
            eprintln!("{LEVEL}: {message}");
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), WriteError> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    #[test]
    fn line_format() {
        let now = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(
            format_line(now, "User 7: Log entry #1"),
            "2023-11-14T22:13:20.123Z info: User 7: Log entry #1\n"
        );
    }

    #[tokio::test]
    async fn writes_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("text.log");

        let sink = TextSink::open(&path).await.unwrap();
        sink.write("first").await.unwrap();
        sink.write("second").await.unwrap();
        sink.flush().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" info: first"));
        assert!(lines[1].ends_with(" info: second"));
    }

    #[tokio::test]
    async fn write_reaches_file_before_returning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.log");

        let sink = TextSink::open(&path).await.unwrap();
        sink.write("first").await.unwrap();
        let after_first = std::fs::metadata(&path).unwrap().len();
        sink.write("second").await.unwrap();
        let after_second = std::fs::metadata(&path).unwrap().len();

        let contents = std::fs::read_to_string(&path).unwrap();
        let first_line = contents.lines().next().unwrap().len() as u64 + 1;
        assert_eq!(after_first, first_line);
        assert_eq!(after_second, contents.len() as u64);
    }
}
