use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use crate::{Sink, WriteError, open_append};

/// Numeric level used for informational records, following the common JSON logger convention.
const INFO_LEVEL: u8 = 30;

#[derive(Serialize)]
struct Record<'a> {
    level: u8,
    time: u64,
    pid: u32,
    msg: &'a str,
}

/// A backend writing newline-delimited JSON records through a write buffer.
///
/// The file only grows when the buffer fills up or on [`Sink::flush`], so its observed size
/// advances in steps of roughly the buffer size.
#[derive(Debug)]
pub struct JsonSink {
    pid: u32,
    writer: Mutex<BufWriter<File>>,
}

impl JsonSink {
    /// Opens the sink, appending to `path` with a write buffer of `buffer_size` bytes.
    ///
    /// A `buffer_size` of zero writes every record straight to the file.
    pub async fn open(path: impl AsRef<Path>, buffer_size: usize) -> std::io::Result<Self> {
        let file = open_append(path.as_ref()).await?;

        Ok(Self {
            pid: std::process::id(),
            writer: Mutex::new(BufWriter::with_capacity(buffer_size, file)),
        })
    }

    fn encode(&self, message: &str) -> Result<Vec<u8>, WriteError> {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let record = Record {
            level: INFO_LEVEL,
            time,
            pid: self.pid,
            msg: message,
        };

        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        Ok(line)
    }
}

#[async_trait::async_trait]
impl Sink for JsonSink {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn write(&self, message: &str) -> Result<(), WriteError> {
        let line = self.encode(message)?;
        self.writer.lock().await.write_all(&line).await?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), WriteError> {
        let mut writer = self.writer.lock().await;
        writer.flush().await?;
        writer.get_ref().sync_data().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn writes_one_json_record_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("json.log");

        let sink = JsonSink::open(&path, 8 * 1024).await.unwrap();
        for i in 1..=3 {
            sink.write(&format!("entry #{i}")).await.unwrap();
        }
        sink.flush().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let messages: Vec<String> = contents
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                assert_eq!(value["level"], 30);
                value["msg"].as_str().unwrap().to_owned()
            })
            .collect();

        assert_eq!(messages, ["entry #1", "entry #2", "entry #3"]);
    }

    #[tokio::test]
    async fn buffered_writes_are_invisible_until_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("json.log");

        let sink = JsonSink::open(&path, 64 * 1024).await.unwrap();
        sink.write("hello").await.unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

        sink.flush().await.unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[tokio::test]
    async fn appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("json.log");
        std::fs::write(&path, "previous run\n").unwrap();

        let sink = JsonSink::open(&path, 0).await.unwrap();
        sink.write("next run").await.unwrap();
        sink.flush().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("previous run\n"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn concurrent_writers_keep_lines_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("json.log");
        let sink = Arc::new(JsonSink::open(&path, 1024).await.unwrap());

        let tasks: Vec<_> = (0..16)
            .map(|writer| {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    for i in 0..25 {
                        sink.write(&format!("writer {writer} entry {i}")).await.unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        sink.flush().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 16 * 25);
        for line in contents.lines() {
            serde_json::from_str::<serde_json::Value>(line).unwrap();
        }
    }
}
