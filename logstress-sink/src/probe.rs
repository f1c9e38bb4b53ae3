use std::fmt::Debug;
use std::io;
use std::path::PathBuf;

/// Reads the current size of a monitored resource.
#[async_trait::async_trait]
pub trait SizeProbe: Debug + Send + Sync + 'static {
    /// Returns the current size in bytes.
    ///
    /// A resource that does not exist yet is reported as an error, not as zero.
    async fn size(&self) -> io::Result<u64>;
}

/// Probes the size of a file on disk.
#[derive(Clone, Debug)]
pub struct FileSize {
    path: PathBuf,
}

impl FileSize {
    /// Creates a probe for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl SizeProbe for FileSize {
    async fn size(&self) -> io::Result<u64> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let probe = FileSize::new(dir.path().join("missing.log"));

        let err = probe.size().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn reports_file_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.log");
        std::fs::write(&path, b"0123456789").unwrap();

        assert_eq!(FileSize::new(&path).size().await.unwrap(), 10);
    }
}
