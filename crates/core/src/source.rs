use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Something that can hand over the full contents of one input document.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Human-readable origin (path, upload name, URL) used in logs and reports.
    fn origin(&self) -> &str;

    /// Read the whole document into memory.
    async fn read_all(&self) -> Result<Vec<u8>>;
}

/// A document on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    origin: String,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let origin = path.display().to_string();
        Self { path, origin }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ByteSource for FileSource {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn read_all(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// Bytes already held in memory, e.g. an uploaded form part.
#[derive(Debug, Clone)]
pub struct MemorySource {
    origin: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(origin: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            origin: origin.into(),
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn read_all(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_source_reads_whole_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("stock.txt");
        tokio::fs::write(&path, b"Apples, 7\nPeas, 66").await.unwrap();

        let source = FileSource::new(&path);
        assert_eq!(source.origin(), path.display().to_string());
        assert_eq!(source.read_all().await.unwrap(), b"Apples, 7\nPeas, 66".to_vec());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let temp = tempdir().unwrap();
        let source = FileSource::new(temp.path().join("absent.txt"));

        let err = source.read_all().await.unwrap_err();
        assert!(matches!(err, TallyError::IoError(_)));
    }

    #[tokio::test]
    async fn memory_source_returns_its_bytes() {
        let source = MemorySource::new("upload-1", "Beans, 1");
        assert_eq!(source.origin(), "upload-1");
        assert_eq!(source.read_all().await.unwrap(), b"Beans, 1".to_vec());
    }
}
