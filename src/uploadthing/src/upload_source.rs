// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines upload data sources.

use std::path::Path;
use tokio::sync::Mutex;

/// Provides the data and the attributes of a file to upload.
///
/// The client library splits each file into parts and uploads the parts
/// concurrently. Implementations must return the same data for the same range,
/// no matter how many times, or in what order, the ranges are requested.
///
/// # Example
/// ```
/// # tokio_test::block_on(async {
/// use uploadthing::upload_source::{BytesSource, FileSource};
/// let source = BytesSource::new("greeting.txt", "hello world");
/// assert_eq!(source.name(), "greeting.txt");
/// assert_eq!(source.mime_type(), "text/plain");
/// assert_eq!(source.size(), 11);
/// let bytes = source.read_range(6, 5).await?;
/// assert_eq!(bytes.as_ref(), b"world");
/// # anyhow::Result::<()>::Ok(()) });
/// ```
pub trait FileSource: Send + Sync {
    /// The file name reported to the service and used in `Content-Disposition`.
    fn name(&self) -> &str;

    /// The MIME type of the file.
    fn mime_type(&self) -> &str;

    /// The total size of the file, in bytes.
    fn size(&self) -> u64;

    /// Reads up to `len` bytes starting at `offset`.
    ///
    /// Returns fewer bytes only if the range extends past the end of the file.
    fn read_range(
        &self,
        offset: u64,
        len: u64,
    ) -> impl Future<Output = std::io::Result<bytes::Bytes>> + Send;
}

fn guess_mime_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// An in-memory file.
#[derive(Clone, Debug)]
pub struct BytesSource {
    name: String,
    mime_type: String,
    contents: bytes::Bytes,
}

impl BytesSource {
    /// Creates a new source, guessing the MIME type from the name.
    pub fn new<N, C>(name: N, contents: C) -> Self
    where
        N: Into<String>,
        C: Into<bytes::Bytes>,
    {
        let name = name.into();
        let mime_type = guess_mime_type(&name);
        Self {
            name,
            mime_type,
            contents: contents.into(),
        }
    }

    /// Overrides the guessed MIME type.
    pub fn with_mime_type<T: Into<String>>(mut self, v: T) -> Self {
        self.mime_type = v.into();
        self
    }
}

impl FileSource for BytesSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn size(&self) -> u64 {
        self.contents.len() as u64
    }

    async fn read_range(&self, offset: u64, len: u64) -> std::io::Result<bytes::Bytes> {
        let size = self.contents.len();
        let start = std::cmp::min(offset, size as u64) as usize;
        let end = std::cmp::min(offset.saturating_add(len), size as u64) as usize;
        Ok(self.contents.slice(start..end))
    }
}

/// A file in the local filesystem.
///
/// The name defaults to the file name of the path, and the MIME type is
/// guessed from its extension.
///
/// # Example
/// ```no_run
/// # tokio_test::block_on(async {
/// use uploadthing::upload_source::PathSource;
/// let source = PathSource::open("reports/2025-q3.pdf")
///     .await?
///     .with_name("quarterly-report.pdf");
/// # anyhow::Result::<()>::Ok(()) });
/// ```
#[derive(Debug)]
pub struct PathSource {
    name: String,
    mime_type: String,
    size: u64,
    file: Mutex<tokio::fs::File>,
}

impl PathSource {
    /// Opens the file at `path`.
    pub async fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = guess_mime_type(&name);
        Ok(Self {
            name,
            mime_type,
            size,
            file: Mutex::new(file),
        })
    }

    /// Overrides the file name.
    ///
    /// This does not change the MIME type.
    pub fn with_name<T: Into<String>>(mut self, v: T) -> Self {
        self.name = v.into();
        self
    }

    /// Overrides the guessed MIME type.
    pub fn with_mime_type<T: Into<String>>(mut self, v: T) -> Self {
        self.mime_type = v.into();
        self
    }
}

impl FileSource for PathSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read_range(&self, offset: u64, len: u64) -> std::io::Result<bytes::Bytes> {
        use tokio::io::{AsyncReadExt, AsyncSeekExt};
        let len = std::cmp::min(len, self.size.saturating_sub(offset));
        if len == 0 {
            return Ok(bytes::Bytes::new());
        }
        let mut buffer = vec![0_u8; len as usize];
        // Parts are read concurrently, the lock keeps the seek and the read
        // together.
        let mut file = self.file.lock().await;
        file.seek(std::io::SeekFrom::Start(offset)).await?;
        file.read_exact(&mut buffer).await?;
        Ok(bytes::Bytes::from_owner(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_case::test_case;

    type Result = anyhow::Result<()>;

    const CONTENTS: &[u8] = b"how vexingly quick daft zebras jump";

    #[test_case("photo.png", "image/png")]
    #[test_case("notes.txt", "text/plain")]
    #[test_case("no-extension", "application/octet-stream")]
    fn guess(name: &str, want: &str) {
        assert_eq!(guess_mime_type(name), want);
    }

    #[tokio::test]
    async fn bytes_source() -> Result {
        let source = BytesSource::new("zebras.txt", CONTENTS);
        assert_eq!(source.name(), "zebras.txt");
        assert_eq!(source.mime_type(), "text/plain");
        assert_eq!(source.size(), CONTENTS.len() as u64);

        let got = source.read_range(0, 3).await?;
        assert_eq!(got.as_ref(), b"how");
        let got = source.read_range(30, 100).await?;
        assert_eq!(got.as_ref(), b" jump");
        let got = source.read_range(100, 10).await?;
        assert!(got.is_empty(), "{got:?}");
        Ok(())
    }

    #[tokio::test]
    async fn bytes_source_mime_override() -> Result {
        let source = BytesSource::new("zebras.txt", CONTENTS).with_mime_type("text/markdown");
        assert_eq!(source.mime_type(), "text/markdown");
        Ok(())
    }

    #[tokio::test]
    async fn bytes_source_empty() -> Result {
        let source = BytesSource::new("empty.bin", bytes::Bytes::new());
        assert_eq!(source.size(), 0);
        let got = source.read_range(0, 1024).await?;
        assert!(got.is_empty(), "{got:?}");
        Ok(())
    }

    #[tokio::test]
    async fn path_source() -> Result {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile()?;
        file.write_all(CONTENTS)?;
        file.flush()?;

        let source = PathSource::open(file.path()).await?;
        let want_name = file
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        assert_eq!(Some(source.name().to_string()), want_name);
        assert_eq!(source.mime_type(), "text/plain");
        assert_eq!(source.size(), CONTENTS.len() as u64);

        // Read out of order, as concurrent part uploads would.
        let got = source.read_range(24, 6).await?;
        assert_eq!(got.as_ref(), b"zebras");
        let got = source.read_range(0, 12).await?;
        assert_eq!(got.as_ref(), b"how vexingly");
        let got = source.read_range(30, 1024).await?;
        assert_eq!(got.as_ref(), b" jump");
        let got = source.read_range(1024, 10).await?;
        assert!(got.is_empty(), "{got:?}");
        Ok(())
    }

    #[tokio::test]
    async fn path_source_concurrent_reads() -> Result {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(CONTENTS)?;
        file.flush()?;

        let source = PathSource::open(file.path()).await?;
        let reads = (0..CONTENTS.len() as u64)
            .step_by(5)
            .map(|offset| source.read_range(offset, 5));
        let got = futures::future::try_join_all(reads).await?.concat();
        assert_eq!(got, CONTENTS);
        Ok(())
    }

    #[tokio::test]
    async fn path_source_overrides() -> Result {
        let file = tempfile::NamedTempFile::new()?;
        let source = PathSource::open(file.path())
            .await?
            .with_name("report.pdf")
            .with_mime_type("application/pdf");
        assert_eq!(source.name(), "report.pdf");
        assert_eq!(source.mime_type(), "application/pdf");
        assert_eq!(source.size(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn path_source_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = PathSource::open(dir.path().join("does-not-exist"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
