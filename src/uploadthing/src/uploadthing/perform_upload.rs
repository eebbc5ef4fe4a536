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

use super::client::UploadThingInner;
use super::poll_upload::poll_upload;
use super::transport::{check_response, parse_response};
use super::upload_part::{PartUploader, content_disposition_header};
use crate::model::{
    CompleteMultipartRequest, ContentDisposition, FileInfo, PartResult, UploadFilesRequest,
    UploadFilesResponse, UploadIntent, UploadedObject,
};
use crate::upload_source::FileSource;
use crate::{Error, ErrorCode, Result};
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;

/// Why an upload intent cannot be used.
#[derive(thiserror::Error, Debug, PartialEq)]
pub(crate) enum IntentError {
    #[error("Failed to generate presigned URL")]
    NoPresignedUrls,
    #[error("the upload intent has an empty {0}")]
    EmptyField(&'static str),
    #[error("the chunk size in the upload intent must be greater than zero")]
    ZeroChunkSize,
    #[error(
        "a {size} byte file in {chunk_size} byte parts needs {want} presigned URLs, the upload intent has {got}"
    )]
    UrlCountMismatch {
        size: u64,
        chunk_size: u64,
        want: u64,
        got: usize,
    },
    #[error("expected one upload intent per file ({want}), got {got}")]
    IntentCountMismatch { want: usize, got: usize },
}

impl IntentError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::NoPresignedUrls => ErrorCode::UrlGenerationFailed,
            _ => ErrorCode::InternalClientError,
        }
    }
}

impl From<IntentError> for Error {
    fn from(value: IntentError) -> Self {
        Error::upload(value.code(), value.to_string())
    }
}

/// One part of a file and where to upload it.
#[derive(Debug, PartialEq)]
pub(crate) struct PartPlan<'a> {
    pub part_number: u32,
    pub offset: u64,
    pub len: u64,
    pub url: &'a str,
}

/// Splits a file of `size` bytes into the parts described by `intent`.
///
/// There are `ceil(size / chunk_size)` parts, all of them `chunk_size` bytes
/// except the last. An empty file is uploaded as a single empty part.
pub(crate) fn plan_parts(
    size: u64,
    intent: &UploadIntent,
) -> std::result::Result<Vec<PartPlan<'_>>, IntentError> {
    if intent.presigned_urls.is_empty() {
        return Err(IntentError::NoPresignedUrls);
    }
    if intent.key.is_empty() {
        return Err(IntentError::EmptyField("key"));
    }
    if intent.upload_id.is_empty() {
        return Err(IntentError::EmptyField("upload id"));
    }
    let chunk_size = intent.chunk_size;
    if chunk_size == 0 {
        return Err(IntentError::ZeroChunkSize);
    }
    let want = std::cmp::max(1, size.div_ceil(chunk_size));
    if want != intent.presigned_urls.len() as u64 {
        return Err(IntentError::UrlCountMismatch {
            size,
            chunk_size,
            want,
            got: intent.presigned_urls.len(),
        });
    }
    let parts = intent
        .presigned_urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            let offset = i as u64 * chunk_size;
            PartPlan {
                part_number: i as u32 + 1,
                offset,
                len: std::cmp::min(chunk_size, size - offset),
                url: url.as_str(),
            }
        })
        .collect();
    Ok(parts)
}

/// A request builder for [UploadThing::upload][crate::client::UploadThing::upload].
///
/// # Example
/// ```no_run
/// # async fn sample(client: &uploadthing::client::UploadThing) -> anyhow::Result<()> {
/// use uploadthing::model::ContentDisposition;
/// use uploadthing::upload_source::BytesSource;
/// let objects = client
///     .upload([BytesSource::new("hello.txt", "hello world")])
///     .with_metadata(serde_json::json!({"userId": "user-123"}))
///     .with_content_disposition(ContentDisposition::Attachment)
///     .send()
///     .await?;
/// println!("uploaded {objects:?}");
/// # Ok(()) }
/// ```
pub struct UploadFiles<S> {
    inner: Arc<UploadThingInner>,
    files: Vec<S>,
    metadata: serde_json::Value,
    content_disposition: ContentDisposition,
}

impl<S> UploadFiles<S>
where
    S: FileSource,
{
    pub(crate) fn new(inner: Arc<UploadThingInner>, files: Vec<S>) -> Self {
        Self {
            inner,
            files,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
            content_disposition: ContentDisposition::default(),
        }
    }

    /// Attaches metadata to the upload.
    ///
    /// The metadata is forwarded to the `onUploadComplete` callbacks of the
    /// application. The default is an empty object.
    pub fn with_metadata<V: Into<serde_json::Value>>(mut self, v: V) -> Self {
        self.metadata = v.into();
        self
    }

    /// Sets how browsers present the uploaded files.
    pub fn with_content_disposition(mut self, v: ContentDisposition) -> Self {
        self.content_disposition = v;
        self
    }

    /// Uploads all the files.
    ///
    /// Returns one [UploadedObject] per file, in the same order as the input.
    /// If any file fails the whole call fails.
    pub async fn send(self) -> Result<Vec<UploadedObject>> {
        if self.files.is_empty() {
            return Ok(Vec::new());
        }
        let intents = self.create_upload().await?;
        let uploads = self
            .files
            .iter()
            .zip(intents)
            .map(|(source, intent)| self.upload_file(source, intent));
        futures::future::try_join_all(uploads).await
    }

    async fn create_upload(&self) -> Result<Vec<UploadIntent>> {
        let request = UploadFilesRequest {
            files: self
                .files
                .iter()
                .map(|f| FileInfo {
                    name: f.name(),
                    size: f.size(),
                    mime_type: f.mime_type(),
                })
                .collect(),
            metadata: &self.metadata,
            content_disposition: self.content_disposition,
        };
        let response = self
            .inner
            .transport
            .post("/api/uploadFiles", &request)
            .await?;
        let response: UploadFilesResponse = parse_response(response, None).await?;
        if response.data.len() != self.files.len() {
            return Err(IntentError::IntentCountMismatch {
                want: self.files.len(),
                got: response.data.len(),
            }
            .into());
        }
        Ok(response.data)
    }

    async fn upload_file(&self, source: &S, intent: UploadIntent) -> Result<UploadedObject> {
        let parts = plan_parts(source.size(), &intent)?;
        tracing::debug!(
            key = intent.key.as_str(),
            name = source.name(),
            parts = parts.len(),
            "uploading file"
        );
        let uploader = PartUploader::new(
            &self.inner.transport,
            &self.inner.options.part_backoff,
            &intent.key,
            source.mime_type(),
            content_disposition_header(self.content_disposition, source.name()),
        )
        .with_callback_timeout(self.inner.options.failure_callback_timeout);
        let uploader = &uploader;
        let mut etags: Vec<PartResult> = futures::stream::iter(parts)
            .map(move |part| async move {
                let data = source
                    .read_range(part.offset, part.len)
                    .await
                    .map_err(Error::io)?;
                uploader.upload(part.part_number, part.url, data).await
            })
            .buffer_unordered(self.inner.options.part_concurrency)
            .try_collect()
            .await?;
        etags.sort_by_key(|p| p.part_number);

        let request = CompleteMultipartRequest {
            file_key: &intent.key,
            upload_id: &intent.upload_id,
            etags: &etags,
        };
        let response = self
            .inner
            .transport
            .post("/api/completeMultipart", &request)
            .await?;
        check_response(response).await?;

        poll_upload(
            &self.inner.transport,
            &self.inner.options.poll_backoff,
            &intent.key,
        )
        .await?;

        Ok(UploadedObject {
            key: intent.key,
            url: intent.file_url,
            name: source.name().to_string(),
            size: source.size(),
        })
    }
}

impl<S> std::fmt::Debug for UploadFiles<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFiles")
            .field("inner", &self.inner)
            .field("files", &self.files.len())
            .field("metadata", &self.metadata)
            .field("content_disposition", &self.content_disposition)
            .finish()
    }
}
