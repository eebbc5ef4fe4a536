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

//! Types used in the requests and responses of the UploadThing API.

use serde::{Deserialize, Serialize};

/// How browsers should present an uploaded file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ContentDisposition {
    /// Display the file in the browser, if possible.
    #[default]
    Inline,
    /// Download the file.
    Attachment,
}

impl ContentDisposition {
    /// The value used in the `Content-Disposition` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        }
    }
}

/// The upload intent for a single file.
///
/// The service returns one intent per file, with a presigned URL for each
/// part of the file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct UploadIntent {
    /// The presigned URLs, one per part, in part order.
    #[serde(default)]
    pub presigned_urls: Vec<String>,
    /// The object key.
    pub key: String,
    /// The URL of the object once the upload completes.
    pub file_url: String,
    /// The multipart upload session.
    pub upload_id: String,
    /// The size of each part, the last part may be shorter.
    #[serde(default)]
    pub chunk_size: u64,
}

/// The completion tag for one uploaded part.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct PartResult {
    /// The `Etag` returned by the storage provider, without quotes.
    pub tag: String,
    /// The part number, starting at 1.
    pub part_number: u32,
}

impl PartResult {
    pub fn new<T: Into<String>>(part_number: u32, tag: T) -> Self {
        Self {
            tag: tag.into(),
            part_number,
        }
    }
}

/// A successfully uploaded file.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct UploadedObject {
    /// The object key, use it to delete, rename, or get the URL of the file.
    pub key: String,
    /// The public URL of the file.
    pub url: String,
    /// The name of the uploaded file.
    pub name: String,
    /// The size of the uploaded file, in bytes.
    pub size: u64,
}

/// A page of files, as returned by [list_files][crate::client::UploadThing::list_files].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct FileList {
    pub files: Vec<FileListEntry>,
    /// There are more files after this page.
    #[serde(default)]
    pub has_more: bool,
}

/// A file in a [FileList].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct FileListEntry {
    pub id: String,
    pub key: String,
}

/// The URL for a file key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct FileUrl {
    pub key: String,
    pub url: String,
}

/// Usage statistics for the application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct UsageInfo {
    pub total_bytes: u64,
    pub total_readable: Option<String>,
    pub app_total_bytes: u64,
    pub app_total_readable: Option<String>,
    pub files_uploaded: u64,
    pub limit_bytes: u64,
    pub limit_readable: Option<String>,
}

/// Renames one file.
///
/// # Example
/// ```
/// # use uploadthing::model::RenameUpdate;
/// let update = RenameUpdate::new("abc123-photo.png", "vacation.png");
/// assert_eq!(update.new_name, "vacation.png");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct RenameUpdate {
    pub file_key: String,
    pub new_name: String,
}

impl RenameUpdate {
    pub fn new<K, N>(file_key: K, new_name: N) -> Self
    where
        K: Into<String>,
        N: Into<String>,
    {
        Self {
            file_key: file_key.into(),
            new_name: new_name.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadFilesRequest<'a> {
    pub files: Vec<FileInfo<'a>>,
    pub metadata: &'a serde_json::Value,
    #[serde(rename = "contentDisposition")]
    pub content_disposition: ContentDisposition,
}

#[derive(Debug, Serialize)]
pub(crate) struct FileInfo<'a> {
    pub name: &'a str,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadFilesResponse {
    #[serde(default)]
    pub data: Vec<UploadIntent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompleteMultipartRequest<'a> {
    pub file_key: &'a str,
    pub upload_id: &'a str,
    pub etags: &'a [PartResult],
}

#[derive(Debug, Deserialize)]
pub(crate) struct PollUploadResponse {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FailureCallbackRequest<'a> {
    pub file_key: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileKeysRequest<'a> {
    pub file_keys: &'a [String],
}

#[derive(Clone, Debug, Default, Serialize)]
pub(crate) struct ListFilesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RenameFilesRequest<'a> {
    pub updates: &'a [RenameUpdate],
}

#[derive(Debug, Serialize)]
pub(crate) struct EmptyRequest {}

#[derive(Debug, Deserialize)]
pub(crate) struct FileUrlsResponse {
    #[serde(default)]
    pub data: Vec<FileUrl>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}
