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
use super::transport::parse_response;
use crate::Result;
use crate::model::{FileList, ListFilesRequest};
use std::sync::Arc;

/// A request builder for [UploadThing::list_files][crate::client::UploadThing::list_files].
///
/// # Example
/// ```
/// # use uploadthing::client::UploadThing;
/// # async fn sample(client: &UploadThing) -> anyhow::Result<()> {
/// let mut offset = 0;
/// loop {
///     let page = client.list_files().with_limit(100).with_offset(offset).send().await?;
///     offset += page.files.len() as u64;
///     if !page.has_more {
///         break;
///     }
/// }
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct ListFiles {
    inner: Arc<UploadThingInner>,
    request: ListFilesRequest,
}

impl ListFiles {
    pub(crate) fn new(inner: Arc<UploadThingInner>) -> Self {
        Self {
            inner,
            request: ListFilesRequest::default(),
        }
    }

    /// Sets the maximum number of files returned.
    pub fn with_limit(mut self, v: u64) -> Self {
        self.request.limit = Some(v);
        self
    }

    /// Skips the first `v` files.
    pub fn with_offset(mut self, v: u64) -> Self {
        self.request.offset = Some(v);
        self
    }

    /// Sends the request.
    pub async fn send(self) -> Result<FileList> {
        let response = self
            .inner
            .transport
            .post("/api/listFiles", &self.request)
            .await?;
        parse_response(
            response,
            Some("An unknown error occurred while listing files."),
        )
        .await
    }
}
