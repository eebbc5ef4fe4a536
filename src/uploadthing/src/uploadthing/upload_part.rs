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

use super::request_options::DEFAULT_FAILURE_CALLBACK_TIMEOUT;
use super::transport::{Transport, check_response};
use crate::backoff_policy::{ExponentialBackoff, RetryState};
use crate::model::{ContentDisposition, FailureCallbackRequest, PartResult};
use crate::{Error, ErrorCode, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub(crate) const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload file to storage provider";
pub(crate) const MISSING_ETAG_MESSAGE: &str = "Missing Etag header from uploaded part";

// The `attr-char` production from RFC 5987, anything else is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// The `Content-Disposition` header for each part of a file.
pub(crate) fn content_disposition_header(disposition: ContentDisposition, name: &str) -> String {
    let encoded = utf8_percent_encode(name, ATTR_CHAR);
    format!(
        "{}; filename=\"{encoded}\"; filename*=UTF-8''{encoded}",
        disposition.as_str()
    )
}

enum PartAttempt {
    // The number of retries so far.
    Attempting(u32),
    Succeeded(String),
    PermanentlyFailed(Error),
}

/// Uploads the parts of one file.
#[derive(Debug)]
pub(crate) struct PartUploader<'a> {
    transport: &'a Transport,
    backoff: &'a ExponentialBackoff,
    key: &'a str,
    content_type: &'a str,
    content_disposition: String,
    callback_timeout: std::time::Duration,
}

impl<'a> PartUploader<'a> {
    pub fn new(
        transport: &'a Transport,
        backoff: &'a ExponentialBackoff,
        key: &'a str,
        content_type: &'a str,
        content_disposition: String,
    ) -> Self {
        Self {
            transport,
            backoff,
            key,
            content_type,
            content_disposition,
            callback_timeout: DEFAULT_FAILURE_CALLBACK_TIMEOUT,
        }
    }

    /// Bounds the wait for the failure callback.
    pub fn with_callback_timeout(mut self, v: std::time::Duration) -> Self {
        self.callback_timeout = v;
        self
    }

    /// Uploads one part, retrying failed attempts.
    ///
    /// Once the retries are exhausted the control plane is notified, and the
    /// upload fails with [ErrorCode::UploadFailed]. A successful response
    /// without an `Etag` fails immediately.
    pub async fn upload(&self, part_number: u32, url: &str, data: bytes::Bytes) -> Result<PartResult> {
        let mut state = RetryState::new(self.backoff);
        let mut attempt = PartAttempt::Attempting(0);
        loop {
            attempt = match attempt {
                PartAttempt::Succeeded(tag) => return Ok(PartResult::new(part_number, tag)),
                PartAttempt::PermanentlyFailed(e) => return Err(e),
                PartAttempt::Attempting(retries) => {
                    tracing::debug!(key = self.key, part_number, retries, "uploading part");
                    match self.attempt(url, data.clone()).await {
                        Ok(response) => self::tag_from_response(&response),
                        Err(e) => match state.on_failure(self.backoff) {
                            Some(delay) => {
                                tracing::warn!(
                                    key = self.key,
                                    part_number,
                                    ?delay,
                                    "part upload failed, retrying: {e}"
                                );
                                tokio::time::sleep(delay).await;
                                PartAttempt::Attempting(retries + 1)
                            }
                            None => {
                                self.report_failure().await;
                                PartAttempt::PermanentlyFailed(
                                    Error::upload(ErrorCode::UploadFailed, UPLOAD_FAILED_MESSAGE)
                                        .with_source(e),
                                )
                            }
                        },
                    }
                }
            };
        }
    }

    async fn attempt(&self, url: &str, data: bytes::Bytes) -> Result<reqwest::Response> {
        let response = self
            .transport
            .put(url, data, self.content_type, &self.content_disposition)
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(Error::http(status.as_u16(), body));
        }
        Ok(response)
    }

    /// Notifies the control plane about the failed upload.
    ///
    /// Errors, and callbacks slower than the timeout, are logged and otherwise
    /// ignored.
    async fn report_failure(&self) {
        let request = FailureCallbackRequest { file_key: self.key };
        let callback = async {
            let response = self.transport.post("/api/failureCallback", &request).await?;
            check_response(response).await
        };
        match tokio::time::timeout(self.callback_timeout, callback).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(key = self.key, "cannot report the failed upload: {e}");
            }
            Err(_) => {
                tracing::warn!(
                    key = self.key,
                    timeout = ?self.callback_timeout,
                    "abandoned the failed upload report after the timeout"
                );
            }
        }
    }
}

fn tag_from_response(response: &reqwest::Response) -> PartAttempt {
    let tag = response
        .headers()
        .get(http::header::ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.replace('"', ""))
        .filter(|v| !v.is_empty());
    match tag {
        Some(tag) => PartAttempt::Succeeded(tag),
        None => PartAttempt::PermanentlyFailed(Error::upload(
            ErrorCode::UploadFailed,
            MISSING_ETAG_MESSAGE,
        )),
    }
}
