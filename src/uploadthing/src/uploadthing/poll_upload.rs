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

use super::transport::Transport;
use crate::backoff_policy::ExponentialBackoff;
use crate::model::PollUploadResponse;
use crate::{Error, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const STATUS_DONE: &str = "done";

/// Waits until the control plane reports the upload for `key` as done.
///
/// Each check is a single status request. Any failure is treated as "not
/// ready". Returns [Error::is_poll_timeout] once the backoff policy is
/// exhausted.
pub(crate) async fn poll_upload(
    transport: &Transport,
    backoff: &ExponentialBackoff,
    key: &str,
) -> Result<()> {
    let path = format!("/api/pollUpload/{}", utf8_percent_encode(key, PATH_SEGMENT));
    let mut attempts = 0_u32;
    let done = backoff
        .retry(async || {
            attempts += 1;
            self::check_status(transport, &path).await.then_some(())
        })
        .await;
    done.ok_or_else(|| Error::poll_timeout(key, attempts))
}

async fn check_status(transport: &Transport, path: &str) -> bool {
    let response = match transport.get(path).await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(path, "poll request failed: {e}");
            return false;
        }
    };
    if !response.status().is_success() {
        tracing::debug!(path, status = response.status().as_u16(), "poll request rejected");
        return false;
    }
    let Ok(body) = response.bytes().await else {
        return false;
    };
    let status = serde_json::from_slice::<PollUploadResponse>(&body)
        .ok()
        .and_then(|r| r.status);
    tracing::debug!(path, ?status, "poll status");
    status.as_deref() == Some(STATUS_DONE)
}
