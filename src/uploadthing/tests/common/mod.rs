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

#![allow(dead_code)]

use httptest::Server;
use std::time::Duration;
use uploadthing::backoff_policy::{ExponentialBackoff, ExponentialBackoffBuilder};
use uploadthing::client::UploadThing;

pub const API_KEY: &str = "sk_test_123";

/// Enables tracing for the test.
pub fn enable_tracing() -> ::tracing::subscriber::DefaultGuard {
    use tracing_subscriber::fmt::format::FmtSpan;
    #[cfg(feature = "log-integration-tests")]
    let max_level = tracing::Level::INFO;
    #[cfg(not(feature = "log-integration-tests"))]
    let max_level = tracing::Level::WARN;
    let subscriber = tracing_subscriber::fmt()
        .with_level(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_max_level(max_level)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// A backoff policy with millisecond delays.
pub fn fast_backoff(max_retries: u32) -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_delay(Duration::from_millis(1))
        .with_maximum_delay(Duration::from_millis(4))
        .with_max_retries(max_retries)
        .build()
        .expect("valid backoff parameters")
}

/// A client sending all requests to `server`.
pub async fn test_client(server: &Server) -> anyhow::Result<UploadThing> {
    let client = UploadThing::builder()
        .with_endpoint(format!("http://{}", server.addr()))
        .with_api_key(API_KEY)
        .with_part_backoff(fast_backoff(2))
        .with_poll_backoff(fast_backoff(3))
        .build()
        .await?;
    Ok(client)
}
