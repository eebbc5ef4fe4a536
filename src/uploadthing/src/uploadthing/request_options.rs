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

use crate::backoff_policy::ExponentialBackoff;
use std::time::Duration;

pub(crate) const DEFAULT_PART_CONCURRENCY: usize = 4;
pub(crate) const DEFAULT_FAILURE_CALLBACK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub(crate) struct RequestOptions {
    pub part_backoff: ExponentialBackoff,
    pub poll_backoff: ExponentialBackoff,
    pub part_concurrency: usize,
    pub failure_callback_timeout: Duration,
}

impl RequestOptions {
    pub(crate) fn new() -> Self {
        Self {
            part_backoff: ExponentialBackoff::part_upload_default(),
            poll_backoff: ExponentialBackoff::default(),
            part_concurrency: DEFAULT_PART_CONCURRENCY,
            failure_callback_timeout: DEFAULT_FAILURE_CALLBACK_TIMEOUT,
        }
    }
}
