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

//! Truncated exponential backoff.
//!
//! The client library waits between attempts when uploading parts and when
//! polling for the completion of an upload. Both use [ExponentialBackoff]: the
//! delay before retry `k` (starting at zero) is `initial_delay * 2^k`, capped
//! at `maximum_delay`. There is no jitter.
//!
//! # Example
//! ```
//! # use uploadthing::backoff_policy::{Error, ExponentialBackoffBuilder};
//! use std::time::Duration;
//! let policy = ExponentialBackoffBuilder::new()
//!     .with_initial_delay(Duration::from_millis(100))
//!     .with_maximum_delay(Duration::from_millis(300))
//!     .with_max_retries(4)
//!     .build()?;
//! assert_eq!(policy.delay(0), Duration::from_millis(100));
//! assert_eq!(policy.delay(1), Duration::from_millis(200));
//! assert_eq!(policy.delay(2), Duration::from_millis(300));
//! # Ok::<(), Error>(())
//! ```

use std::time::Duration;

/// The error type for exponential backoff creation.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the initial delay ({0:?}) should be greater than zero")]
    InvalidInitialDelay(Duration),
    #[error(
        "the maximum delay ({maximum:?}) should be greater than or equal to the initial delay ({initial:?})"
    )]
    EmptyRange {
        maximum: Duration,
        initial: Duration,
    },
}

/// Configures an [ExponentialBackoff].
#[derive(Clone, Debug)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Duration,
    maximum_delay: Duration,
    max_retries: u32,
}

impl ExponentialBackoffBuilder {
    /// Creates a builder with the default parameters.
    ///
    /// The defaults are 5 retries, a 250ms initial delay, and a 64s maximum
    /// delay.
    pub fn new() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            maximum_delay: Duration::from_millis(64_000),
            max_retries: 5,
        }
    }

    /// Change the initial delay.
    pub fn with_initial_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.initial_delay = v.into();
        self
    }

    /// Change the maximum delay.
    pub fn with_maximum_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.maximum_delay = v.into();
        self
    }

    /// Change the number of retries after the first attempt.
    pub fn with_max_retries(mut self, v: u32) -> Self {
        self.max_retries = v;
        self
    }

    /// Creates a new exponential backoff policy.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::backoff_policy::{Error, ExponentialBackoffBuilder};
    /// use std::time::Duration;
    /// let backoff = ExponentialBackoffBuilder::new()
    ///     .with_initial_delay(Duration::from_secs(1))
    ///     .with_maximum_delay(Duration::from_secs(5))
    ///     .build()?;
    /// assert_eq!(backoff.delay(4), Duration::from_secs(5));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn build(self) -> Result<ExponentialBackoff, Error> {
        if self.initial_delay.is_zero() {
            return Err(Error::InvalidInitialDelay(self.initial_delay));
        }
        if self.maximum_delay < self.initial_delay {
            return Err(Error::EmptyRange {
                maximum: self.maximum_delay,
                initial: self.initial_delay,
            });
        }
        Ok(ExponentialBackoff {
            initial_delay: self.initial_delay,
            maximum_delay: self.maximum_delay,
            max_retries: self.max_retries,
        })
    }
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Implements truncated exponential backoff with a bounded number of retries.
#[derive(Clone, Debug, PartialEq)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    maximum_delay: Duration,
    max_retries: u32,
}

impl ExponentialBackoff {
    /// The delay before retry number `retry`, counting from zero.
    pub fn delay(&self, retry: u32) -> Duration {
        2_u32
            .checked_pow(retry)
            .and_then(|scale| self.initial_delay.checked_mul(scale))
            .map(|d| d.min(self.maximum_delay))
            .unwrap_or(self.maximum_delay)
    }

    /// The maximum number of retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The policy for part uploads: 1s, 2s, 4s, 8s, and 16s.
    pub(crate) fn part_upload_default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            maximum_delay: Duration::MAX,
            max_retries: 5,
        }
    }

    /// Calls `check` until it returns a value or the retries are exhausted.
    ///
    /// The check is called at most `max_retries() + 1` times. Between calls
    /// this function sleeps for the duration prescribed by the policy. Returns
    /// `None` if the policy is exhausted.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::backoff_policy::{Error, ExponentialBackoffBuilder};
    /// # tokio_test::block_on(async {
    /// use std::time::Duration;
    /// let policy = ExponentialBackoffBuilder::new()
    ///     .with_initial_delay(Duration::from_millis(1))
    ///     .build()?;
    /// let mut count = 0;
    /// let got = policy
    ///     .retry(async || {
    ///         count += 1;
    ///         (count == 3).then_some(count)
    ///     })
    ///     .await;
    /// assert_eq!(got, Some(3));
    /// # Ok::<(), Error>(()) });
    /// ```
    pub async fn retry<T, F>(&self, mut check: F) -> Option<T>
    where
        F: AsyncFnMut() -> Option<T>,
    {
        let mut state = RetryState::new(self);
        loop {
            if let Some(value) = check().await {
                return Some(value);
            }
            let delay = state.on_failure(self)?;
            tracing::debug!(
                attempt = state.attempt(),
                ?delay,
                "not ready yet, waiting before the next attempt"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            maximum_delay: Duration::from_millis(64_000),
            max_retries: 5,
        }
    }
}

/// Tracks the progress of a single retry loop.
///
/// Each logical operation (uploading one part, polling one upload) creates its
/// own state. States are never shared.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryState {
    attempt: u32,
    delay: Duration,
}

impl RetryState {
    /// Creates the state before the first attempt.
    pub fn new(policy: &ExponentialBackoff) -> Self {
        Self {
            attempt: 0,
            delay: policy.initial_delay,
        }
    }

    /// The number of retries so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The most recent delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records a failed attempt.
    ///
    /// Returns the delay before the next attempt, or `None` if the policy
    /// does not allow more retries.
    pub fn on_failure(&mut self, policy: &ExponentialBackoff) -> Option<Duration> {
        if self.attempt >= policy.max_retries {
            return None;
        }
        self.delay = policy.delay(self.attempt);
        self.attempt += 1;
        Some(self.delay)
    }
}
