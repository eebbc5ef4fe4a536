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

use super::list_files::ListFiles;
use super::perform_upload::UploadFiles;
use super::request_options::RequestOptions;
use super::transport::{DEFAULT_ENDPOINT, Transport, parse_response};
use crate::backoff_policy::ExponentialBackoff;
use crate::model::{
    EmptyRequest, FileKeysRequest, FileUrl, FileUrlsResponse, RenameFilesRequest, RenameUpdate,
    SuccessResponse, UsageInfo,
};
use crate::upload_source::FileSource;
use crate::{Error, Result};
use std::sync::Arc;

/// The environment variable used when the API key is not configured.
pub const API_KEY_ENV: &str = "UPLOADTHING_SECRET";

/// Implements a client for the UploadThing API.
///
/// # Example
/// ```no_run
/// # tokio_test::block_on(async {
/// # use uploadthing::client::UploadThing;
/// use uploadthing::upload_source::BytesSource;
/// let client = UploadThing::builder().with_api_key("sk_live_...").build().await?;
/// let objects = client
///     .upload([BytesSource::new("hello.txt", "hello world")])
///     .send()
///     .await?;
/// # anyhow::Result::<()>::Ok(()) });
/// ```
///
/// # Configuration
///
/// To configure `UploadThing` use the `with_*` methods in the type returned
/// by [builder()][UploadThing::builder]. The default configuration should
/// work for most applications. Common configuration changes include
///
/// * [with_api_key()]: by default the client reads the API key from the
///   `UPLOADTHING_SECRET` environment variable.
/// * [with_endpoint()]: by default the client uses `https://uploadthing.com`.
///   Applications may override it in tests, or to use a proxy.
///
/// [with_api_key()]: ClientBuilder::with_api_key
/// [with_endpoint()]: ClientBuilder::with_endpoint
///
/// # Pooling and Cloning
///
/// `UploadThing` holds a connection pool internally, it is advised to
/// create one and then reuse it. You do not need to wrap `UploadThing` in
/// an [Rc](std::rc::Rc) or [Arc] to reuse it, because it already uses an
/// `Arc` internally.
#[derive(Clone, Debug)]
pub struct UploadThing {
    inner: Arc<UploadThingInner>,
}

#[derive(Debug)]
pub(crate) struct UploadThingInner {
    pub transport: Transport,
    pub options: RequestOptions,
}

impl UploadThing {
    /// Returns a builder for [UploadThing].
    ///
    /// # Example
    /// ```
    /// # use uploadthing::client::UploadThing;
    /// # async fn sample() -> anyhow::Result<()> {
    /// let client = UploadThing::builder().build().await?;
    /// # Ok(()) }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Uploads one or more files.
    ///
    /// The files are split into parts, using the part size chosen by the
    /// service, and the parts are uploaded directly to the storage provider.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::client::UploadThing;
    /// # async fn sample(client: &UploadThing) -> anyhow::Result<()> {
    /// use uploadthing::upload_source::PathSource;
    /// let source = PathSource::open("photos/cat.png").await?;
    /// let objects = client.upload([source]).send().await?;
    /// println!("cat is at {}", objects[0].url);
    /// # Ok(()) }
    /// ```
    pub fn upload<I, S>(&self, files: I) -> UploadFiles<S>
    where
        I: IntoIterator<Item = S>,
        S: FileSource,
    {
        UploadFiles::new(self.inner.clone(), files.into_iter().collect())
    }

    /// Deletes files.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::client::UploadThing;
    /// # async fn sample(client: &UploadThing) -> anyhow::Result<()> {
    /// let deleted = client.delete_files(["abc123-cat.png"]).await?;
    /// assert!(deleted);
    /// # Ok(()) }
    /// ```
    pub async fn delete_files<I, K>(&self, keys: I) -> Result<bool>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys = keys.into_iter().map(Into::into).collect::<Vec<String>>();
        let request = FileKeysRequest { file_keys: &keys };
        let response = self.inner.transport.post("/api/deleteFile", &request).await?;
        let response: SuccessResponse = parse_response(
            response,
            Some("An unknown error occurred while deleting files."),
        )
        .await?;
        Ok(response.success)
    }

    /// Lists the files in the application.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::client::UploadThing;
    /// # async fn sample(client: &UploadThing) -> anyhow::Result<()> {
    /// let page = client.list_files().with_limit(10).send().await?;
    /// for file in page.files {
    ///     println!("{file:?}");
    /// }
    /// # Ok(()) }
    /// ```
    pub fn list_files(&self) -> ListFiles {
        ListFiles::new(self.inner.clone())
    }

    /// Renames files.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::client::UploadThing;
    /// # async fn sample(client: &UploadThing) -> anyhow::Result<()> {
    /// use uploadthing::model::RenameUpdate;
    /// let renamed = client
    ///     .rename_files([RenameUpdate::new("abc123-cat.png", "garfield.png")])
    ///     .await?;
    /// # Ok(()) }
    /// ```
    pub async fn rename_files<I>(&self, updates: I) -> Result<bool>
    where
        I: IntoIterator<Item = RenameUpdate>,
    {
        let updates = updates.into_iter().collect::<Vec<_>>();
        let request = RenameFilesRequest { updates: &updates };
        let response = self.inner.transport.post("/api/renameFile", &request).await?;
        let response: SuccessResponse = parse_response(
            response,
            Some("An unknown error occurred while renaming files."),
        )
        .await?;
        Ok(response.success)
    }

    /// Gets the URLs for some files.
    pub async fn get_file_urls<I, K>(&self, keys: I) -> Result<Vec<FileUrl>>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys = keys.into_iter().map(Into::into).collect::<Vec<String>>();
        let request = FileKeysRequest { file_keys: &keys };
        let response = self.inner.transport.post("/api/getFileUrl", &request).await?;
        let response: FileUrlsResponse = parse_response(
            response,
            Some("An unknown error occurred while getting file URLs."),
        )
        .await?;
        Ok(response.data)
    }

    /// Gets the storage usage of the application.
    pub async fn get_usage_info(&self) -> Result<UsageInfo> {
        let response = self
            .inner
            .transport
            .post("/api/getUsageInfo", &EmptyRequest {})
            .await?;
        parse_response(
            response,
            Some("An unknown error occurred while getting usage info."),
        )
        .await
    }

    pub(crate) fn new(builder: ClientBuilder) -> Result<Self> {
        let api_key = match builder.api_key {
            Some(k) => k,
            None => std::env::var(API_KEY_ENV).map_err(|_| Error::missing_env(API_KEY_ENV))?,
        };
        if api_key.is_empty() {
            return Err(Error::missing_env(API_KEY_ENV));
        }
        let endpoint = builder
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let parsed = url::Url::parse(&endpoint)
            .map_err(|e| Error::config(BuilderError::InvalidEndpoint(endpoint.clone(), e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(BuilderError::UnsupportedScheme(
                parsed.scheme().to_string(),
            )));
        }
        if builder.default_options.part_concurrency == 0 {
            return Err(Error::config(BuilderError::ZeroConcurrency));
        }
        let client = reqwest::Client::builder().build().map_err(Error::transport)?;
        let inner = UploadThingInner {
            transport: Transport::new(client, &endpoint, api_key),
            options: builder.default_options,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}

/// Invalid [ClientBuilder] settings.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum BuilderError {
    #[error("invalid endpoint {0}: {1}")]
    InvalidEndpoint(String, #[source] url::ParseError),
    #[error("unsupported endpoint scheme {0}, use http or https")]
    UnsupportedScheme(String),
    #[error("the part concurrency must be at least 1")]
    ZeroConcurrency,
}

/// A builder for [UploadThing].
///
/// ```
/// # use uploadthing::client::UploadThing;
/// # async fn sample() -> anyhow::Result<()> {
/// let builder = UploadThing::builder();
/// let client = builder
///     .with_endpoint("https://uploadthing.com")
///     .with_api_key("sk_live_...")
///     .build()
///     .await?;
/// # Ok(()) }
/// ```
pub struct ClientBuilder {
    pub(crate) endpoint: Option<String>,
    pub(crate) api_key: Option<String>,
    // Default options for requests.
    pub(crate) default_options: RequestOptions,
}

impl ClientBuilder {
    pub(crate) fn new() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            default_options: RequestOptions::new(),
        }
    }

    /// Creates a new client.
    ///
    /// Fails with [ErrorCode::MissingEnv][crate::ErrorCode::MissingEnv] if no
    /// API key is configured and the `UPLOADTHING_SECRET` environment variable
    /// is not set.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::client::UploadThing;
    /// # async fn sample() -> anyhow::Result<()> {
    /// let client = UploadThing::builder().build().await?;
    /// # Ok(()) }
    /// ```
    pub async fn build(self) -> Result<UploadThing> {
        tracing::info!("builder={self:?}");
        UploadThing::new(self)
    }

    /// Sets the endpoint.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::client::UploadThing;
    /// # async fn sample() -> anyhow::Result<()> {
    /// let client = UploadThing::builder()
    ///     .with_endpoint("http://localhost:8080")
    ///     .build()
    ///     .await?;
    /// # Ok(()) }
    /// ```
    pub fn with_endpoint<V: Into<String>>(mut self, v: V) -> Self {
        self.endpoint = Some(v.into());
        self
    }

    /// Sets the API key.
    ///
    /// The client attaches this key to every request to the control plane.
    pub fn with_api_key<V: Into<String>>(mut self, v: V) -> Self {
        self.api_key = Some(v.into());
        self
    }

    /// Configures the backoff policy for part uploads.
    ///
    /// Failed part uploads are retried using this policy. The default waits
    /// 1s, 2s, 4s, 8s, and 16s before giving up.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::client::UploadThing;
    /// # async fn sample() -> anyhow::Result<()> {
    /// use uploadthing::backoff_policy::ExponentialBackoffBuilder;
    /// use std::time::Duration;
    /// let policy = ExponentialBackoffBuilder::new()
    ///     .with_initial_delay(Duration::from_millis(500))
    ///     .with_maximum_delay(Duration::from_secs(10))
    ///     .with_max_retries(3)
    ///     .build()?;
    /// let client = UploadThing::builder()
    ///     .with_part_backoff(policy)
    ///     .build()
    ///     .await?;
    /// # Ok(()) }
    /// ```
    pub fn with_part_backoff(mut self, v: ExponentialBackoff) -> Self {
        self.default_options.part_backoff = v;
        self
    }

    /// Configures the backoff policy used while waiting for uploads to
    /// complete.
    ///
    /// The default polls up to 6 times, starting with a 250ms delay.
    pub fn with_poll_backoff(mut self, v: ExponentialBackoff) -> Self {
        self.default_options.poll_backoff = v;
        self
    }

    /// Sets the maximum number of parts of a file uploaded at the same time.
    ///
    /// The default is 4.
    pub fn with_part_concurrency(mut self, v: usize) -> Self {
        self.default_options.part_concurrency = v;
        self
    }

    /// Sets how long to wait for the service to acknowledge a failed upload.
    ///
    /// When a part cannot be uploaded the client notifies the service before
    /// returning the error. The notification is abandoned after this timeout.
    /// The default is 5 seconds.
    pub fn with_failure_callback_timeout<V: Into<std::time::Duration>>(mut self, v: V) -> Self {
        self.default_options.failure_callback_timeout = v.into();
        self
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[censored]"))
            .field("default_options", &self.default_options)
            .finish()
    }
}
