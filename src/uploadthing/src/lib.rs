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

//! Client library for [UploadThing].
//!
//! This crate uploads files to UploadThing and manages the uploaded files.
//! Most applications will use the [UploadThing][client::UploadThing] client.
//!
//! Uploads use the multipart protocol of the service. The client requests an
//! upload intent for each file, uploads the parts of each file directly to the
//! storage provider using presigned URLs, and then waits until the service
//! reports the upload as complete.
//!
//! # Example
//! ```no_run
//! # tokio_test::block_on(async {
//! use uploadthing::client::UploadThing;
//! use uploadthing::upload_source::PathSource;
//! let client = UploadThing::builder().build().await?;
//! let source = PathSource::open("photos/cat.png").await?;
//! let objects = client.upload([source]).send().await?;
//! println!("uploaded to {}", objects[0].url);
//! # anyhow::Result::<()>::Ok(()) });
//! ```
//!
//! [UploadThing]: https://uploadthing.com

pub mod backoff_policy;
pub mod error;
pub mod model;
pub mod upload_source;

mod uploadthing;

pub use error::{Error, ErrorCode};

/// The result type for all UploadThing operations.
pub type Result<T> = std::result::Result<T, Error>;

pub mod client {
    pub use crate::uploadthing::client::{API_KEY_ENV, BuilderError, ClientBuilder, UploadThing};
}
pub mod builder {
    pub use crate::uploadthing::list_files::ListFiles;
    pub use crate::uploadthing::perform_upload::UploadFiles;
}
