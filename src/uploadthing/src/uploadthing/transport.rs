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

use crate::{Error, Result};
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) const DEFAULT_ENDPOINT: &str = "https://uploadthing.com";
pub(crate) const API_VERSION: &str = "6.1.0";
pub(crate) const API_KEY_HEADER: &str = "x-uploadthing-api-key";
pub(crate) const VERSION_HEADER: &str = "x-uploadthing-version";

/// Sends requests to the control plane and to the storage provider.
///
/// Control plane requests carry the API key, the API version, and a JSON
/// content type. Requests to presigned URLs carry none of these.
#[derive(Clone)]
pub(crate) struct Transport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[censored]")
            .finish()
    }
}

impl Transport {
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: String) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn control_plane(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.endpoint))
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(VERSION_HEADER, API_VERSION)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Sends a JSON request to the control plane.
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body).map_err(Error::ser)?;
        tracing::debug!(path, "POST to control plane");
        self.control_plane(reqwest::Method::POST, path)
            .body(body)
            .send()
            .await
            .map_err(Error::transport)
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        tracing::debug!(path, "GET from control plane");
        self.control_plane(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(Error::transport)
    }

    /// Uploads one part to a presigned URL.
    pub async fn put(
        &self,
        url: &str,
        body: bytes::Bytes,
        content_type: &str,
        content_disposition: &str,
    ) -> Result<reqwest::Response> {
        self.client
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_DISPOSITION, content_disposition)
            .body(body)
            .send()
            .await
            .map_err(Error::transport)
    }
}

/// Parses a control plane response.
///
/// Responses with an error status, or with a non-empty `error` field, are
/// service errors. With a `fallback` message, the error message prefers the
/// `error` field and then the fallback. Without it, the message prefers the
/// `message` field, then the `error` field, and then the HTTP reason phrase.
pub(crate) async fn parse_response<T>(response: reqwest::Response, fallback: Option<&str>) -> Result<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response.bytes().await.map_err(Error::transport)?;
    let json = serde_json::from_slice::<Value>(&body).ok();
    if !status.is_success() || json.as_ref().is_some_and(has_error) {
        return Err(service_error(status, json.as_ref(), fallback));
    }
    match json {
        Some(v) => serde_json::from_value(v).map_err(Error::deser),
        None => Err(Error::deser(format!(
            "expected a JSON object, got {} bytes that are not valid JSON",
            body.len()
        ))),
    }
}

/// Checks a control plane response whose body is not used.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    let body = response.bytes().await.map_err(Error::transport)?;
    let json = serde_json::from_slice::<Value>(&body).ok();
    if !status.is_success() || json.as_ref().is_some_and(has_error) {
        return Err(service_error(status, json.as_ref(), None));
    }
    Ok(())
}

fn has_error(json: &Value) -> bool {
    match json.get("error") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn service_error(status: reqwest::StatusCode, json: Option<&Value>, fallback: Option<&str>) -> Error {
    let field = |name: &str| {
        json.and_then(|j| j.get(name))
            .filter(|_| name != "error" || json.is_some_and(has_error))
            .and_then(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::String(_) | Value::Null => None,
                other => Some(other.to_string()),
            })
    };
    let message = match fallback {
        Some(fallback) => field("error")
            .or_else(|| field("message"))
            .unwrap_or_else(|| fallback.to_string()),
        None => field("message")
            .or_else(|| field("error"))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string()),
    };
    Error::service(status.as_u16(), message)
}
