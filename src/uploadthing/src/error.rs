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

//! Errors returned by the UploadThing client.
//!
//! All operations return [Error]. Applications can classify errors using the
//! predicates (`is_service()`, `is_poll_timeout()`, ...) or using the
//! [ErrorCode] reported by [Error::code].

use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The error codes used by the UploadThing service.
///
/// Each code maps to a canonical HTTP status. The service does not always
/// return a structured error, in that case the client library classifies the
/// error using the HTTP status of the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    // Generic
    BadRequest,
    NotFound,
    Forbidden,
    InternalServerError,
    InternalClientError,

    // S3 specific
    TooLarge,
    TooSmall,
    TooManyFiles,
    KeyTooLong,

    // UploadThing specific
    UrlGenerationFailed,
    UploadFailed,
    MissingEnv,
    FileLimitExceeded,
}

impl ErrorCode {
    // The order matters: classification picks the first code with a matching
    // status.
    const ALL: [ErrorCode; 13] = [
        ErrorCode::BadRequest,
        ErrorCode::NotFound,
        ErrorCode::Forbidden,
        ErrorCode::InternalServerError,
        ErrorCode::InternalClientError,
        ErrorCode::TooLarge,
        ErrorCode::TooSmall,
        ErrorCode::TooManyFiles,
        ErrorCode::KeyTooLong,
        ErrorCode::UrlGenerationFailed,
        ErrorCode::UploadFailed,
        ErrorCode::MissingEnv,
        ErrorCode::FileLimitExceeded,
    ];

    /// The name used by the service for this code.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::ErrorCode;
    /// assert_eq!(ErrorCode::TooLarge.as_str(), "TOO_LARGE");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::InternalClientError => "INTERNAL_CLIENT_ERROR",
            Self::TooLarge => "TOO_LARGE",
            Self::TooSmall => "TOO_SMALL",
            Self::TooManyFiles => "TOO_MANY_FILES",
            Self::KeyTooLong => "KEY_TOO_LONG",
            Self::UrlGenerationFailed => "URL_GENERATION_FAILED",
            Self::UploadFailed => "UPLOAD_FAILED",
            Self::MissingEnv => "MISSING_ENV",
            Self::FileLimitExceeded => "FILE_LIMIT_EXCEEDED",
        }
    }

    /// The canonical HTTP status for this code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest | Self::TooSmall | Self::TooManyFiles | Self::KeyTooLong => 400,
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::TooLarge => 413,
            Self::InternalServerError
            | Self::InternalClientError
            | Self::UrlGenerationFailed
            | Self::UploadFailed
            | Self::MissingEnv
            | Self::FileLimitExceeded => 500,
        }
    }

    /// Classifies an HTTP status.
    ///
    /// Returns the first code whose canonical status matches, and
    /// [ErrorCode::InternalServerError] for any status without a code.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::ErrorCode;
    /// assert_eq!(ErrorCode::from_http_status(403), ErrorCode::Forbidden);
    /// assert_eq!(ErrorCode::from_http_status(400), ErrorCode::BadRequest);
    /// assert_eq!(ErrorCode::from_http_status(418), ErrorCode::InternalServerError);
    /// ```
    pub fn from_http_status(status: u16) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.http_status() == status)
            .unwrap_or(Self::InternalServerError)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type for all UploadThing operations.
///
/// The client library reports errors from multiple sources: the control plane
/// may reject a request, the storage provider may refuse an uploaded part, the
/// transport may fail to connect, the upload source may fail to read, or the
/// upload may never be marked as complete.
///
/// # Example
/// ```
/// use uploadthing::{Error, ErrorCode};
/// match example_function() {
///     Err(e) if e.is_service() => println!("the service rejected the request: {e}"),
///     Err(e) if e.code() == ErrorCode::UploadFailed => println!("upload failed: {e}"),
///     Err(e) => println!("some other error {e}"),
///     Ok(_) => println!("success"),
/// }
///
/// fn example_function() -> Result<(), Error> {
///     // ... details omitted ...
///     # Err(Error::service(404, "not found"))
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error for a request rejected by the control plane.
    ///
    /// The code is derived from the HTTP status.
    ///
    /// # Example
    /// ```
    /// # use uploadthing::{Error, ErrorCode};
    /// let error = Error::service(413, "file too large");
    /// assert!(error.is_service());
    /// assert_eq!(error.code(), ErrorCode::TooLarge);
    /// assert_eq!(error.http_status_code(), 413);
    /// ```
    pub fn service<T: Into<String>>(status_code: u16, message: T) -> Self {
        let details = ServiceDetails {
            code: ErrorCode::from_http_status(status_code),
            status_code,
            message: message.into(),
        };
        Self {
            kind: ErrorKind::Service(Box::new(details)),
            source: None,
        }
    }

    /// The control plane rejected the request.
    ///
    /// # Troubleshooting
    ///
    /// Consult the message, it usually describes the problem. Common causes
    /// include an invalid API key, exceeding the storage quota, or files that
    /// do not match the configured file routes.
    pub fn is_service(&self) -> bool {
        matches!(self.kind, ErrorKind::Service(_))
    }

    /// Creates an error detected by the client library while uploading.
    pub fn upload<T: Into<String>>(code: ErrorCode, message: T) -> Self {
        Self {
            kind: ErrorKind::Upload {
                code,
                message: message.into(),
            },
            source: None,
        }
    }

    /// The upload could not be completed.
    ///
    /// This includes parts that could not be uploaded to the storage provider
    /// and upload intents that the client library cannot use.
    pub fn is_upload(&self) -> bool {
        matches!(self.kind, ErrorKind::Upload { .. })
    }

    /// Creates an error representing an upload that was never marked done.
    pub fn poll_timeout<T: Into<String>>(key: T, attempts: u32) -> Self {
        Self {
            kind: ErrorKind::PollTimeout {
                key: key.into(),
                attempts,
            },
            source: None,
        }
    }

    /// The service did not report the upload as complete before the polling
    /// policy was exhausted.
    ///
    /// # Troubleshooting
    ///
    /// All the data was uploaded, but the service is still processing it. The
    /// file may become available later. Consider configuring a polling policy
    /// with more retries or a longer maximum delay.
    pub fn is_poll_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::PollTimeout { .. })
    }

    /// Creates an error for an HTTP response without a usable payload.
    pub fn http(status_code: u16, payload: bytes::Bytes) -> Self {
        let details = TransportDetails {
            status_code: Some(status_code),
            payload: Some(payload),
        };
        Self {
            kind: ErrorKind::Transport(Box::new(details)),
            source: None,
        }
    }

    /// Creates an error for requests that failed before receiving a response.
    pub fn transport<T: Into<BoxError>>(source: T) -> Self {
        let details = TransportDetails {
            status_code: None,
            payload: None,
        };
        Self {
            kind: ErrorKind::Transport(Box::new(details)),
            source: Some(source.into()),
        }
    }

    /// A problem in the transport layer.
    ///
    /// Examples include broken connections, DNS failures, and unexpected HTTP
    /// responses from the storage provider.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport(_))
    }

    /// Creates an error representing a serialization problem.
    pub fn ser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Serialization,
            source: Some(source.into()),
        }
    }

    /// The request could not be serialized.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Serialization)
    }

    /// Creates an error representing a deserialization problem.
    pub fn deser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Deserialization,
            source: Some(source.into()),
        }
    }

    /// The response could not be deserialized.
    ///
    /// # Troubleshooting
    ///
    /// This typically indicates a mismatch between the client library and the
    /// service API version. Make sure the endpoint points to the UploadThing
    /// control plane.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Deserialization)
    }

    /// Creates an error representing a failure reading an upload source.
    pub fn io<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Io,
            source: Some(source.into()),
        }
    }

    /// The upload source could not be read.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io)
    }

    /// Creates an error representing an invalid client configuration.
    pub fn config<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Config(ErrorCode::InternalClientError),
            source: Some(source.into()),
        }
    }

    /// Creates an error representing a missing environment variable.
    pub fn missing_env(variable: &str) -> Self {
        Self {
            kind: ErrorKind::Config(ErrorCode::MissingEnv),
            source: Some(format!("missing API key, set `{variable}` or call `with_api_key()`").into()),
        }
    }

    /// The client configuration is invalid.
    ///
    /// # Troubleshooting
    ///
    /// Check the values passed to the [ClientBuilder]. If the error code is
    /// [ErrorCode::MissingEnv], set the API key explicitly or through the
    /// environment.
    ///
    /// [ClientBuilder]: crate::client::ClientBuilder
    pub fn is_config(&self) -> bool {
        matches!(self.kind, ErrorKind::Config(_))
    }

    /// The [ErrorCode] for this error.
    ///
    /// Errors detected by the client library outside of an upload report
    /// [ErrorCode::InternalClientError].
    pub fn code(&self) -> ErrorCode {
        match &self.kind {
            ErrorKind::Service(d) => d.code,
            ErrorKind::Upload { code, .. } => *code,
            ErrorKind::Config(code) => *code,
            ErrorKind::PollTimeout { .. } => ErrorCode::InternalServerError,
            ErrorKind::Transport(d) => d
                .status_code
                .map(ErrorCode::from_http_status)
                .unwrap_or(ErrorCode::InternalClientError),
            ErrorKind::Serialization | ErrorKind::Deserialization | ErrorKind::Io => {
                ErrorCode::InternalClientError
            }
        }
    }

    /// The HTTP status associated with this error.
    ///
    /// This is the status returned by the service when there is one, and the
    /// canonical status for [code()][Error::code] otherwise.
    pub fn http_status_code(&self) -> u16 {
        match &self.kind {
            ErrorKind::Service(d) => d.status_code,
            ErrorKind::Transport(d) => d
                .status_code
                .unwrap_or_else(|| self.code().http_status()),
            _ => self.code().http_status(),
        }
    }

    /// The HTTP payload, if any, associated with this error.
    pub fn http_payload(&self) -> Option<&bytes::Bytes> {
        match &self.kind {
            ErrorKind::Transport(d) => d.payload.as_ref(),
            _ => None,
        }
    }

    /// Attaches the underlying cause to this error.
    pub(crate) fn with_source<T: Into<BoxError>>(mut self, source: T) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.source) {
            (ErrorKind::Service(d), _) => write!(
                f,
                "[UT] {} (code={}, status={})",
                d.message, d.code, d.status_code
            ),
            (ErrorKind::Upload { code, message }, None) => {
                write!(f, "[UT] {message} (code={code})")
            }
            (ErrorKind::Upload { code, message }, Some(e)) => {
                write!(f, "[UT] {message} (code={code}): {e}")
            }
            (ErrorKind::PollTimeout { key, attempts }, _) => write!(
                f,
                "[UT] the upload for {key} was not marked as done after {attempts} status checks"
            ),
            (ErrorKind::Transport(details), _) => details.display(self.source(), f),
            (ErrorKind::Serialization, Some(e)) => {
                write!(f, "[UT] cannot serialize the request {e}")
            }
            (ErrorKind::Deserialization, Some(e)) => {
                write!(f, "[UT] cannot deserialize the response {e}")
            }
            (ErrorKind::Io, Some(e)) => write!(f, "[UT] cannot read the upload source {e}"),
            (ErrorKind::Config(code), Some(e)) => {
                write!(f, "[UT] invalid client configuration (code={code}): {e}")
            }
            (_, None) => unreachable!("no constructor allows this"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn StdError))
    }
}

/// The type of error held by an [Error] instance.
#[derive(Debug)]
enum ErrorKind {
    Service(Box<ServiceDetails>),
    Upload { code: ErrorCode, message: String },
    PollTimeout { key: String, attempts: u32 },
    Transport(Box<TransportDetails>),
    Serialization,
    Deserialization,
    Io,
    Config(ErrorCode),
}

#[derive(Debug)]
struct ServiceDetails {
    code: ErrorCode,
    status_code: u16,
    message: String,
}

#[derive(Debug)]
struct TransportDetails {
    status_code: Option<u16>,
    payload: Option<bytes::Bytes>,
}

impl TransportDetails {
    fn display(
        &self,
        source: Option<&(dyn StdError + 'static)>,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match (source, self) {
            (
                _,
                TransportDetails {
                    status_code: Some(code),
                    payload: Some(p),
                },
            ) => {
                if let Ok(message) = std::str::from_utf8(p.as_ref()) {
                    write!(f, "[UT] the HTTP transport reports a [{code}] error: {message}")
                } else {
                    write!(f, "[UT] the HTTP transport reports a [{code}] error: {p:?}")
                }
            }
            (Some(source), _) => write!(f, "[UT] the transport reports an error: {source}"),
            (None, _) => unreachable!("no Error constructor allows this"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(400, ErrorCode::BadRequest)]
    #[test_case(403, ErrorCode::Forbidden)]
    #[test_case(404, ErrorCode::NotFound)]
    #[test_case(413, ErrorCode::TooLarge)]
    #[test_case(500, ErrorCode::InternalServerError)]
    #[test_case(200, ErrorCode::InternalServerError)]
    #[test_case(418, ErrorCode::InternalServerError)]
    fn code_from_status(status: u16, want: ErrorCode) {
        assert_eq!(ErrorCode::from_http_status(status), want);
    }

    #[test]
    fn canonical_status_round_trip() {
        for code in ErrorCode::ALL {
            let got = ErrorCode::from_http_status(code.http_status());
            assert_eq!(
                got.http_status(),
                code.http_status(),
                "{code} classified as {got}"
            );
        }
    }

    #[test]
    fn service() {
        let error = Error::service(403, "invalid API key");
        assert!(error.is_service(), "{error:?}");
        assert!(!error.is_upload(), "{error:?}");
        assert_eq!(error.code(), ErrorCode::Forbidden);
        assert_eq!(error.http_status_code(), 403);
        assert!(error.source().is_none(), "{error:?}");
        let got = error.to_string();
        assert!(got.starts_with("[UT] invalid API key"), "{got}");
        assert!(got.contains("FORBIDDEN"), "{got}");
    }

    #[test]
    fn upload() {
        let error = Error::upload(ErrorCode::UploadFailed, "Failed to upload")
            .with_source(Error::http(503, bytes::Bytes::from_static(b"try again")));
        assert!(error.is_upload(), "{error:?}");
        assert_eq!(error.code(), ErrorCode::UploadFailed);
        assert_eq!(error.http_status_code(), 500);
        let source = error
            .source()
            .and_then(|e| e.downcast_ref::<Error>())
            .expect("source should be an Error");
        assert_eq!(source.http_status_code(), 503);
        assert!(error.to_string().contains("try again"), "{error}");
    }

    #[test]
    fn poll_timeout() {
        let error = Error::poll_timeout("abc123", 6);
        assert!(error.is_poll_timeout(), "{error:?}");
        assert_eq!(error.code(), ErrorCode::InternalServerError);
        let got = error.to_string();
        assert!(got.contains("abc123"), "{got}");
        assert!(got.contains('6'), "{got}");
    }

    #[test]
    fn http() {
        let error = Error::http(404, bytes::Bytes::from_static(b"NOT FOUND"));
        assert!(error.is_transport(), "{error:?}");
        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(error.http_status_code(), 404);
        assert_eq!(
            error.http_payload(),
            Some(&bytes::Bytes::from_static(b"NOT FOUND"))
        );
        assert!(error.to_string().contains("[404]"), "{error}");
    }

    #[test]
    fn transport() {
        let error = Error::transport("connection reset");
        assert!(error.is_transport(), "{error:?}");
        assert_eq!(error.code(), ErrorCode::InternalClientError);
        assert_eq!(error.http_status_code(), 500);
        assert!(error.http_payload().is_none(), "{error:?}");
        assert!(error.source().is_some(), "{error:?}");
    }

    #[test]
    fn missing_env() {
        let error = Error::missing_env("UPLOADTHING_SECRET");
        assert!(error.is_config(), "{error:?}");
        assert_eq!(error.code(), ErrorCode::MissingEnv);
        assert!(error.to_string().contains("UPLOADTHING_SECRET"), "{error}");
    }

    #[test]
    fn client_side() {
        let error = Error::deser("bad json");
        assert!(error.is_deserialization(), "{error:?}");
        assert_eq!(error.code(), ErrorCode::InternalClientError);

        let error = Error::ser("bad value");
        assert!(error.is_serialization(), "{error:?}");

        let error = Error::io(std::io::Error::other("disk on fire"));
        assert!(error.is_io(), "{error:?}");
        assert!(error.to_string().contains("disk on fire"), "{error}");

        let error = Error::config("bad endpoint");
        assert!(error.is_config(), "{error:?}");
        assert_eq!(error.code(), ErrorCode::InternalClientError);
    }
}
