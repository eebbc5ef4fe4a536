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

mod common;

use common::{API_KEY, enable_tracing, test_client};
use httptest::{Expectation, Server, matchers::*, responders::*};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;
use uploadthing::ErrorCode;
use uploadthing::model::RenameUpdate;

type Result = anyhow::Result<()>;

#[tokio::test]
async fn delete_files() -> Result {
    let _guard = enable_tracing();
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/api/deleteFile"),
            request::headers(contains(("x-uploadthing-api-key", API_KEY))),
            request::body(json_decoded(eq(json!({"fileKeys": ["key-1", "key-2"]})))),
        ])
        .times(1)
        .respond_with(json_encoded(json!({"success": true}))),
    );

    let client = test_client(&server).await?;
    let deleted = client.delete_files(["key-1", "key-2"]).await?;
    assert!(deleted);
    Ok(())
}

#[tokio::test]
async fn list_files() -> Result {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/api/listFiles"),
            request::body(json_decoded(eq(json!({"limit": 2, "offset": 4})))),
        ])
        .respond_with(json_encoded(json!({
            "files": [
                {"id": "id-1", "key": "key-1", "name": "a.txt", "status": "Uploaded"},
                {"id": "id-2", "key": "key-2", "name": "b.txt", "status": "Uploaded"},
            ],
            "hasMore": true,
        }))),
    );

    let client = test_client(&server).await?;
    let page = client.list_files().with_limit(2).with_offset(4).send().await?;
    let keys = page.files.iter().map(|f| f.key.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["key-1", "key-2"]);
    assert_eq!(page.files[0].id, "id-1");
    assert!(page.has_more);
    Ok(())
}

#[tokio::test]
async fn list_files_defaults() -> Result {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/api/listFiles"),
            request::body(json_decoded(eq(json!({})))),
        ])
        .respond_with(json_encoded(json!({"files": []}))),
    );

    let client = test_client(&server).await?;
    let page = client.list_files().send().await?;
    assert!(page.files.is_empty(), "{page:?}");
    assert!(!page.has_more);
    Ok(())
}

#[tokio::test]
async fn rename_files() -> Result {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/api/renameFile"),
            request::body(json_decoded(eq(json!({
                "updates": [
                    {"fileKey": "key-1", "newName": "cat.png"},
                    {"fileKey": "key-2", "newName": "dog.png"},
                ]
            })))),
        ])
        .respond_with(json_encoded(json!({"success": true}))),
    );

    let client = test_client(&server).await?;
    let renamed = client
        .rename_files([
            RenameUpdate::new("key-1", "cat.png"),
            RenameUpdate::new("key-2", "dog.png"),
        ])
        .await?;
    assert!(renamed);
    Ok(())
}

#[tokio::test]
async fn get_file_urls() -> Result {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/api/getFileUrl"),
            request::body(json_decoded(eq(json!({"fileKeys": ["key-1"]})))),
        ])
        .respond_with(json_encoded(json!({
            "data": [{"key": "key-1", "url": "https://utfs.io/f/key-1"}]
        }))),
    );

    let client = test_client(&server).await?;
    let urls = client.get_file_urls([String::from("key-1")]).await?;
    assert_eq!(urls.len(), 1);
    assert_eq!(urls[0].key, "key-1");
    assert_eq!(urls[0].url, "https://utfs.io/f/key-1");
    Ok(())
}

#[tokio::test]
async fn get_usage_info() -> Result {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/api/getUsageInfo"),
            request::body(json_decoded(eq(json!({})))),
        ])
        .respond_with(json_encoded(json!({
            "totalBytes": 4096,
            "totalReadable": "4KB",
            "appTotalBytes": 2048,
            "appTotalReadable": "2KB",
            "filesUploaded": 7,
            "limitBytes": 2147483648_u64,
            "limitReadable": "2GB",
        }))),
    );

    let client = test_client(&server).await?;
    let usage = client.get_usage_info().await?;
    assert_eq!(usage.total_bytes, 4096);
    assert_eq!(usage.app_total_bytes, 2048);
    assert_eq!(usage.files_uploaded, 7);
    assert_eq!(usage.limit_readable.as_deref(), Some("2GB"));
    Ok(())
}

#[test_case(json!({"error": "file not found"}), "file not found"; "error field")]
#[test_case(json!({"message": "bad key"}), "bad key"; "message field")]
#[test_case(json!({}), "An unknown error occurred while deleting files."; "fallback")]
#[tokio::test]
async fn delete_files_error_status(body: serde_json::Value, want: &str) -> Result {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/deleteFile"))
            .respond_with(status_code(404).body(body.to_string())),
    );

    let client = test_client(&server).await?;
    let err = client.delete_files(["key-1"]).await.unwrap_err();
    assert!(err.is_service(), "{err:?}");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(err.to_string().starts_with(&format!("[UT] {want}")), "{err}");
    Ok(())
}

#[tokio::test]
async fn error_field_in_success_response() -> Result {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/renameFile"))
            .respond_with(json_encoded(json!({"error": "name is too long"}))),
    );

    let client = test_client(&server).await?;
    let err = client
        .rename_files([RenameUpdate::new("key-1", "x".repeat(1024))])
        .await
        .unwrap_err();
    assert!(err.is_service(), "{err:?}");
    assert!(err.to_string().contains("name is too long"), "{err}");
    Ok(())
}

#[tokio::test]
async fn usage_info_not_json() -> Result {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/api/getUsageInfo"))
            .respond_with(status_code(200).body("<html>oops</html>")),
    );

    let client = test_client(&server).await?;
    let err = client.get_usage_info().await.unwrap_err();
    assert!(err.is_deserialization(), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn connection_refused() -> Result {
    let client = {
        let server = Server::run();
        test_client(&server).await?
    };
    let err = client.get_usage_info().await.unwrap_err();
    assert!(err.is_transport(), "{err:?}");
    Ok(())
}
