#![allow(unused_crate_dependencies)]
#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::expect_used, reason = "integration test, panics are the assertion mechanism")]

use axum::http::{header, StatusCode};
use axum_test::TestServer;
use notion_assets_core::notion::NotionClientConfig;
use notion_assets_core::{build_file_router, AppState, FetchOptions, NotionClient, NotionError, PageFetcher};
use notion_assets_types::ShimConfig;
use wiremock::matchers::{body_partial_json, header as match_header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_ID: &str = "0123abcd456789abcdef0123456789ab";
const PAGE_UUID: &str = "0123abcd-4567-89ab-cdef-0123456789ab";
const PDF_BLOCK: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";
const RAW_SOURCE: &str = "https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/report.pdf";

fn page_chunk_body() -> serde_json::Value {
    serde_json::json!({
        "recordMap": {
            "block": {
                PAGE_UUID: {
                    "role": "reader",
                    "value": {"id": PAGE_UUID, "type": "page", "content": [PDF_BLOCK]}
                },
                PDF_BLOCK: {
                    "role": "reader",
                    "value": {
                        "id": PDF_BLOCK,
                        "type": "pdf",
                        "properties": {"source": [[RAW_SOURCE]]}
                    }
                }
            }
        },
        "cursor": {"stack": []}
    })
}

fn api_base(server: &MockServer) -> String {
    format!("{}/api/v3", server.uri())
}

fn client(server: &MockServer, token: Option<&str>) -> NotionClient {
    NotionClient::new(NotionClientConfig {
        api_base_url: api_base(server),
        token_v2: token.map(str::to_string),
        ..NotionClientConfig::default()
    })
    .expect("client")
}

async fn mount_page_chunk(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v3/loadPageChunk"))
        .and(body_partial_json(serde_json::json!({"pageId": PAGE_UUID})))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_chunk_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_signed_fetch_populates_signed_urls() {
    let server = MockServer::start().await;
    mount_page_chunk(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v3/getSignedFileUrls"))
        .and(match_header("cookie", "token_v2=secret"))
        .and(body_partial_json(serde_json::json!({
            "urls": [{"permissionRecord": {"table": "block", "id": PDF_BLOCK}, "url": RAW_SOURCE}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "signedUrls": ["https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/report.pdf?X-Amz-Signature=abc"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let map = client(&server, Some("secret"))
        .get_page(PAGE_ID, FetchOptions::signed())
        .await
        .expect("page");

    assert_eq!(
        map.signed_url(PDF_BLOCK),
        Some("https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/report.pdf?X-Amz-Signature=abc")
    );
    assert_eq!(map.raw_source_url(PDF_BLOCK), Some(RAW_SOURCE));
}

#[tokio::test]
async fn test_unsigned_fetch_skips_signing() {
    let server = MockServer::start().await;
    mount_page_chunk(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v3/getSignedFileUrls"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let map = client(&server, None)
        .get_page(PAGE_UUID, FetchOptions::unsigned())
        .await
        .expect("page");

    assert!(map.signed_url(PDF_BLOCK).is_none());
    assert_eq!(map.raw_source_url(PDF_BLOCK), Some(RAW_SOURCE));
}

#[tokio::test]
async fn test_missing_children_are_loaded() {
    let server = MockServer::start().await;
    let child = "11111111-2222-3333-4444-555555555555";
    Mock::given(method("POST"))
        .and(path("/api/v3/loadPageChunk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "recordMap": {"block": {
                PAGE_UUID: {"value": {"id": PAGE_UUID, "type": "page", "content": [child]}}
            }}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/syncRecordValues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "recordMap": {"block": {
                child: {"value": {"id": child, "type": "text"}}
            }}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = FetchOptions { sign_file_urls: false, fetch_missing_blocks: true };
    let map = client(&server, None).get_page(PAGE_ID, options).await.expect("page");

    assert_eq!(map.block_type(child), Some("text"));
}

#[tokio::test]
async fn test_error_status_and_bad_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/loadPageChunk"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let client = client(&server, None);

    let err = client.get_page(PAGE_ID, FetchOptions::unsigned()).await.expect_err("503");
    assert!(matches!(err, NotionError::Status { endpoint: "loadPageChunk", status: 503 }));

    let err = client.get_page("definitely-not-an-id", FetchOptions::unsigned()).await.expect_err("id");
    assert!(matches!(err, NotionError::InvalidId(_)));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/loadPageChunk"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .get_page(PAGE_ID, FetchOptions::unsigned())
        .await
        .expect_err("decode");

    assert!(matches!(err, NotionError::Decode { endpoint: "loadPageChunk", .. }));
}

/// Signing is rejected, so the redirect falls back to the raw source URL.
#[tokio::test]
async fn test_redirect_end_to_end_with_signing_rejected() {
    let notion = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/loadPageChunk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_chunk_body()))
        .expect(2)
        .mount(&notion)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/getSignedFileUrls"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&notion)
        .await;

    let config = ShimConfig {
        notion_api_base_url: api_base(&notion),
        ..ShimConfig::default()
    };
    let state = AppState::from_config(&config).expect("state");
    let app = TestServer::new(build_file_router(state)).expect("test server");

    let response = app
        .get("/api/notion-file")
        .add_query_param("blockId", PDF_BLOCK)
        .add_query_param("pageId", PAGE_ID)
        .await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], RAW_SOURCE);
}

#[tokio::test]
async fn test_page_endpoint_end_to_end() {
    let notion = MockServer::start().await;
    mount_page_chunk(&notion).await;
    Mock::given(method("POST"))
        .and(path("/api/v3/getSignedFileUrls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "signedUrls": ["https://prod-files-secure.s3.us-west-2.amazonaws.com/ws/report.pdf?sig=1"]
        })))
        .mount(&notion)
        .await;

    let config = ShimConfig {
        notion_api_base_url: api_base(&notion),
        token_v2: Some("secret".to_string()),
        ..ShimConfig::default()
    };
    let state = AppState::from_config(&config).expect("state");
    let app = TestServer::new(build_file_router(state)).expect("test server");

    let response = app.get(&format!("/api/page/{}", PAGE_ID)).await;

    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(
        json["signed_urls"][PDF_BLOCK],
        format!("/assets-pdf/{}/{}", PAGE_ID, PDF_BLOCK)
    );
    assert_eq!(json["block"][PDF_BLOCK]["value"]["type"], "pdf");
}

/// A page whose first chunk lists `child` but does not include its record.
async fn mount_page_missing_child(notion: &MockServer, child: &str, child_source: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v3/loadPageChunk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "recordMap": {"block": {
                PAGE_UUID: {"value": {"id": PAGE_UUID, "type": "page", "content": [child]}}
            }}
        })))
        .mount(notion)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/syncRecordValues"))
        .and(body_partial_json(serde_json::json!({
            "requests": [{"pointer": {"table": "block", "id": child}, "version": -1}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "recordMap": {"block": {
                child: {"value": {
                    "id": child,
                    "type": "pdf",
                    "properties": {"source": [[child_source]]}
                }}
            }}
        })))
        .mount(notion)
        .await;
}

#[tokio::test]
async fn test_redirect_for_block_outside_first_chunk() {
    let notion = MockServer::start().await;
    let child = "99999999-8888-7777-6666-555555555555";
    let source = "https://s3-us-west-2.amazonaws.com/secure.notion-static.com/late.pdf";
    mount_page_missing_child(&notion, child, source).await;
    Mock::given(method("POST"))
        .and(path("/api/v3/getSignedFileUrls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "signedUrls": ["https://s3-us-west-2.amazonaws.com/secure.notion-static.com/late.pdf?sig=2"]
        })))
        .mount(&notion)
        .await;

    let config = ShimConfig { notion_api_base_url: api_base(&notion), ..ShimConfig::default() };
    let app = TestServer::new(build_file_router(AppState::from_config(&config).expect("state")))
        .expect("test server");

    let response = app
        .get("/api/notion-file")
        .add_query_param("blockId", child)
        .add_query_param("pageId", PAGE_ID)
        .await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://s3-us-west-2.amazonaws.com/secure.notion-static.com/late.pdf?sig=2"
    );

    let json: serde_json::Value = app.get(&format!("/api/page/{}", PAGE_ID)).await.json();
    assert_eq!(json["signed_urls"][child], format!("/assets-pdf/{}/{}", PAGE_ID, child));
}

#[tokio::test]
async fn test_sub_page_content_not_loaded() {
    let server = MockServer::start().await;
    let sub_page = "12121212-3434-5656-7878-909090909090";
    Mock::given(method("POST"))
        .and(path("/api/v3/loadPageChunk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "recordMap": {"block": {
                PAGE_UUID: {"value": {"id": PAGE_UUID, "type": "page", "content": [sub_page]}},
                sub_page: {"value": {
                    "id": sub_page,
                    "type": "page",
                    "content": ["abababab-abab-abab-abab-abababababab"]
                }}
            }}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/syncRecordValues"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let map = client(&server, None)
        .get_page(PAGE_ID, FetchOptions::unsigned())
        .await
        .expect("page");

    assert_eq!(map.block_type(sub_page), Some("page"));
}
