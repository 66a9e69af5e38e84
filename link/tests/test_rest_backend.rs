//! End-to-end over HTTP: token exchange plus REST calls against wiremock.

use bq_link::auth::ServiceAccountKey;
use bq_link::{BqLinkClient, BqLinkError, BqLinkTimeouts, QuerySpec};
use serde_json::{json, Map};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY: &str = include_str!("fixtures/test_key.pem");
const TOKEN: &str = "ya29.integration";

fn test_key() -> ServiceAccountKey {
    ServiceAccountKey {
        client_email: "reader@proj.iam.gserviceaccount.com".into(),
        private_key: TEST_KEY.into(),
        private_key_id: Some("kid-1".into()),
        token_uri: None,
        project_id: Some("proj".into()),
    }
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> BqLinkClient {
    BqLinkClient::builder()
        .base_url(format!("{}/bigquery/v2", server.uri()))
        .service_account_key(test_key())
        .token_uri(format!("{}/token", server.uri()))
        .max_retries(0)
        .timeouts(
            BqLinkTimeouts::builder()
                .request_timeout(Duration::from_secs(5))
                .job_poll_interval(Duration::ZERO)
                .build(),
        )
        .build()
        .expect("client should build")
}

fn bearer() -> String {
    format!("Bearer {}", TOKEN)
}

#[tokio::test]
async fn test_query_over_http() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/bigquery/v2/projects/proj/queries"))
        .and(header("authorization", bearer().as_str()))
        .and(body_partial_json(json!({"query": "SELECT word FROM words", "maxResults": 100})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "bigquery#queryResponse",
            "schema": {"fields": [{"name": "word", "type": "STRING"}]},
            "jobReference": {"projectId": "proj", "jobId": "job_abc", "location": "EU"},
            "totalRows": "2",
            "rows": [{"f": [{"v": "alpha"}]}, {"f": [{"v": "beta"}]}],
            "jobComplete": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let spec = QuerySpec::new("proj", "ds", "SELECT word FROM words").with_page_size(100);
    let result = client.run_query(spec).await.unwrap();

    assert_eq!(result.headers, vec!["word"]);
    assert_eq!(result.rows, vec![vec![json!("alpha")], vec![json!("beta")]]);
}

#[tokio::test]
async fn test_paging_over_http() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/bigquery/v2/projects/proj/queries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobReference": {"projectId": "proj", "jobId": "job_abc", "location": "EU"},
            "jobComplete": false
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bigquery/v2/projects/proj/queries/job_abc"))
        .and(query_param("pageToken", "page-2"))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalRows": "3",
            "rows": [{"f": [{"v": "3"}]}],
            "jobComplete": true
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bigquery/v2/projects/proj/queries/job_abc"))
        .and(query_param("location", "EU"))
        .and(query_param("maxResults", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schema": {"fields": [{"name": "n", "type": "INTEGER"}]},
            "totalRows": "3",
            "pageToken": "page-2",
            "rows": [{"f": [{"v": "1"}]}, {"f": [{"v": "2"}]}],
            "jobComplete": true
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let spec = QuerySpec::new("proj", "ds", "SELECT n FROM numbers").with_page_size(2);
    let result = client.run_query(spec).await.unwrap();

    assert_eq!(result.headers, vec!["n"]);
    assert_eq!(result.rows, vec![vec![json!("1")], vec![json!("2")], vec![json!("3")]]);
}

#[tokio::test]
async fn test_error_body_maps_to_backend_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/bigquery/v2/projects/proj/queries"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "Syntax error: Unexpected end of script at [1:7]",
                "status": "INVALID_ARGUMENT",
                "errors": [{"reason": "invalidQuery", "location": "q", "message": "Syntax error"}]
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .run_query(QuerySpec::new("proj", "ds", "SELECT"))
        .await
        .unwrap_err();

    match err {
        BqLinkError::BackendError { status_code, message } => {
            assert_eq!(status_code, 400);
            assert!(message.starts_with("Syntax error"));
        },
        other => panic!("expected BackendError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/bigquery/v2/projects/proj/queries"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Request had invalid authentication credentials."}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .run_query(QuerySpec::new("proj", "ds", "SELECT 1"))
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_missing_key_file_makes_no_api_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bigquery/v2/projects/proj/queries"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = BqLinkClient::builder()
        .base_url(format!("{}/bigquery/v2", server.uri()))
        .key_file(dir.path().join("absent.json"))
        .build()
        .unwrap();

    let err = client
        .run_query(QuerySpec::new("proj", "ds", "SELECT 1"))
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_key_file_round_trip() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/bigquery/v2/projects/proj/queries"))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schema": {"fields": [{"name": "f0_", "type": "INTEGER"}]},
            "jobReference": {"projectId": "proj", "jobId": "job_count"},
            "totalRows": "1",
            "rows": [{"f": [{"v": "1234"}]}],
            "jobComplete": true
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("key.json");
    let key_json = json!({
        "type": "service_account",
        "project_id": "proj",
        "private_key_id": "kid-1",
        "private_key": TEST_KEY,
        "client_email": "reader@proj.iam.gserviceaccount.com",
        "token_uri": format!("{}/token", server.uri())
    });
    std::fs::write(&key_path, key_json.to_string()).unwrap();

    let client = BqLinkClient::builder()
        .base_url(format!("{}/bigquery/v2", server.uri()))
        .key_file(&key_path)
        .max_retries(0)
        .build()
        .unwrap();

    assert_eq!(client.count("proj", "ds", "events").await, 1234);
}

#[tokio::test]
async fn test_insert_all_over_http() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/bigquery/v2/projects/proj/datasets/ds/tables/people/insertAll"))
        .and(body_partial_json(json!({"rows": [{"json": {"age": "old"}}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "bigquery#tableDataInsertAllResponse",
            "insertErrors": [{
                "index": 0,
                "errors": [{"reason": "invalid", "location": "age", "message": "Cannot convert value to integer."}]
            }]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut row = Map::new();
    row.insert("age".into(), json!("old"));
    let err = client.insert_row("proj", "ds", "people", row).await.unwrap_err();

    assert!(matches!(err, BqLinkError::InsertError(ref d) if d.len() == 1));
    assert!(err.to_string().contains("field 'age'"));
}

#[tokio::test]
async fn test_table_schema_over_http() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/bigquery/v2/projects/proj/datasets/ds/tables/people"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tableReference": {"projectId": "proj", "datasetId": "ds", "tableId": "people"},
            "schema": {"fields": [
                {"name": "id", "type": "INTEGER", "mode": "REQUIRED"},
                {"name": "tags", "type": "STRING", "mode": "REPEATED"}
            ]},
            "numRows": "10"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let schema = client.table_schema("proj", "ds", "people").await.unwrap();
    assert_eq!(schema.column_names(), vec!["id", "tags"]);
}

#[tokio::test]
async fn test_large_result_job_over_http() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/bigquery/v2/projects/proj/jobs"))
        .and(body_partial_json(json!({
            "configuration": {"query": {
                "allowLargeResults": true,
                "writeDisposition": "WRITE_TRUNCATE",
                "createDisposition": "CREATE_IF_NEEDED",
                "destinationTable": {"projectId": "proj", "datasetId": "ds", "tableId": "tmp"}
            }}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobReference": {"projectId": "proj", "jobId": "job_large"},
            "configuration": {"query": {"query": "SELECT * FROM big"}},
            "status": {"state": "RUNNING"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bigquery/v2/projects/proj/queries/job_large"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schema": {"fields": [{"name": "x", "type": "STRING"}]},
            "totalRows": "1",
            "rows": [{"f": [{"v": "only"}]}],
            "jobComplete": true
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let spec = QuerySpec::new("proj", "ds", "SELECT * FROM big").with_large_results("tmp");
    let result = client.run_query(spec).await.unwrap();
    assert_eq!(result.rows, vec![vec![json!("only")]]);
}
