// D1 backend against a mocked Cloudflare query API.

use std::time::Duration;

use mockito::Matcher;
use posts_core::config::{Backend, D1BindingConfig};
use posts_store::{D1Connector, ExecutionContext, PostRepository, StoreClient, StoreError};
use serde_json::json;

const QUERY_PATH: &str = "/accounts/acc-1/d1/database/db-1/query";

fn managed(server: &mockito::ServerGuard) -> (StoreClient, ExecutionContext) {
    let client = StoreClient::Managed(D1Connector::new(Duration::from_secs(5)).unwrap());
    let ctx = ExecutionContext::new().with_binding(
        "DB",
        D1BindingConfig {
            account_id: "acc-1".into(),
            database_id: "db-1".into(),
            api_token: "secret".into(),
            api_base: server.url(),
        },
    );
    (client, ctx)
}

#[tokio::test]
async fn list_all_reads_results_array() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", QUERY_PATH)
        .match_header("authorization", "Bearer secret")
        .match_body(Matcher::PartialJson(json!({ "params": [] })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "errors": [],
                "messages": [],
                "result": [{
                    "success": true,
                    "results": [
                        {"id": 1, "name": "one", "createdAt": 1700000000, "updatedAt": null},
                        {"id": 2, "name": "two", "createdAt": 1700000005, "updatedAt": null}
                    ],
                    "meta": {"changes": 0, "last_row_id": 0}
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (client, ctx) = managed(&server);
    let handle = client.handle(&ctx).unwrap();
    assert_eq!(handle.backend(), Backend::Managed);

    let posts = PostRepository::new(handle).list_all().await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[1].name, "two");
    assert_eq!(posts[1].created_at, 1_700_000_005);
    mock.assert_async().await;
}

#[tokio::test]
async fn create_sends_name_as_bound_parameter() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", QUERY_PATH)
        .match_body(Matcher::PartialJson(json!({ "params": ["Hello D1"] })))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "errors": [],
                "result": [{
                    "success": true,
                    "results": [{"id": 9, "name": "Hello D1", "createdAt": 1700000100, "updatedAt": null}],
                    "meta": {"changes": 1, "last_row_id": 9}
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (client, ctx) = managed(&server);
    let post = PostRepository::new(client.handle(&ctx).unwrap())
        .create("Hello D1")
        .await
        .unwrap();
    assert_eq!(post.id, 9);
    assert_eq!(post.name, "Hello D1");
    mock.assert_async().await;
}

#[tokio::test]
async fn delete_sends_threshold_as_string_param() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", QUERY_PATH)
        .match_body(Matcher::PartialJson(json!({ "params": ["1700000000"] })))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "errors": [],
                "result": [{"success": true, "results": [], "meta": {"changes": 4}}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (client, ctx) = managed(&server);
    let n = PostRepository::new(client.handle(&ctx).unwrap())
        .delete_older_than(1_700_000_000)
        .await
        .unwrap();
    assert_eq!(n, 4);
    mock.assert_async().await;
}

#[tokio::test]
async fn api_errors_surface_as_unavailable() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", QUERY_PATH)
        .with_status(400)
        .with_body(
            json!({
                "success": false,
                "errors": [{"code": 7500, "message": "no such table: posts"}],
                "result": []
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (client, ctx) = managed(&server);
    let err = PostRepository::new(client.handle(&ctx).unwrap())
        .list_all()
        .await
        .unwrap_err();
    assert!(err.is_unavailable());
    assert!(err.to_string().contains("no such table: posts"));
}

#[tokio::test]
async fn non_json_body_is_unavailable() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", QUERY_PATH)
        .with_status(502)
        .with_body("<html>bad gateway</html>")
        .create_async()
        .await;

    let (client, ctx) = managed(&server);
    let err = PostRepository::new(client.handle(&ctx).unwrap())
        .list_all()
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}

#[tokio::test]
async fn migrate_runs_every_statement() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", QUERY_PATH)
        .with_status(200)
        .with_body(
            json!({"success": true, "errors": [], "result": [{"success": true, "results": [], "meta": {"changes": 0}}]})
                .to_string(),
        )
        .expect(posts_store::db::MIGRATIONS.len())
        .create_async()
        .await;

    let (client, ctx) = managed(&server);
    client.migrate(&ctx).await.unwrap();
    mock.assert_async().await;
}
