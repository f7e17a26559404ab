//! ゲートウェイ呼び出しの Integration Tests
//!
//! 署名済みボディの送信、監査ストアへの記録、失敗時の扱いを検証する

use crate::support::{
    client_with, config_for, received_bodies, unreachable_config, API_KEY, MERCHANT_ID,
};
use freekassa::db::schema::open_in_memory;
use freekassa::signature::md5_hex;
use freekassa::types::{CreateOrder, CreatePayout, OrderFilter, OrderStatus};
use freekassa::{CallStatus, FkError, FreeKassaClient, RequestLogStorage};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_ok(server: &MockServer, endpoint: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path(format!("/v1/{}", endpoint)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// 空のストアで残高を取得するとnonce=1のソート済みボディが送られ、1件記録される
#[tokio::test]
async fn test_balance_sends_sorted_signed_body_with_first_nonce() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/balance"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "success",
            "balance": [{"currency": "RUB", "value": "0.00"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_with(config_for(&server)).await;

    let response = client.gateway().balance().await.unwrap();
    assert!(response.is_success());
    assert_eq!(response.field("type").unwrap(), "success");

    let signature = md5_hex(&format!("1|{}|{}", MERCHANT_ID, API_KEY));
    let expected = format!(
        r#"{{"nonce":1,"shopId":{},"signature":"{}"}}"#,
        MERCHANT_ID, signature
    );
    assert_eq!(received_bodies(&server).await, vec![expected.clone()]);

    let records = client.storage().gateway_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].nonce, 1);
    assert_eq!(records[0].url, format!("{}/v1/balance", server.uri()));
    assert_eq!(records[0].request_body, expected);
    assert_eq!(records[0].status, CallStatus::Http(200));
    assert!(records[0].response_body.contains("success"));
}

/// 呼び出しごとにnonceが1ずつ進む
#[tokio::test]
async fn test_nonce_increments_per_call() {
    let server = MockServer::start().await;
    mount_ok(&server, "shops", json!({"type": "success", "shops": []})).await;
    mount_ok(&server, "currencies", json!({"type": "success", "currencies": []})).await;
    mount_ok(&server, "withdrawals/currencies", json!({"type": "success"})).await;
    mount_ok(&server, "currencies/6/status", json!({"type": "success"})).await;
    let client = client_with(config_for(&server)).await;

    client.gateway().shops().await.unwrap();
    client.gateway().currencies().await.unwrap();
    client.gateway().withdrawal_currencies().await.unwrap();
    client.gateway().currency_status(6).await.unwrap();

    let records = client.storage().gateway_records().await.unwrap();
    let nonces: Vec<i64> = records.iter().map(|r| r.nonce).collect();
    assert_eq!(nonces, vec![1, 2, 3, 4]);
    assert!(records[3].url.ends_with("/v1/currencies/6/status"));
    assert_eq!(client.storage().next_nonce().await.unwrap(), 5);
}

/// 注文作成: 必須・任意パラメータがソートされて署名される
#[tokio::test]
async fn test_create_order_body_contains_sorted_parameters() {
    let server = MockServer::start().await;
    mount_ok(
        &server,
        "orders/create",
        json!({"type": "success", "orderId": 1, "location": "https://pay.example/1"}),
    )
    .await;
    let client = client_with(config_for(&server)).await;

    let order = CreateOrder::new(6, "user@site.ru", "85.8.8.8".parse().unwrap(), 100.23, "RUB")
        .with_payment_id("987654321");
    let response = client.gateway().create_order(&order).await.unwrap();
    assert_eq!(response.field("location").unwrap(), "https://pay.example/1");

    let body: serde_json::Map<String, Value> =
        serde_json::from_str(&received_bodies(&server).await[0]).unwrap();
    let keys: Vec<&str> = body.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["amount", "currency", "email", "i", "ip", "nonce", "paymentId", "shopId", "signature"]
    );
    let line = format!(
        "100.23|RUB|user@site.ru|6|85.8.8.8|1|987654321|{}|{}",
        MERCHANT_ID, API_KEY
    );
    assert_eq!(body["signature"], json!(md5_hex(&line)));
}

/// 一覧系: 絞り込み条件がボディに含まれる
#[tokio::test]
async fn test_order_and_payout_lists_send_filters() {
    let server = MockServer::start().await;
    mount_ok(&server, "orders", json!({"type": "success", "orders": []})).await;
    mount_ok(&server, "withdrawals", json!({"type": "success", "orders": []})).await;
    mount_ok(&server, "withdrawals/create", json!({"type": "success", "data": {"id": 9}})).await;
    let client = client_with(config_for(&server)).await;

    let filter = OrderFilter {
        order_status: Some(OrderStatus::Paid),
        page: Some(2),
        ..Default::default()
    };
    client.gateway().orders(&filter).await.unwrap();
    client.gateway().payouts(&OrderFilter::default()).await.unwrap();
    client
        .gateway()
        .create_payout(&CreatePayout::new(6, "5500000000000004", 100.0, "RUB"))
        .await
        .unwrap();

    let bodies: Vec<Value> = received_bodies(&server)
        .await
        .iter()
        .map(|b| serde_json::from_str(b).unwrap())
        .collect();
    assert_eq!(bodies[0]["orderStatus"], json!(1));
    assert_eq!(bodies[0]["page"], json!(2));
    assert_eq!(bodies[0]["nonce"], json!(1));
    assert_eq!(bodies[1].as_object().unwrap().len(), 3);
    assert_eq!(bodies[2]["account"], json!("5500000000000004"));
    assert_eq!(bodies[2]["amount"], json!(100.0));
}

/// アプリケーションレベルの拒否はエラーではなく応答として返る
#[tokio::test]
async fn test_rejection_is_returned_as_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/balance"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"type": "error", "message": "Wrong signature"})),
        )
        .mount(&server)
        .await;
    let client = client_with(config_for(&server)).await;

    let response = client.gateway().balance().await.unwrap();
    assert_eq!(response.status, 401);
    assert!(!response.is_success());
    assert_eq!(response.field("message").unwrap(), "Wrong signature");

    let records = client.storage().gateway_records().await.unwrap();
    assert_eq!(records[0].status, CallStatus::Http(401));
}

/// JSONでない応答は解析エラーになるが、記録は残る
#[tokio::test]
async fn test_non_json_response_is_recorded_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/balance"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;
    let client = client_with(config_for(&server)).await;

    let err = client.gateway().balance().await.unwrap_err();
    assert!(matches!(err, FkError::InvalidResponse { status: 502, .. }));

    let records = client.storage().gateway_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].response_body, "<html>Bad Gateway</html>");
}

/// 接続エラー: 1件記録され、nonceは再利用されない
#[tokio::test]
async fn test_connection_error_is_recorded_and_nonce_consumed() {
    let client = client_with(unreachable_config()).await;
    let order = CreateOrder::new(6, "user@site.ru", "85.8.8.8".parse().unwrap(), 10.0, "RUB");

    let err = client.gateway().create_order(&order).await.unwrap_err();
    assert!(err.is_transport_failure());
    match &err {
        FkError::NoResponse { kind, message } => {
            assert_eq!(kind, "ConnectError");
            assert!(message.starts_with("ConnectError: "));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let records = client.storage().gateway_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].nonce, 1);
    assert_eq!(
        records[0].status,
        CallStatus::Failed("ConnectError".to_string())
    );
    assert!(records[0].response_body.starts_with("ConnectError: "));
    assert!(records[0].request_body.contains(r#""email":"user@site.ru""#));

    // 次の呼び出しは2を使う
    let _ = client.gateway().balance().await;
    let records = client.storage().gateway_records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].nonce, 2);
}

/// タイムアウトはトランスポート失敗として記録される
#[tokio::test]
async fn test_timeout_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/balance"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"type": "success"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    let config = config_for(&server).with_request_timeout(Duration::from_millis(200));
    let client = client_with(config).await;

    let err = client.gateway().balance().await.unwrap_err();
    assert!(matches!(&err, FkError::NoResponse { kind, .. } if kind == "TimedOut"));

    let records = client.storage().gateway_records().await.unwrap();
    assert_eq!(records[0].status, CallStatus::Failed("TimedOut".to_string()));
}

/// 監査ストアへの書き込み失敗は呼び出し元に伝わる
#[tokio::test]
async fn test_storage_failure_propagates() {
    let server = MockServer::start().await;
    mount_ok(&server, "balance", json!({"type": "success"})).await;

    let pool = open_in_memory().await.unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_gateway BEFORE INSERT ON gateway_requests \
         BEGIN SELECT RAISE(ABORT, 'audit log is read-only'); END",
    )
    .execute(&pool)
    .await
    .unwrap();
    let client =
        FreeKassaClient::with_storage(config_for(&server), RequestLogStorage::new(pool)).unwrap();

    let err = client.gateway().balance().await.unwrap_err();
    assert!(err.is_storage_failure());
    assert!(err.to_string().contains("audit log is read-only"));
    // リクエスト自体は送信済み
    assert_eq!(received_bodies(&server).await.len(), 1);
}

/// 記録に失敗したnonceも送信済みなので、次の呼び出しでは使わない
#[tokio::test]
async fn test_nonce_is_not_resent_after_storage_failure() {
    let server = MockServer::start().await;
    mount_ok(&server, "balance", json!({"type": "success"})).await;

    let pool = open_in_memory().await.unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_gateway BEFORE INSERT ON gateway_requests \
         BEGIN SELECT RAISE(ABORT, 'audit log is read-only'); END",
    )
    .execute(&pool)
    .await
    .unwrap();
    let client =
        FreeKassaClient::with_storage(config_for(&server), RequestLogStorage::new(pool.clone()))
            .unwrap();

    let err = client.gateway().balance().await.unwrap_err();
    assert!(err.is_storage_failure());

    sqlx::query("DROP TRIGGER reject_gateway")
        .execute(&pool)
        .await
        .unwrap();
    client.gateway().balance().await.unwrap();

    let wire_nonces: Vec<i64> = received_bodies(&server)
        .await
        .iter()
        .map(|b| serde_json::from_str::<Value>(b).unwrap()["nonce"].as_i64().unwrap())
        .collect();
    assert_eq!(wire_nonces, vec![1, 2]);

    let records = client.storage().gateway_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].nonce, 2);
    assert_eq!(client.storage().reserve_nonce().await.unwrap().nonce(), 3);
}

/// ストアを開き直してもnonceは戻らない
#[tokio::test]
async fn test_nonce_survives_restart() {
    let server = MockServer::start().await;
    mount_ok(&server, "balance", json!({"type": "success"})).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server).with_data_dir(dir.path());

    let first = FreeKassaClient::new(config.clone()).await.unwrap();
    first.gateway().balance().await.unwrap();
    first.gateway().balance().await.unwrap();
    first.storage().close().await;
    drop(first);

    let second = FreeKassaClient::new(config).await.unwrap();
    assert_eq!(second.storage().next_nonce().await.unwrap(), 3);
    second.gateway().balance().await.unwrap();

    let nonces: Vec<i64> = second
        .storage()
        .gateway_records()
        .await
        .unwrap()
        .iter()
        .map(|r| r.nonce)
        .collect();
    assert_eq!(nonces, vec![1, 2, 3]);
}

/// 同時に呼び出してもnonceは重複しない
#[tokio::test]
async fn test_concurrent_calls_get_unique_nonces() {
    let server = MockServer::start().await;
    mount_ok(&server, "balance", json!({"type": "success"})).await;
    let client = client_with(config_for(&server)).await;

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.gateway().balance().await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let nonces: Vec<i64> = client
        .storage()
        .gateway_records()
        .await
        .unwrap()
        .iter()
        .map(|r| r.nonce)
        .collect();
    assert_eq!(nonces, vec![1, 2, 3, 4, 5]);
}
