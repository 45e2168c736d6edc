//! Synchronous chain and end-of-chain behaviour over real sockets.

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::StatusCode;
use function_chain::config::InputMode;
use function_chain::http::X_REQUEST_ID;
use function_chain::HandlerError;

mod common;

#[tokio::test]
async fn test_end_of_chain_upload_returns_handler_output() {
    let (handler, seen) = common::recording_handler();
    let mut config = common::test_config();
    config.intake.mode = InputMode::File;
    config.response_content_type = "application/json".into();
    let chain = common::start_chain(config, handler).await;

    let res = common::client()
        .post(chain.url())
        .multipart(common::upload("data", "abc123", br#"{"x":1}"#))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.headers()[X_REQUEST_ID], "abc123");
    assert_eq!(&res.bytes().await.unwrap()[..], br#"handled:{"x":1}"#);
    assert_eq!(seen.lock().unwrap().as_slice(), &[br#"{"x":1}"#.to_vec()]);

    chain.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sync_forward_relays_next_hop_reply() {
    let mut hop = common::start_next_hop(StatusCode::OK, "text/html", false).await;
    let mut config = common::test_config();
    config.forward.address = Some(hop.url());
    let chain = common::start_chain(config, common::uppercase_handler()).await;

    let res = common::client()
        .post(chain.url())
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/html");
    let request_id = res.headers()[X_REQUEST_ID].to_str().unwrap().to_string();
    assert_eq!(&res.bytes().await.unwrap()[..], b"relayed:HELLO");

    let received = hop.next().await;
    assert_eq!(received.field, "data");
    assert_eq!(received.filename.as_deref(), Some(request_id.as_str()));
    assert_eq!(received.body, b"HELLO");

    chain.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sync_forward_unreachable_returns_500() {
    let mut config = common::test_config();
    config.forward.address = Some(common::unreachable_addr().await);
    let chain = common::start_chain(config, common::uppercase_handler()).await;

    let res = common::client()
        .post(chain.url())
        .body("payload")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    let text = res.text().await.unwrap();
    assert!(text.contains("transport failure"), "unexpected body: {text}");

    chain.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sync_forward_bad_status_returns_500() {
    let mut hop = common::start_next_hop(StatusCode::SERVICE_UNAVAILABLE, "text/plain", false).await;
    let mut config = common::test_config();
    config.forward.address = Some(hop.url());
    let chain = common::start_chain(config, common::uppercase_handler()).await;

    let res = common::client()
        .post(chain.url())
        .body("payload")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    let text = res.text().await.unwrap();
    assert!(text.contains("bad status: 503"), "unexpected body: {text}");
    assert_eq!(hop.next().await.body, b"PAYLOAD");

    chain.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_handler_error_returns_500_verbatim() {
    let failing = Arc::new(|_: &[u8]| -> Result<Vec<u8>, HandlerError> {
        Err("failed to parse data".into())
    });
    let chain = common::start_chain(common::test_config(), failing).await;

    let res = common::client()
        .post(chain.url())
        .body("not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), "failed to parse data");

    chain.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_missing_upload_field_returns_500() {
    let (handler, seen) = common::recording_handler();
    let mut config = common::test_config();
    config.intake.mode = InputMode::File;
    let chain = common::start_chain(config, handler).await;

    let res = common::client()
        .post(chain.url())
        .multipart(common::upload("file", "abc123", b"x"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    assert!(res.text().await.unwrap().contains("malformed multipart"));
    assert!(seen.lock().unwrap().is_empty());

    chain.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_raw_requests_get_unique_ids() {
    let chain = common::start_chain(common::test_config(), common::uppercase_handler()).await;
    let client = common::client();

    let requests = (0..50).map(|i| {
        let client = client.clone();
        let url = chain.url();
        async move {
            let res = client.post(url).body(format!("req-{i}")).send().await.unwrap();
            assert_eq!(res.status(), 200);
            res.headers()[X_REQUEST_ID].to_str().unwrap().to_string()
        }
    });
    let handles: Vec<_> = requests.map(tokio::spawn).collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 50);

    chain.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_two_hop_chain_carries_output_and_id() {
    let (tail_handler, tail_seen) = common::recording_handler();
    let mut tail_config = common::test_config();
    tail_config.intake.mode = InputMode::File;
    tail_config.response_content_type = "text/plain".into();
    let tail = common::start_chain(tail_config, tail_handler).await;

    let mut head_config = common::test_config();
    head_config.forward.address = Some(tail.url());
    let head = common::start_chain(head_config, common::uppercase_handler()).await;

    let res = common::client()
        .post(head.url())
        .body("chain me")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert_eq!(&res.bytes().await.unwrap()[..], b"handled:CHAIN ME");
    assert_eq!(tail_seen.lock().unwrap().as_slice(), &[b"CHAIN ME".to_vec()]);

    head.shutdown().await.unwrap();
    tail.shutdown().await.unwrap();
}
