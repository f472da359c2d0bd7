//! End-to-end marketplace scenarios across the messaging API

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::common::{authed_request, parse_body, TestApp};

async fn unread(app: &TestApp, user: &str) -> i64 {
    let (status, body) = app
        .call(Method::GET, "/v1/messages/unread-count", user, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    body["unread_count"].as_i64().unwrap()
}

async fn summed_unread(app: &TestApp, user: &str) -> i64 {
    let (_, list) = app.call(Method::GET, "/v1/conversations", user, None).await;
    list.as_array()
        .unwrap()
        .iter()
        .map(|s| s["unread_count"].as_i64().unwrap())
        .sum()
}

#[tokio::test]
async fn test_buyer_seller_read_flow() {
    let app = TestApp::new();

    // (1) Buyer opens the conversation with an inquiry
    let (status, thread) = app
        .call(
            Method::POST,
            "/v1/conversations",
            "u1",
            Some(json!({
                "conversation_id": "c1",
                "buyer_id": "u1",
                "seller_id": "u2",
                "book_title": "Calc I",
                "seed_message": "Is this still available?"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(thread["messages"][0]["status"], "sent");

    // (2) Seller replies
    let (status, _) = app
        .call(
            Method::POST,
            "/v1/conversations/c1/messages",
            "u2",
            Some(json!({"body": "Yes, still available"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // (3) Buyer has the reply unread
    assert_eq!(unread(&app, "u1").await, 1);

    // (4) Buyer reads
    app.call(Method::POST, "/v1/conversations/c1/read", "u1", None)
        .await;

    // (5) Buyer is clear; the inquiry stays unread for the seller
    assert_eq!(unread(&app, "u1").await, 0);
    assert_eq!(unread(&app, "u2").await, 1);

    app.call(Method::POST, "/v1/conversations/c1/read", "u2", None)
        .await;
    assert_eq!(unread(&app, "u2").await, 0);
}

#[tokio::test]
async fn test_unread_count_equals_sum_of_summaries() {
    let app = TestApp::new();
    let conversations = [("c1", "u1", "u2"), ("c2", "u3", "u1"), ("c3", "u1", "u4")];
    for (id, buyer, seller) in conversations {
        app.call(
            Method::POST,
            "/v1/conversations",
            buyer,
            Some(json!({
                "conversation_id": id,
                "buyer_id": buyer,
                "seller_id": seller,
                "seed_message": "hello"
            })),
        )
        .await;
    }
    for (id, sender) in [("c1", "u2"), ("c1", "u2"), ("c3", "u4"), ("c3", "u1")] {
        app.call(
            Method::POST,
            &format!("/v1/conversations/{}/messages", id),
            sender,
            Some(json!({"body": "ping"})),
        )
        .await;
    }

    for user in ["u1", "u2", "u3", "u4", "u5"] {
        assert_eq!(unread(&app, user).await, summed_unread(&app, user).await);
    }
    assert_eq!(unread(&app, "u1").await, 4);

    app.call(Method::POST, "/v1/conversations/c1/read", "u1", None)
        .await;
    assert_eq!(unread(&app, "u1").await, 2);
    assert_eq!(summed_unread(&app, "u1").await, 2);
}

#[tokio::test]
async fn test_concurrent_ensure_creates_one_conversation() {
    let app = TestApp::new();
    let jwt = app.token("u1");
    let payload = json!({
        "conversation_id": "c-race",
        "buyer_id": "u1",
        "seller_id": "u2",
        "seed_message": "first!"
    });

    let requests = (0..24).map(|_| {
        let router = app.test_router();
        let req = authed_request(
            Method::POST,
            "/v1/conversations",
            &jwt,
            Some(payload.clone()),
        );
        tokio::spawn(async move {
            let resp = router.oneshot(req).await.unwrap();
            let status = resp.status();
            (status, parse_body(resp).await)
        })
    });

    let mut created = 0;
    for handle in requests.collect::<Vec<_>>() {
        let (status, body) = handle.await.unwrap();
        match status {
            StatusCode::CREATED => created += 1,
            StatusCode::OK => {}
            other => panic!("unexpected status {other}: {body}"),
        }
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    assert_eq!(created, 1);
    assert_eq!(app.store.conversation_count().await, 1);
    assert_eq!(app.store.message_count().await, 1);
}

#[tokio::test]
async fn test_concurrent_reads_converge() {
    let app = TestApp::new();
    app.call(
        Method::POST,
        "/v1/conversations",
        "u1",
        Some(json!({
            "conversation_id": "c1",
            "buyer_id": "u1",
            "seller_id": "u2",
            "seed_message": "one"
        })),
    )
    .await;
    for body in ["two", "three"] {
        app.call(
            Method::POST,
            "/v1/conversations/c1/messages",
            "u1",
            Some(json!({ "body": body })),
        )
        .await;
    }

    let (a, b) = tokio::join!(
        app.call(Method::POST, "/v1/conversations/c1/read", "u2", None),
        app.call(Method::POST, "/v1/conversations/c1/read", "u2", None),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(
        a.1["marked_read"].as_u64().unwrap() + b.1["marked_read"].as_u64().unwrap(),
        3
    );
    assert_eq!(unread(&app, "u2").await, 0);
}
