//! Postgres store integration tests
//!
//! Need a running database (`TEST_DATABASE_URL`); run with
//! `cargo test -p unimarket-integration-tests --test postgres_store_test -- --ignored`.
//! Every test uses fresh ids, so no cleanup is required between runs.

mod common;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use unimarket_common::Error;
use unimarket_messaging::{
    EnsureConversation, Message, MessageStatus, MessagingService, MessagingStore, NewMessage,
    PgMessagingStore,
};

use common::{test_pool, unique_id};

async fn store() -> PgMessagingStore {
    let pool = test_pool().await.expect("test database unavailable");
    PgMessagingStore::new(pool)
}

async fn service() -> MessagingService {
    MessagingService::new(Arc::new(store().await), Duration::from_secs(5))
}

fn ensure(id: &str, buyer: &str, seller: &str, seed: Option<&str>) -> EnsureConversation {
    EnsureConversation {
        conversation_id: id.to_string(),
        buyer_id: buyer.to_string(),
        seller_id: seller.to_string(),
        book_title: Some("Calc I".to_string()),
        book_price: Some(Decimal::new(2550, 2)),
        seed_message: seed.map(str::to_string),
    }
}

fn reply(conversation: &str, sender: &str, receiver: &str, body: &str) -> NewMessage {
    NewMessage {
        conversation_id: conversation.to_string(),
        sender_id: sender.to_string(),
        receiver_id: receiver.to_string(),
        body: body.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_ensure_round_trips_through_postgres() {
    let service = service().await;
    let (id, buyer, seller) = (unique_id("c"), unique_id("u"), unique_id("u"));

    let created = service
        .ensure_conversation(ensure(&id, &buyer, &seller, Some("Is this still available?")))
        .await
        .unwrap();
    assert!(created.created);
    assert_eq!(created.conversation.book_price, Some(Decimal::new(2550, 2)));
    assert_eq!(created.messages.len(), 1);
    assert_eq!(created.messages[0].status, MessageStatus::Sent);

    let again = service
        .ensure_conversation(ensure(&id, &buyer, &seller, Some("Is this still available?")))
        .await
        .unwrap();
    assert!(!again.created);
    assert_eq!(again.messages.len(), 1);
    assert_eq!(again.messages[0].id, created.messages[0].id);

    let conflict = service
        .ensure_conversation(ensure(&id, &seller, &buyer, None))
        .await;
    assert!(matches!(conflict, Err(Error::Conflict(_))));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_concurrent_ensure_inserts_once() {
    let service = service().await;
    let (id, buyer, seller) = (unique_id("c"), unique_id("u"), unique_id("u"));

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let service = service.clone();
            let input = ensure(&id, &buyer, &seller, Some("first!"));
            tokio::spawn(async move { service.ensure_conversation(input).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let thread = handle.await.unwrap().unwrap();
        if thread.created {
            created += 1;
        }
        assert_eq!(thread.messages.len(), 1);
    }
    assert_eq!(created, 1);

    let messages = service.list_messages(&id, &buyer).await.unwrap();
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_send_read_and_unread_counts() {
    let service = service().await;
    let (id, buyer, seller) = (unique_id("c"), unique_id("u"), unique_id("u"));

    service
        .ensure_conversation(ensure(&id, &buyer, &seller, Some("Is this still available?")))
        .await
        .unwrap();
    let sent = service
        .send_message(reply(&id, &seller, &buyer, "Yes, still available"))
        .await
        .unwrap();

    let conversation = service.find_conversation(&id).await.unwrap().unwrap();
    assert!(conversation.last_message_at.unwrap() >= sent.created_at - chrono::Duration::milliseconds(1));

    assert_eq!(service.count_unread_for_user(&buyer).await.unwrap(), 1);
    assert_eq!(
        service.mark_delivered(sent.id).await.unwrap(),
        MessageStatus::Delivered
    );
    assert_eq!(service.mark_conversation_read(&id, &buyer).await.unwrap(), 1);
    assert_eq!(service.mark_conversation_read(&id, &buyer).await.unwrap(), 0);
    assert_eq!(
        service.mark_delivered(sent.id).await.unwrap(),
        MessageStatus::Read
    );

    assert_eq!(service.count_unread_for_user(&buyer).await.unwrap(), 0);
    assert_eq!(service.count_unread_for_user(&seller).await.unwrap(), 1);

    let summaries = service.list_conversations_for_user(&seller).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].other_participant_id, buyer);
    assert_eq!(summaries[0].other_participant_label, "buyer");
    assert_eq!(summaries[0].last_message, "Yes, still available");
    assert_eq!(summaries[0].unread_count, 1);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_send_to_missing_conversation_writes_nothing() {
    let service = service().await;
    let id = unique_id("missing");

    let result = service
        .send_message(reply(&id, &unique_id("u"), &unique_id("u"), "hello"))
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_messages_ordered_by_created_at_not_commit_order() {
    let store = store().await;
    let service = MessagingService::new(Arc::new(store.clone()), Duration::from_secs(5));
    let (id, buyer, seller) = (unique_id("c"), unique_id("u"), unique_id("u"));

    service
        .ensure_conversation(ensure(&id, &buyer, &seller, None))
        .await
        .unwrap();

    let mut first = Message::new(reply(&id, &buyer, &seller, "first")).unwrap();
    let second = Message::new(reply(&id, &seller, &buyer, "second")).unwrap();
    first.created_at = second.created_at - chrono::Duration::milliseconds(3);
    store.append_message(&second).await.unwrap();
    store.append_message(&first).await.unwrap();

    let bodies: Vec<String> = service
        .list_messages(&id, &buyer)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.body)
        .collect();
    assert_eq!(bodies, vec!["first", "second"]);

    let summaries = service.list_conversations_for_user(&buyer).await.unwrap();
    assert_eq!(summaries[0].last_message, "second");
}
