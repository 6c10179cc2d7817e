mod common;

use axum::http::StatusCode;
use common::{FakeOllama, closed_endpoint};
use pictor::{ClientConfig, DescribeError, DescribeSession, ImageRecord, OllamaClient, SessionState};
use std::time::Duration;

fn session_for(endpoint: &str) -> DescribeSession<OllamaClient> {
    let client = OllamaClient::new(ClientConfig::default().with_endpoint(endpoint)).unwrap();
    DescribeSession::new(client)
}

async fn wait_for_requesting(session: &DescribeSession<OllamaClient>) {
    for _ in 0..200 {
        if session.state() == SessionState::Requesting {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session never entered Requesting");
}

#[tokio::test]
async fn only_one_request_in_flight() {
    let fake = FakeOllama::new(StatusCode::OK, r#"{"response":"A dog in the snow."}"#)
        .with_delay(Duration::from_millis(300));
    let session = session_for(&fake.spawn().await);
    session
        .load_image(ImageRecord::from_bytes(b"dog", "image/jpeg").unwrap())
        .unwrap();

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.describe().await }
    });
    wait_for_requesting(&session).await;

    let err = session.describe().await.unwrap_err();
    assert!(matches!(err, DescribeError::Validation(_)));
    assert!(session.reset().is_err());
    assert!(
        session
            .load_image(ImageRecord::from_bytes(b"cat", "image/png").unwrap())
            .is_err()
    );

    let description = first.await.unwrap().unwrap();
    assert_eq!(description, "A dog in the snow.");
    assert_eq!(session.state(), SessionState::Succeeded(description));
    assert_eq!(fake.requests().len(), 1);

    // finished sessions accept a new request
    session.describe().await.unwrap();
    assert_eq!(fake.requests().len(), 2);
}

#[tokio::test]
async fn connectivity_failure_returns_to_a_ready_state() {
    let session = session_for(&closed_endpoint().await);
    session
        .load_image(ImageRecord::from_bytes(b"dog", "image/jpeg").unwrap())
        .unwrap();

    let err = session.describe().await.unwrap_err();
    assert!(matches!(err, DescribeError::Connectivity { .. }));

    let state = session.state();
    assert_eq!(state, SessionState::Failed(err.user_message()));
    assert!(state.is_ready());
}

#[tokio::test]
async fn no_image_means_no_network_call() {
    let fake = FakeOllama::new(StatusCode::OK, r#"{"response":"A dog."}"#);
    let session = session_for(&fake.spawn().await);

    let err = session.describe().await.unwrap_err();
    assert!(matches!(err, DescribeError::Validation(_)));
    assert!(fake.requests().is_empty());
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn abandoned_request_does_not_wedge_the_session() {
    let fake = FakeOllama::new(StatusCode::OK, r#"{"response":"A slow dog."}"#)
        .with_delay(Duration::from_millis(500));
    let session = session_for(&fake.spawn().await);
    session
        .load_image(ImageRecord::from_bytes(b"dog", "image/jpeg").unwrap())
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_millis(100), session.describe()).await;
    assert!(outcome.is_err());
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert_eq!(
        session.state(),
        SessionState::Failed(pictor::CANCELLED_MESSAGE.to_string())
    );
    session.reset().unwrap();
    session
        .load_image(ImageRecord::from_bytes(b"dog", "image/jpeg").unwrap())
        .unwrap();
    let fast = session.describe().await.unwrap();
    assert_eq!(fast, "A slow dog.");
}
