mod common;

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{harness, secs_since_epoch, token_expiring_in};
use trygg_session::{Clock, DEFAULT_EXPIRING_SOON_MINUTES, SessionStore, TokenResponse, storage};

#[tokio::test]
async fn default_collaborators_are_enough_to_build_and_run() {
    common::init_logging();
    let manager = trygg_session::SessionManager::builder(trygg_session::Config::from_values(
        common::UNREACHABLE_BASE_URL,
    ))
    .build()
    .expect("defaults build");

    assert!(manager.is_token_expiring_soon(DEFAULT_EXPIRING_SOON_MINUTES));
    assert!(!manager.has_valid_token());
    assert_eq!(manager.time_until_expiry(), None);
    assert_eq!(manager.current_token().await, None);
}

#[tokio::test]
async fn set_token_persists_the_decoded_expiry() {
    let h = harness(common::UNREACHABLE_BASE_URL);
    let token = token_expiring_in(&h.clock, Duration::from_secs(3600));
    h.manager.set_token(&token).await.expect("set_token");

    let stored_token = h.store.get(storage::AUTH_TOKEN_KEY).unwrap();
    assert_eq!(stored_token.as_deref(), Some(token.as_str()));

    let stored_millis: u64 = h
        .store
        .get(storage::TOKEN_EXPIRES_AT_KEY)
        .unwrap()
        .expect("expiry persisted")
        .parse()
        .unwrap();
    let expected_secs = secs_since_epoch(h.clock.now() + Duration::from_secs(3600));
    assert_eq!(stored_millis / 1000, expected_secs);
}

#[tokio::test]
async fn malformed_token_gets_the_two_hour_fallback() {
    let h = harness(common::UNREACHABLE_BASE_URL);
    h.manager
        .set_token("definitely-not-a-jwt")
        .await
        .expect("set_token never fails on malformed tokens");

    let stored_millis: u64 = h
        .store
        .get(storage::TOKEN_EXPIRES_AT_KEY)
        .unwrap()
        .expect("expiry persisted")
        .parse()
        .unwrap();
    let expected_secs = secs_since_epoch(h.clock.now() + Duration::from_secs(2 * 60 * 60));
    assert_eq!(stored_millis / 1000, expected_secs);
}

#[tokio::test]
async fn current_token_returns_the_fresh_credential() {
    let h = harness(common::UNREACHABLE_BASE_URL);
    let token = token_expiring_in(&h.clock, Duration::from_secs(3600));
    h.manager.set_token(&token).await.unwrap();
    assert_eq!(h.manager.current_token().await.as_deref(), Some(token.as_str()));
}

#[tokio::test]
async fn current_token_inside_the_slack_logs_out_and_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    let token = token_expiring_in(&h.clock, Duration::from_secs(3600));
    h.manager.set_token(&token).await.unwrap();

    h.clock.advance(Duration::from_secs(3600 - 20));
    assert_eq!(h.manager.current_token().await, None);
    assert!(h.manager.is_user_logged_out());
    assert_eq!(h.store.get(storage::AUTH_TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn check_token_expiry_logs_out_immediately_under_the_slack() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    let token = token_expiring_in(&h.clock, Duration::from_secs(20));
    h.manager.set_token(&token).await.unwrap();

    h.manager.check_token_expiry().await;
    assert!(h.manager.is_user_logged_out(), "logout must happen in the same call chain");
    assert!(h.notifier.has_title("Logged Out"));
}

#[tokio::test]
async fn check_token_expiry_without_a_record_is_a_no_op() {
    let h = harness(common::UNREACHABLE_BASE_URL);
    h.manager.check_token_expiry().await;
    assert!(!h.manager.is_user_logged_out());
    assert!(h.notifier.toasts().is_empty());
}

#[tokio::test]
async fn expiring_soon_flips_as_the_clock_walks_forward() {
    let h = harness(common::UNREACHABLE_BASE_URL);
    let token = token_expiring_in(&h.clock, Duration::from_secs(3600));
    h.manager.set_token(&token).await.unwrap();

    assert!(!h.manager.is_token_expiring_soon(DEFAULT_EXPIRING_SOON_MINUTES));
    h.clock.advance(Duration::from_secs(3570));
    assert!(h.manager.is_token_expiring_soon(DEFAULT_EXPIRING_SOON_MINUTES));
}

#[tokio::test]
async fn expiring_soon_without_a_record_is_true() {
    let h = harness(common::UNREACHABLE_BASE_URL);
    assert!(h.manager.is_token_expiring_soon(DEFAULT_EXPIRING_SOON_MINUTES));
}

#[tokio::test]
async fn valid_token_needs_more_than_two_minutes_of_life() {
    let h = harness(common::UNREACHABLE_BASE_URL);
    let token = token_expiring_in(&h.clock, Duration::from_secs(10 * 60));
    h.manager.set_token(&token).await.unwrap();
    assert!(h.manager.has_valid_token());

    h.clock.advance(Duration::from_secs(10 * 60 - 90));
    assert!(!h.manager.has_valid_token(), "90 seconds left is not valid");
}

#[tokio::test]
async fn time_until_expiry_rounds_to_whole_minutes() {
    let h = harness(common::UNREACHABLE_BASE_URL);
    assert_eq!(h.manager.time_until_expiry(), None);

    let token = token_expiring_in(&h.clock, Duration::from_secs(89 * 60 + 30));
    h.manager.set_token(&token).await.unwrap();
    assert_eq!(h.manager.time_until_expiry(), Some(90));

    h.clock.advance(Duration::from_secs(100 * 60));
    assert_eq!(h.manager.time_until_expiry(), Some(0), "never negative");
}

#[tokio::test]
async fn reset_then_set_token_resurrects_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    let token = token_expiring_in(&h.clock, Duration::from_secs(3600));
    h.manager.set_token(&token).await.unwrap();

    h.manager.logout().await;
    assert!(!h.manager.has_valid_token());
    assert_eq!(h.manager.time_until_expiry(), None);
    assert_eq!(h.manager.current_token().await, None);

    h.manager.reset_logout_state();
    assert!(!h.manager.is_user_logged_out());

    let fresh = token_expiring_in(&h.clock, Duration::from_secs(3600));
    h.manager.set_token(&fresh).await.unwrap();
    assert!(h.manager.has_valid_token());
    assert_eq!(h.manager.current_token().await.as_deref(), Some(fresh.as_str()));
}

#[tokio::test]
async fn save_tokens_requires_an_access_token() {
    let h = harness(common::UNREACHABLE_BASE_URL);

    let empty: TokenResponse = serde_json::from_str("{}").unwrap();
    assert!(h.manager.save_tokens(&empty).await.is_err());

    let token = token_expiring_in(&h.clock, Duration::from_secs(3600));
    let body = format!(r#"{{"accessToken":"{}"}}"#, token);
    let response: TokenResponse = serde_json::from_str(&body).unwrap();
    h.manager.save_tokens(&response).await.expect("save_tokens");
    assert!(h.manager.has_valid_token());
}

#[tokio::test]
async fn extend_session_alert_warns_only_when_close_to_expiry() {
    let h = harness(common::UNREACHABLE_BASE_URL);
    let token = token_expiring_in(&h.clock, Duration::from_secs(3600));
    h.manager.set_token(&token).await.unwrap();

    h.manager.extend_session_alert();
    assert!(!h.notifier.has_title("Session Expiring Soon"));

    h.clock.advance(Duration::from_secs(3600 - 20 * 60));
    h.manager.extend_session_alert();
    assert!(h.notifier.has_title("Session Expiring Soon"));
}
