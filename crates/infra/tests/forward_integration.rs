//! Forwarder integration tests: mocked target calendar API in front of a
//! real SQLite store holding the source meetings.

use std::sync::Arc;

use linkcal_core::MeetingStore;
use linkcal_domain::{LinkedAccount, MeetingFields, NewMeeting, Provider};
use linkcal_infra::{CalendarConfig, Forwarder, ProviderEndpoints, SqliteMeetingStore, SqlitePool};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_config(server_uri: &str) -> CalendarConfig {
    let endpoints = ProviderEndpoints {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        token_url: format!("{server_uri}/token"),
        api_base: server_uri.to_string(),
    };
    CalendarConfig {
        google: endpoints.clone(),
        microsoft: endpoints,
        timeblock_marker: "linkcal timeblock".into(),
    }
}

fn account(id: &str) -> LinkedAccount {
    LinkedAccount {
        id: id.into(),
        user_id: "user-1".into(),
        provider: Provider::Google,
        email: format!("{id}@example.com"),
        display_name: None,
        color: None,
        refresh_token: "rt-initial".into(),
        last_synced: None,
        webhook_channel_id: None,
        webhook_resource_id: None,
        webhook_expiration: None,
    }
}

fn source_meeting(account: &LinkedAccount, external_event_id: &str, name: &str) -> NewMeeting {
    NewMeeting {
        user_id: account.user_id.clone(),
        linked_account_id: account.id.clone(),
        external_event_id: external_event_id.into(),
        provider: account.provider,
        fields: MeetingFields {
            name: name.into(),
            start_date: "2024-06-01T09:00:00Z".into(),
            end_date: "2024-06-01T10:00:00Z".into(),
            attendees: vec!["a@example.com".into()],
            location: "No location".into(),
            link: "No link".into(),
            message: "No description".into(),
            status: "confirmed".into(),
        },
    }
}

struct Fixture {
    _dir: TempDir,
    store: Arc<SqliteMeetingStore>,
    forwarder: Forwarder,
}

async fn setup(server: &MockServer) -> Fixture {
    let dir = TempDir::new().unwrap();
    let pool = SqlitePool::open(&dir.path().join("linkcal.db"), 2).unwrap();
    let store = Arc::new(SqliteMeetingStore::new(pool));

    store.insert_linked_account(&account("acct-source")).await.unwrap();
    store.insert_linked_account(&account("acct-target")).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-fresh",
        })))
        .mount(server)
        .await;

    let forwarder = Forwarder::new(store.clone(), mock_config(&server.uri()));
    Fixture { _dir: dir, store, forwarder }
}

async fn mount_empty_probe(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn creates_timeblocks_on_the_target_calendar() {
    let server = MockServer::start().await;
    let fx = setup(&server).await;
    fx.store
        .insert_meetings(&[
            source_meeting(&account("acct-source"), "ev-1", "Standup"),
            source_meeting(&account("acct-source"), "ev-2", "Planning"),
        ])
        .await
        .unwrap();

    mount_empty_probe(&server).await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(body_string_contains("Linkcal Timeblock | "))
        .and(body_string_contains("Meeting forwarded by Linkcal.io"))
        .and(body_string_contains("transparent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "created" })))
        .expect(2)
        .mount(&server)
        .await;

    let report = fx.forwarder.forward("acct-source", "acct-target").await.unwrap();
    assert_eq!(report.success, 2);
    assert_eq!(report.failure, 0);
}

#[tokio::test]
async fn existing_timeblock_skips_creation() {
    let server = MockServer::start().await;
    let fx = setup(&server).await;
    fx.store
        .insert_meetings(&[source_meeting(&account("acct-source"), "ev-1", "Standup")])
        .await
        .unwrap();

    // The probe finds a matching event already on the target calendar.
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "already-there" }],
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = fx.forwarder.forward("acct-source", "acct-target").await.unwrap();
    assert_eq!(report.success, 1);
    assert_eq!(report.failure, 0);
}

#[tokio::test]
async fn transient_create_failure_is_retried() {
    let server = MockServer::start().await;
    let fx = setup(&server).await;
    fx.store
        .insert_meetings(&[source_meeting(&account("acct-source"), "ev-1", "Standup")])
        .await
        .unwrap();

    mount_empty_probe(&server).await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "created" })))
        .expect(1)
        .mount(&server)
        .await;

    let report = fx.forwarder.forward("acct-source", "acct-target").await.unwrap();
    assert_eq!(report.success, 1);
    assert_eq!(report.failure, 0);
}

#[tokio::test]
async fn meetings_forwarded_from_the_target_are_skipped() {
    let server = MockServer::start().await;
    let fx = setup(&server).await;
    fx.store
        .insert_meetings(&[source_meeting(
            &account("acct-source"),
            "ev-1",
            "Busy (forwarded from acct-target)",
        )])
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = fx.forwarder.forward("acct-source", "acct-target").await.unwrap();
    assert_eq!(report.success, 0);
    assert_eq!(report.failure, 0);
}

#[tokio::test]
async fn unparseable_dates_count_as_failures() {
    let server = MockServer::start().await;
    let fx = setup(&server).await;

    let mut broken = source_meeting(&account("acct-source"), "ev-1", "Standup");
    broken.fields.start_date = "whenever".into();
    fx.store
        .insert_meetings(&[broken, source_meeting(&account("acct-source"), "ev-2", "Planning")])
        .await
        .unwrap();

    mount_empty_probe(&server).await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "created" })))
        .expect(1)
        .mount(&server)
        .await;

    let report = fx.forwarder.forward("acct-source", "acct-target").await.unwrap();
    assert_eq!(report.success, 1);
    assert_eq!(report.failure, 1);
}
