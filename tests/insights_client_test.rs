use chrono::NaiveDate;
use lightspeed_to_chronicle::app::ports::EventSourcePort;
use lightspeed_to_chronicle::common::error::BridgeError;
use lightspeed_to_chronicle::common::types::DateWindow;
use lightspeed_to_chronicle::config::InsightsConfig;
use lightspeed_to_chronicle::infra::insights_client::InsightsClient;
use mockito::{Matcher, Server};
use serde_json::json;

const EVENTS_PATH: &str = "/api/notifications/v1.0/notifications/events";

fn window() -> DateWindow {
    DateWindow {
        start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
    }
}

fn insights_client(server: &Server, page_limit: u32) -> InsightsClient {
    InsightsClient::new(
        reqwest::Client::new(),
        InsightsConfig {
            client_id: "my-client".into(),
            client_secret: "my-secret".into(),
            scope: "api.console".into(),
            base_url: server.url(),
            token_url: format!("{}/token", server.url()),
            page_limit,
        },
    )
}

async fn mock_token(server: &mut Server) -> mockito::Mock {
    server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
            Matcher::UrlEncoded("scope".into(), "api.console".into()),
            Matcher::UrlEncoded("client_id".into(), "my-client".into()),
            Matcher::UrlEncoded("client_secret".into(), "my-secret".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"access_token": "tok-123", "expires_in": 900}).to_string())
        .expect(1)
        .create_async()
        .await
}

#[tokio::test]
async fn test_pagination_follows_next_link_and_keeps_date_filter() {
    let mut server = Server::new_async().await;
    let token = mock_token(&mut server).await;

    let first_page = server
        .mock("GET", EVENTS_PATH)
        .match_header("authorization", "Bearer tok-123")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("includePayload".into(), "true".into()),
            Matcher::UrlEncoded("limit".into(), "2".into()),
            Matcher::UrlEncoded("startDate".into(), "2024-05-01".into()),
            Matcher::UrlEncoded("endDate".into(), "2024-05-02".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": [
                    {"id": "e1", "event_type": "Policy triggered"},
                    {"id": "e2", "event_type": "System became stale"}
                ],
                "links": {"next": format!("{EVENTS_PATH}?limit=2&offset=2")}
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let second_page = server
        .mock("GET", EVENTS_PATH)
        .match_header("authorization", "Bearer tok-123")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("offset".into(), "2".into()),
            Matcher::UrlEncoded("startDate".into(), "2024-05-01".into()),
            Matcher::UrlEncoded("endDate".into(), "2024-05-02".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": [{"id": "e3", "event_type": "New system registered"}],
                "links": {"next": null}
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let events = insights_client(&server, 2)
        .fetch_events(&window())
        .await
        .unwrap();

    let ids: Vec<&str> = events
        .iter()
        .filter_map(|e| e.raw_id().and_then(|id| id.as_str()))
        .collect();
    assert_eq!(ids, vec!["e1", "e2", "e3"]);

    token.assert_async().await;
    first_page.assert_async().await;
    second_page.assert_async().await;
}

#[tokio::test]
async fn test_missing_data_and_links_end_pagination() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server).await;

    let page = server
        .mock("GET", EVENTS_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let events = insights_client(&server, 100)
        .fetch_events(&window())
        .await
        .unwrap();

    assert!(events.is_empty());
    page.assert_async().await;
}

#[tokio::test]
async fn test_token_failure_aborts_before_fetching() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/token")
        .with_status(401)
        .with_body(r#"{"error":"invalid_client"}"#)
        .create_async()
        .await;
    let events = server
        .mock("GET", EVENTS_PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = insights_client(&server, 100)
        .fetch_events(&window())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Api { status: 401, .. }));
    events.assert_async().await;
}

#[tokio::test]
async fn test_token_response_without_access_token_is_an_error() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token_type":"Bearer"}"#)
        .create_async()
        .await;

    let err = insights_client(&server, 100)
        .get_access_token()
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::MissingField(_)));
}

#[tokio::test]
async fn test_failed_second_page_fails_the_whole_fetch() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server).await;

    let _first = server
        .mock("GET", EVENTS_PATH)
        .match_query(Matcher::UrlEncoded("includePayload".into(), "true".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": [{"id": "e1"}],
                "links": {"next": format!("{EVENTS_PATH}?offset=1")}
            })
            .to_string(),
        )
        .create_async()
        .await;
    let _second = server
        .mock("GET", EVENTS_PATH)
        .match_query(Matcher::UrlEncoded("offset".into(), "1".into()))
        .with_status(503)
        .with_body("unavailable")
        .expect(1)
        .create_async()
        .await;

    let err = insights_client(&server, 100)
        .fetch_events(&window())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_foreign_next_link_is_fetched_from_configured_host() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server).await;

    let _first = server
        .mock("GET", EVENTS_PATH)
        .match_query(Matcher::UrlEncoded("includePayload".into(), "true".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": [{"id": "e1"}],
                "links": {"next": format!("https://elsewhere.invalid{EVENTS_PATH}?offset=1")}
            })
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", EVENTS_PATH)
        .match_header("authorization", "Bearer tok-123")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("offset".into(), "1".into()),
            Matcher::UrlEncoded("startDate".into(), "2024-05-01".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"data": [{"id": "e2"}]}).to_string())
        .expect(1)
        .create_async()
        .await;

    let events = insights_client(&server, 100)
        .fetch_events(&window())
        .await
        .unwrap();

    assert_eq!(events.len(), 2);
    second.assert_async().await;
}
