use crate::app::ports::EventSourcePort;
use crate::common::constants::{
    INSIGHTS_EVENTS_PATH, PARAM_END_DATE, PARAM_INCLUDE_PAYLOAD, PARAM_LIMIT, PARAM_START_DATE,
};
use crate::common::error::{BridgeError, Result};
use crate::common::types::{DateWindow, RawEvent};
use crate::config::InsightsConfig;
use crate::infra::http_client::ensure_success;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// One page of `/notifications/events`.
#[derive(Debug, Deserialize)]
struct EventsPage {
    #[serde(default)]
    data: Option<Vec<RawEvent>>,
    #[serde(default)]
    links: Option<PageLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct PageLinks {
    #[serde(default)]
    next: Option<String>,
}

/// Red Hat Insights notifications client: OAuth token plus paginated event fetch.
pub struct InsightsClient {
    client: reqwest::Client,
    config: InsightsConfig,
}

impl InsightsClient {
    pub fn new(client: reqwest::Client, config: InsightsConfig) -> Self {
        Self { client, config }
    }

    /// Client-credentials grant against the SSO token endpoint.
    #[instrument(skip(self))]
    pub async fn get_access_token(&self) -> Result<String> {
        let form = [
            ("grant_type", "client_credentials"),
            ("scope", self.config.scope.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        let resp = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await?;
        let token: TokenResponse = ensure_success(resp).await?.json().await?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BridgeError::MissingField("access_token not found in token response".into()))
    }

    pub fn first_page_url(&self, window: &DateWindow) -> Result<Url> {
        let raw = format!("{}{}", self.config.base_url, INSIGHTS_EVENTS_PATH);
        let mut url = parse_url(&raw)?;
        url.query_pairs_mut()
            .append_pair(PARAM_INCLUDE_PAYLOAD, "true")
            .append_pair(PARAM_LIMIT, &self.config.page_limit.to_string())
            .append_pair(PARAM_START_DATE, &window.start_param())
            .append_pair(PARAM_END_DATE, &window.end_param());
        Ok(url)
    }

    /// Resolves a `links.next` value against the base URL.
    ///
    /// The API drops the date filter from its next links, so the window's
    /// `startDate`/`endDate` are put back on every follow-up URL. Absolute
    /// links on another origin are re-based so the bearer token only goes
    /// to the configured host.
    pub fn next_page_url(&self, next: &str, window: &DateWindow) -> Result<Url> {
        let mut url = if next.starts_with("http://") || next.starts_with("https://") {
            let absolute = parse_url(next)?;
            let base = parse_url(&self.config.base_url)?;
            if absolute.origin() == base.origin() {
                absolute
            } else {
                warn!(
                    "Next link {} points outside {}, re-basing",
                    absolute.origin().ascii_serialization(),
                    base.origin().ascii_serialization()
                );
                let query = absolute.query().map(|q| format!("?{q}")).unwrap_or_default();
                parse_url(&format!("{}{}{}", self.config.base_url, absolute.path(), query))?
            }
        } else {
            parse_url(&format!("{}{}", self.config.base_url, next))?
        };

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != PARAM_START_DATE && k != PARAM_END_DATE)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(PARAM_START_DATE, &window.start_param())
            .append_pair(PARAM_END_DATE, &window.end_param());
        Ok(url)
    }

    async fn fetch_page(&self, url: &Url, token: &str) -> Result<EventsPage> {
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await?;
        let page = ensure_success(resp).await?.json().await?;
        Ok(page)
    }
}

#[async_trait]
impl EventSourcePort for InsightsClient {
    /// Walks every page for the window. Any failed page fails the whole fetch.
    #[instrument(skip(self, window), fields(window = %window))]
    async fn fetch_events(&self, window: &DateWindow) -> Result<Vec<RawEvent>> {
        let token = self.get_access_token().await?;

        let mut all_events = Vec::new();
        let mut next_url = Some(self.first_page_url(window)?);
        let mut pages = 0usize;

        while let Some(url) = next_url.take() {
            let page = self.fetch_page(&url, &token).await?;
            pages += 1;

            let events = page.data.unwrap_or_default();
            debug!("Page {} returned {} events", pages, events.len());
            all_events.extend(events);

            next_url = match page.links.unwrap_or_default().next {
                Some(next) if !next.is_empty() => Some(self.next_page_url(&next, window)?),
                _ => None,
            };
        }

        info!(
            "Fetched {} events for {} to {} across {} pages.",
            all_events.len(),
            window.start_param(),
            window.end_param(),
            pages
        );
        Ok(all_events)
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| BridgeError::Config(format!("invalid URL '{raw}': {e}")))
}
