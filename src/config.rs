use crate::common::constants::{
    CHRONICLE_ASIA_HOST, CHRONICLE_DEFAULT_REGION, CHRONICLE_EUROPE_HOST, CHRONICLE_LOG_TYPE,
    CHRONICLE_US_HOST, INSIGHTS_BASE_URL, INSIGHTS_DEFAULT_SCOPE, INSIGHTS_PULLING_LIMIT,
    INSIGHTS_TOKEN_URL,
};
use crate::common::error::{BridgeError, Result};
use std::fmt;
use std::str::FromStr;

pub const ENV_INSIGHTS_CLIENT_ID: &str = "INSIGHTS_CLIENT_ID";
pub const ENV_INSIGHTS_CLIENT_SECRET: &str = "INSIGHTS_CLIENT_SECRET";
pub const ENV_INSIGHTS_SCOPE: &str = "INSIGHTS_SCOPE";
pub const ENV_INSIGHTS_PULLING_LIMIT: &str = "INSIGHTS_PULLING_LIMIT";
pub const ENV_INSIGHTS_BASE_URL: &str = "INSIGHTS_BASE_URL";
pub const ENV_INSIGHTS_TOKEN_URL: &str = "INSIGHTS_TOKEN_URL";
pub const ENV_CHRONICLE_API_KEY: &str = "CHRONICLE_API_KEY";
pub const ENV_CHRONICLE_REGION: &str = "CHRONICLE_REGION";
pub const ENV_CHRONICLE_CUSTOMER_ID: &str = "CHRONICLE_CUSTOMER_ID";
pub const ENV_CHRONICLE_ENDPOINT: &str = "CHRONICLE_ENDPOINT";

/// Geographic Chronicle ingestion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Us,
    Europe,
    Asia,
}

impl Region {
    pub fn host(&self) -> &'static str {
        match self {
            Region::Us => CHRONICLE_US_HOST,
            Region::Europe => CHRONICLE_EUROPE_HOST,
            Region::Asia => CHRONICLE_ASIA_HOST,
        }
    }
}

impl FromStr for Region {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "us" | "malachite" => Ok(Region::Us),
            "europe" | "eu" => Ok(Region::Europe),
            "asia" => Ok(Region::Asia),
            other => Err(BridgeError::Config(format!(
                "unknown {ENV_CHRONICLE_REGION} '{other}' (expected us, europe or asia)"
            ))),
        }
    }
}

#[derive(Clone)]
pub struct InsightsConfig {
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub base_url: String,
    pub token_url: String,
    pub page_limit: u32,
}

// Secrets stay out of logs.
impl fmt::Debug for InsightsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsightsConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("page_limit", &self.page_limit)
            .finish()
    }
}

#[derive(Clone)]
pub struct ChronicleConfig {
    pub api_key: Option<String>,
    pub region: Region,
    pub customer_id: Option<String>,
    /// Scheme and host that replace the regional backend when set.
    pub endpoint: Option<String>,
    pub log_type: String,
}

impl ChronicleConfig {
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}", self.region.host()),
        }
    }
}

impl fmt::Debug for ChronicleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChronicleConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("customer_id", &self.customer_id)
            .field("endpoint", &self.endpoint)
            .field("log_type", &self.log_type)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub insights: InsightsConfig,
    pub chronicle: ChronicleConfig,
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| BridgeError::Config(format!("{key} must be set")))
        };

        let page_limit = match get(ENV_INSIGHTS_PULLING_LIMIT) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(BridgeError::Config(format!(
                        "{ENV_INSIGHTS_PULLING_LIMIT} must be a positive integer, got '{raw}'"
                    )))
                }
            },
            None => INSIGHTS_PULLING_LIMIT,
        };

        let insights = InsightsConfig {
            client_id: require(ENV_INSIGHTS_CLIENT_ID)?,
            client_secret: require(ENV_INSIGHTS_CLIENT_SECRET)?,
            scope: get(ENV_INSIGHTS_SCOPE).unwrap_or_else(|| INSIGHTS_DEFAULT_SCOPE.to_string()),
            base_url: get(ENV_INSIGHTS_BASE_URL)
                .unwrap_or_else(|| INSIGHTS_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token_url: get(ENV_INSIGHTS_TOKEN_URL).unwrap_or_else(|| INSIGHTS_TOKEN_URL.to_string()),
            page_limit,
        };

        let region = get(ENV_CHRONICLE_REGION)
            .unwrap_or_else(|| CHRONICLE_DEFAULT_REGION.to_string())
            .parse()?;

        let chronicle = ChronicleConfig {
            api_key: get(ENV_CHRONICLE_API_KEY),
            region,
            customer_id: get(ENV_CHRONICLE_CUSTOMER_ID),
            endpoint: get(ENV_CHRONICLE_ENDPOINT),
            log_type: CHRONICLE_LOG_TYPE.to_string(),
        };

        Ok(Config { insights, chronicle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config = Config::from_lookup(lookup(&[
            (ENV_INSIGHTS_CLIENT_ID, "id"),
            (ENV_INSIGHTS_CLIENT_SECRET, "secret"),
        ]))
        .unwrap();

        assert_eq!(config.insights.scope, "api.console");
        assert_eq!(config.insights.page_limit, 100);
        assert_eq!(config.insights.base_url, "https://console.redhat.com");
        assert_eq!(config.chronicle.region, Region::Us);
        assert_eq!(config.chronicle.api_key, None);
        assert_eq!(config.chronicle.log_type, "redhat_insights");
        assert_eq!(
            config.chronicle.base_url(),
            "https://malachiteingestion-pa.googleapis.com"
        );
    }

    #[test]
    fn missing_client_secret_is_rejected() {
        let err = Config::from_lookup(lookup(&[(ENV_INSIGHTS_CLIENT_ID, "id")])).unwrap_err();
        assert!(err.to_string().contains(ENV_INSIGHTS_CLIENT_SECRET));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let err = Config::from_lookup(lookup(&[
            (ENV_INSIGHTS_CLIENT_ID, "   "),
            (ENV_INSIGHTS_CLIENT_SECRET, "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn region_aliases_resolve_to_hosts() {
        assert_eq!("malachite".parse::<Region>().unwrap(), Region::Us);
        assert_eq!("EU".parse::<Region>().unwrap().host(), CHRONICLE_EUROPE_HOST);
        assert_eq!("asia".parse::<Region>().unwrap().host(), CHRONICLE_ASIA_HOST);
        assert!("mars".parse::<Region>().is_err());
    }

    #[test]
    fn invalid_limit_is_rejected() {
        for bad in ["0", "-5", "lots"] {
            let result = Config::from_lookup(lookup(&[
                (ENV_INSIGHTS_CLIENT_ID, "id"),
                (ENV_INSIGHTS_CLIENT_SECRET, "secret"),
                (ENV_INSIGHTS_PULLING_LIMIT, bad),
            ]));
            assert!(result.is_err(), "limit {bad} should be rejected");
        }
    }

    #[test]
    fn endpoint_override_wins_over_region() {
        let config = Config::from_lookup(lookup(&[
            (ENV_INSIGHTS_CLIENT_ID, "id"),
            (ENV_INSIGHTS_CLIENT_SECRET, "secret"),
            (ENV_CHRONICLE_REGION, "asia"),
            (ENV_CHRONICLE_ENDPOINT, "http://127.0.0.1:9999/"),
            (ENV_CHRONICLE_API_KEY, "key"),
        ]))
        .unwrap();
        assert_eq!(config.chronicle.base_url(), "http://127.0.0.1:9999");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = Config::from_lookup(lookup(&[
            (ENV_INSIGHTS_CLIENT_ID, "id"),
            (ENV_INSIGHTS_CLIENT_SECRET, "hunter2"),
            (ENV_CHRONICLE_API_KEY, "top-secret-key"),
        ]))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("top-secret-key"));
    }
}
