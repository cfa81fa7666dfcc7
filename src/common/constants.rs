/// Source and destination constants shared across the codebase.
/// Anything an operator may need to change lives in `config` instead.

// Red Hat Insights (source)
pub const INSIGHTS_BASE_URL: &str = "https://console.redhat.com";
pub const INSIGHTS_TOKEN_URL: &str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";
pub const INSIGHTS_EVENTS_PATH: &str = "/api/notifications/v1.0/notifications/events";
pub const INSIGHTS_DEFAULT_SCOPE: &str = "api.console";
pub const INSIGHTS_PULLING_LIMIT: u32 = 100;

// Query parameter names the events endpoint understands
pub const PARAM_INCLUDE_PAYLOAD: &str = "includePayload";
pub const PARAM_LIMIT: &str = "limit";
pub const PARAM_START_DATE: &str = "startDate";
pub const PARAM_END_DATE: &str = "endDate";

// Google Chronicle (destination)
pub const CHRONICLE_LOG_TYPE: &str = "redhat_insights";
pub const CHRONICLE_DEFAULT_REGION: &str = "malachite";
pub const CHRONICLE_US_HOST: &str = "malachiteingestion-pa.googleapis.com";
pub const CHRONICLE_EUROPE_HOST: &str = "malachiteingestion-eu.googleapis.com";
pub const CHRONICLE_ASIA_HOST: &str = "malachiteingestion-asia.googleapis.com";
pub const CHRONICLE_BATCH_CREATE_PATH: &str = "/v2/unstructuredlogentries:batchCreate";
pub const CHRONICLE_MAX_BATCH_ENTRIES: usize = 1000;
pub const CHRONICLE_MAX_BATCH_BYTES: usize = 950_000;
pub const CHRONICLE_SEND_ATTEMPTS: u32 = 3;

// Normalized log values
pub const VENDOR_NAME: &str = "Red Hat Insights";
pub const UNKNOWN_FIELD: &str = "Unknown";
pub const INVALID_PAYLOAD_MARKER: &str = "Invalid payload format";

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
