use crate::common::constants::USER_AGENT;
use crate::common::error::{BridgeError, Result};
use reqwest::Response;

/// Shared HTTP client for the source and the sink. Timeouts are reqwest defaults.
pub fn build_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    Ok(client)
}

/// Turns a non-2xx response into `BridgeError::Api`, keeping the body for the log.
pub async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().path().to_string();
    let body = resp.text().await.unwrap_or_default();
    Err(BridgeError::Api {
        status: status.as_u16(),
        message: format!("{url} returned {status}: {}", truncate(&body, 512)),
    })
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 100), "short");
    }
}
