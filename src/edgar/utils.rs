use anyhow::{anyhow, Result};
use reqwest::Client;
use url::Url;

use super::rate_limiter::RateLimiter;

/// GETs `url` and returns the body as text.
pub async fn fetch_text(
    client: &Client,
    url: &Url,
    user_agent: &str,
    rate_limiter: &RateLimiter,
) -> Result<String> {
    let _permit = rate_limiter
        .acquire()
        .await
        .map_err(|e| anyhow!("Rate limiter closed: {}", e))?;

    log::debug!("Fetching URL: {}", url);

    let response = client
        .get(url.as_str())
        .header(reqwest::header::USER_AGENT, user_agent)
        .header(reqwest::header::ACCEPT_ENCODING, "gzip, deflate")
        .send()
        .await?;

    log::debug!("Response status: {}", response.status());

    if !response.status().is_success() {
        return Err(anyhow!(
            "HTTP request for {} failed with status: {}",
            url,
            response.status()
        ));
    }

    let content = response.text().await?;
    log::debug!("Received content length: {}", content.len());

    Ok(content)
}
