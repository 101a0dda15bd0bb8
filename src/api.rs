use reqwest::Client;
use tracing::info;

use crate::config::Config;
use crate::errors::Error;

/// Tells the backend to invalidate the current session.
///
/// Best-effort by contract: the caller logs failures and proceeds with local
/// teardown regardless of the outcome here.
pub(crate) async fn invalidate_session(
    http: &Client,
    config: &Config,
    token: &str,
) -> Result<(), Error> {
    let url = config.logout_url();
    let resp = http
        .post(&url)
        .header("Authorization", format!("Bearer {}", token))
        .header("Accept", "application/json")
        .timeout(config.request_timeout())
        .json(&serde_json::json!({}))
        .send()
        .await?;

    let status = resp.status();
    if status.is_success() {
        info!(status = %status, "session invalidated remotely");
        Ok(())
    } else {
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Api(status, body))
    }
}
