use std::time::Duration;

use reqwest::StatusCode;

pub const MAX_RETRIES: u32 = 3;
const BACKOFF_SECONDS: &[u64] = &[5, 15, 30];

/// Both WakaTime and GitHub answer 429 when a client is going too fast.
pub fn is_rate_limited(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
}

/// How long to wait before retry number `attempt` (0-based).
pub fn backoff_delay(attempt: u32) -> Duration {
    let wait = BACKOFF_SECONDS
        .get(attempt as usize)
        .copied()
        .unwrap_or(30);
    Duration::from_secs(wait)
}

/// Sleep for the backoff duration, logging the retry.
pub async fn backoff_sleep(attempt: u32) {
    let wait = backoff_delay(attempt);
    log::warn!(
        "Rate limited (429). Waiting {}s before retry {}/{}",
        wait.as_secs(),
        attempt + 1,
        MAX_RETRIES
    );
    tokio::time::sleep(wait).await;
}

/// Send a request, retrying with backoff while the server answers 429.
///
/// Usage: `send_with_retry!(self.client.get(&url).basic_auth(user, pass))`
///
/// The expression is re-evaluated on each attempt since a `RequestBuilder`
/// is consumed by `send`. After the retries are spent the last 429 response
/// is returned to the caller like any other non-success response.
macro_rules! send_with_retry {
    ($builder:expr) => {{
        let mut _attempt: u32 = 0;
        loop {
            match $builder.send().await {
                Ok(response)
                    if $crate::sync::rate_limit::is_rate_limited(response.status())
                        && _attempt < $crate::sync::rate_limit::MAX_RETRIES =>
                {
                    $crate::sync::rate_limit::backoff_sleep(_attempt).await;
                    _attempt += 1;
                }
                other => break other,
            }
        }
    }};
}

pub(crate) use send_with_retry;
