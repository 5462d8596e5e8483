//! HTTP retry with a fixed attempt budget.
//!
//! Dataset fetches go through [`send`] or [`send_text`] instead of
//! calling `reqwest::RequestBuilder::send()` directly, so every
//! request gets the same policy: up to [`MAX_ATTEMPTS`] attempts, a
//! fixed [`RETRY_DELAY`] between them, and a per-attempt timeout
//! ([`ATTEMPT_TIMEOUT`], installed on the client). Transient failures
//! (connection errors, timeouts, HTTP 429 and 5xx) are retried; other
//! 4xx statuses are permanent and fail immediately. When the budget
//! runs out, the *last* error is surfaced, not a generic one.

use std::time::Duration;

use crate::DatasetError;

/// Attempt budget for a single logical request.
pub const MAX_ATTEMPTS: u32 = 5;

/// Fixed delay between attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Per-attempt timeout, installed on the HTTP client by
/// [`crate::client`].
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Sends a request and returns the successful response.
///
/// The `build_request` closure is called on each attempt to construct
/// a fresh [`reqwest::RequestBuilder`], since builders are consumed by
/// `.send()`.
///
/// # Errors
///
/// Returns [`DatasetError`] when the request still fails on the last
/// attempt or the server answers with a permanent error status.
#[allow(clippy::future_not_send)]
pub async fn send<F>(build_request: F) -> Result<reqwest::Response, DatasetError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    send_inner(&build_request, MAX_ATTEMPTS, RETRY_DELAY).await
}

/// Sends a request and reads the response body as text.
///
/// Body-read failures (truncated response, connection reset mid-body)
/// count against the same attempt budget as connection failures.
///
/// # Errors
///
/// Returns [`DatasetError`] when the request or body read still fails
/// on the last attempt.
#[allow(clippy::future_not_send)]
pub async fn send_text<F>(build_request: F) -> Result<String, DatasetError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<DatasetError> = None;

    for attempt in 1..=MAX_ATTEMPTS {
        if attempt > 1 {
            log::warn!("  body retry {attempt}/{MAX_ATTEMPTS} in {RETRY_DELAY:?}...");
            tokio::time::sleep(RETRY_DELAY).await;
        }

        let response = send_inner(&build_request, MAX_ATTEMPTS, RETRY_DELAY).await?;
        let url = response.url().to_string();

        match response.text().await {
            Ok(text) => return Ok(text),
            Err(e) => {
                log::warn!("  body read failed for {url}: {e}");
                last_error = Some(DatasetError::Http(e));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| DatasetError::Download {
        message: "body read failed after all attempts".to_string(),
    }))
}

/// Core retry loop. Parameterized over budget and delay so tests can
/// run it without sleeping through the production schedule.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    build_request: &F,
    max_attempts: u32,
    delay: Duration,
) -> Result<reqwest::Response, DatasetError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<DatasetError> = None;

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            log::warn!("  retry {attempt}/{max_attempts} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_attempts {
                    log::warn!("  transient error: {e}");
                    last_error = Some(DatasetError::Http(e));
                    continue;
                }
                return Err(DatasetError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                // 429 and 5xx are worth another attempt.
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    let err = DatasetError::HttpStatus {
                        url: response.url().to_string(),
                        status: status.as_u16(),
                    };
                    if attempt < max_attempts {
                        log::warn!("  HTTP {status}");
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }

                // Other 4xx are permanent.
                if status.is_client_error() {
                    return Err(DatasetError::HttpStatus {
                        url: response.url().to_string(),
                        status: status.as_u16(),
                    });
                }

                return Ok(response);
            }
        }
    }

    // The loop always returns; this covers max_attempts == 0.
    Err(last_error.unwrap_or_else(|| DatasetError::Download {
        message: "request failed after all attempts".to_string(),
    }))
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

    /// Minimal HTTP server answering every request with `status` and
    /// `body`. Returns its URL and a hit counter.
    async fn serve(status: u16, body: &'static str) -> (String, Arc<AtomicU32>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0_u8; 1024];
                let _ = socket.read(&mut buf).await;
                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    _ => "Internal Server Error",
                };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        (format!("http://{addr}/dataset.geojson"), hits)
    }

    #[tokio::test]
    async fn success_returns_first_attempt() {
        let (url, hits) = serve(200, "{}").await;
        let client = reqwest::Client::new();
        let response = send_inner(&|| client.get(&url), 5, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_errors_exhaust_the_budget_and_surface_the_last_error() {
        let (url, hits) = serve(500, "").await;
        let client = reqwest::Client::new();
        let err = send_inner(&|| client.get(&url), 3, Duration::ZERO)
            .await
            .unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        match err {
            DatasetError::HttpStatus { status, .. } => assert_eq!(status, 500),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn client_errors_fail_without_retry() {
        let (url, hits) = serve(404, "").await;
        let client = reqwest::Client::new();
        let err = send_inner(&|| client.get(&url), 5, Duration::ZERO)
            .await
            .unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        match err {
            DatasetError::HttpStatus { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_retries_then_surfaces() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = reqwest::Client::new();
        let url = format!("http://{addr}/gone");
        let err = send_inner(&|| client.get(&url), 2, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::Http(_)));
    }
}
