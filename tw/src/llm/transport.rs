//! HTTP transport shared by the backend clients
//!
//! Transient failures are retried with exponential backoff; anything else is
//! surfaced as an [`LlmError`] on the first attempt.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::LlmError;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Upper bound on a server-requested retry-after wait
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt))
}

/// Build the shared HTTP client with the configured timeout
pub(crate) fn build_http(timeout: Duration) -> Result<Client, LlmError> {
    Client::builder().timeout(timeout).build().map_err(LlmError::Network)
}

/// POST a JSON body and decode the JSON reply, retrying transient failures
pub(crate) async fn post_json(
    http: &Client,
    url: &str,
    bearer: Option<&str>,
    body: &Value,
    timeout: Duration,
) -> Result<Value, LlmError> {
    debug!(%url, "post_json: called");
    let mut attempt = 0;

    loop {
        let error = match send_once(http, url, bearer, body, timeout, attempt).await {
            Ok(value) => {
                debug!(attempt, "post_json: success");
                return Ok(value);
            }
            Err(e) => e,
        };

        if !error.is_retryable() || attempt >= MAX_RETRIES {
            debug!(attempt, error = %error, "post_json: giving up");
            return Err(error);
        }

        let delay = error
            .retry_after()
            .map(|d| d.min(MAX_RETRY_AFTER))
            .unwrap_or_else(|| backoff(attempt));
        warn!(attempt, delay_ms = delay.as_millis() as u64, %url, error = %error, "post_json: retrying after transient error");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

async fn send_once(
    http: &Client,
    url: &str,
    bearer: Option<&str>,
    body: &Value,
    timeout: Duration,
    attempt: u32,
) -> Result<Value, LlmError> {
    let mut request = http.post(url).header("content-type", "application/json").json(body);
    if let Some(key) = bearer {
        request = request.header("Authorization", format!("Bearer {}", key));
    }

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            LlmError::Timeout(timeout)
        } else {
            LlmError::Network(e)
        }
    })?;

    let status = response.status().as_u16();

    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| backoff(attempt));
        debug!(?retry_after, "send_once: rate limited (429)");
        return Err(LlmError::RateLimited { retry_after });
    }

    if !response.status().is_success() {
        let message = response.text().await.unwrap_or_default();
        debug!(status, "send_once: API error");
        return Err(LlmError::ApiError { status, message });
    }

    Ok(response.json::<Value>().await?)
}

/// Parse a model reply that should be JSON, tolerating a fenced code block
pub(crate) fn parse_json_reply(text: &str) -> Result<Value, LlmError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(unfenced.trim())
        .map_err(|e| LlmError::InvalidResponse(format!("expected JSON reply: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response per connection, in order; the last one repeats
    async fn serve(responses: Vec<&'static str>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let reply = responses[n.min(responses.len() - 1)];
                read_request(&mut socket).await;
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (url, hits)
    }

    /// Drain headers and a content-length body so the client sees a clean exchange
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let Ok(n) = socket.read(&mut chunk).await else {
                return;
            };
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length").then(|| v.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    const RATE_LIMITED: &str =
        "HTTP/1.1 429 Too Many Requests\r\nretry-after: 0\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
    const OK: &str =
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 7\r\nconnection: close\r\n\r\n{\"a\":1}";
    const NOT_FOUND: &str =
        "HTTP/1.1 404 Not Found\r\ncontent-length: 7\r\nconnection: close\r\n\r\nmissing";

    async fn post(url: &str) -> Result<Value, LlmError> {
        let timeout = Duration::from_secs(5);
        let http = build_http(timeout).unwrap();
        post_json(&http, url, None, &serde_json::json!({"q": 1}), timeout).await
    }

    #[tokio::test]
    async fn test_post_json_retries_rate_limit() {
        let (url, hits) = serve(vec![RATE_LIMITED, OK]).await;

        let value = post(&url).await.unwrap();
        assert_eq!(value["a"], 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_post_json_gives_up_after_max_retries() {
        let (url, hits) = serve(vec![RATE_LIMITED]).await;

        let err = post(&url).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited { .. }));
        assert_eq!(hits.load(Ordering::SeqCst), MAX_RETRIES as usize + 1);
    }

    #[tokio::test]
    async fn test_post_json_client_error_not_retried() {
        let (url, hits) = serve(vec![NOT_FOUND, OK]).await;

        let err = post(&url).await.unwrap_err();
        assert!(matches!(err, LlmError::ApiError { status: 404, ref message } if message == "missing"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff(0), Duration::from_millis(1000));
        assert_eq!(backoff(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_parse_json_reply_plain_and_fenced() {
        assert_eq!(parse_json_reply(r#"{"a": 1}"#).unwrap()["a"], 1);
        assert_eq!(parse_json_reply("```json\n{\"a\": 2}\n```").unwrap()["a"], 2);
        assert_eq!(parse_json_reply("```\n[1, 2]\n```").unwrap()[1], 2);
    }

    #[test]
    fn test_parse_json_reply_rejects_prose() {
        let err = parse_json_reply("Sure! Here is the JSON").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
