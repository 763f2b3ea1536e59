//! Exponential backoff for idempotent Medusa reads.
//!
//! Only listing calls go through here. Creates, updates and deletes are sent
//! exactly once: a create that timed out may still have succeeded remotely.

use std::future::Future;
use std::time::Duration;

use crate::error::MedusaError;

/// Returns `true` if `err` is a transient condition worth retrying.
///
/// Retriable: timeouts, connection failures, HTTP 429 and 5xx. This is the
/// same policy the Directus reader applies.
///
/// Everything else (a body that failed to decode mid-stream, a builder
/// error) would fail identically on the next attempt.
pub(crate) fn is_retriable(err: &MedusaError) -> bool {
    match err {
        MedusaError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        MedusaError::Rejected { status, .. } => *status == 429 || (500..600).contains(status),
        MedusaError::Deserialize { .. }
        | MedusaError::InvalidBaseUrl { .. }
        | MedusaError::PaginationLimit { .. } => false,
    }
}

/// Executes `operation`, retrying transient errors up to `max_retries` times.
///
/// The wait before retry `n` (1-based) is `backoff_base_ms * 2^(n-1)` with
/// ±25 % jitter, capped at 30 s like the Directus reader.
///
/// | Attempt | Sleep before it (`backoff_base_ms = 500`) |
/// |---------|-------------------------------------------|
/// | 1       | none                                      |
/// | 2       | ~500 ms                                   |
/// | 3       | ~1 000 ms                                 |
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, MedusaError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MedusaError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let base = backoff_base_ms
            .saturating_mul(1u64 << attempt.min(10))
            .min(MAX_DELAY_MS);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let delay_ms = (base as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "transient Medusa error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rejected(status: u16) -> MedusaError {
        MedusaError::Rejected {
            method: "GET",
            url: "http://medusa.test/admin/products".to_owned(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn throttling_and_server_errors_are_retriable() {
        assert!(is_retriable(&rejected(429)));
        assert!(is_retriable(&rejected(500)));
        assert!(is_retriable(&rejected(503)));
    }

    #[test]
    fn validation_rejections_are_not_retriable() {
        assert!(!is_retriable(&rejected(400)));
        assert!(!is_retriable(&rejected(401)));
        assert!(!is_retriable(&rejected(404)));
    }

    #[tokio::test]
    async fn connection_failures_are_retriable() {
        // Nothing listens on port 1.
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/admin/products")
            .send()
            .await
            .expect_err("connection refused");
        assert!(is_retriable(&MedusaError::Http(err)));
    }

    #[tokio::test]
    async fn malformed_body_errors_are_not_retriable() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        let err = reqwest::get(server.uri())
            .await
            .expect("response")
            .json::<serde_json::Value>()
            .await
            .expect_err("body is not json");
        assert!(!is_retriable(&MedusaError::Http(err)));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, MedusaError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(rejected(502))
                } else {
                    Ok::<u32, MedusaError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(0, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(rejected(503))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }
}
