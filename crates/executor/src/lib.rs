//! Retry/failover executor: drives one request through a candidate list,
//! retrying 5xx on the same candidate and failing over immediately on 4xx.
//! Pure orchestration — no HTTP client lives here, callers supply a
//! forwarding closure.

mod error;
mod retry;
mod types;

pub use error::ExecutorError;
pub use retry::{execute, execute_stream};
pub use types::{ExecutionStats, ProviderResponse, ResponseBody};

#[cfg(test)]
mod tests {
    use super::*;
    use routing::{CandidateProvider, ProviderProtocol, RoundRobinStrategy, SelectionExtras};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn candidate(mapping_id: u64, provider_id: u64, target_model: &str) -> CandidateProvider {
        CandidateProvider {
            mapping_id,
            provider_id,
            provider_name: format!("provider-{provider_id}"),
            base_url: "https://example.invalid".into(),
            protocol: ProviderProtocol::OpenAi,
            api_key: "key".into(),
            extra_headers: vec![],
            proxy_config: None,
            target_model: target_model.into(),
            priority: 0,
            billing: None,
            model_billing: None,
        }
    }

    fn status(code: u16) -> ProviderResponse {
        ProviderResponse {
            status_code: code,
            headers: HashMap::new(),
            body: None,
            error: None,
            first_byte_delay_ms: 0,
            total_time_ms: 0,
        }
    }

    #[tokio::test]
    async fn retry_exhaustion_across_three_candidates_makes_nine_attempts() {
        let candidates = vec![candidate(1, 1, "m"), candidate(2, 2, "m"), candidate(3, 3, "m")];
        let strategy = RoundRobinStrategy::new();
        let calls = AtomicUsize::new(0);

        let result = execute(&candidates, "m", &strategy, SelectionExtras::default(), 3, Duration::from_millis(0), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { status(500) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn failover_on_4xx_records_one_retry() {
        let candidates = vec![candidate(1, 1, "m"), candidate(2, 2, "m")];
        let strategy = RoundRobinStrategy::new();
        let calls = AtomicUsize::new(0);

        let (_, response, stats) = execute(&candidates, "m", &strategy, SelectionExtras::default(), 3, Duration::from_millis(0), |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n == 0 { status(401) } else { status(200) } }
        })
        .await
        .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(stats.retry_count, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn success_on_first_attempt_needs_no_retry() {
        let candidates = vec![candidate(1, 1, "m")];
        let strategy = RoundRobinStrategy::new();

        let (_, response, stats) =
            execute(&candidates, "m", &strategy, SelectionExtras::default(), 3, Duration::from_millis(0), |_| async { status(200) })
                .await
                .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(stats.retry_count, 0);
    }

    #[tokio::test]
    async fn all_providers_failed_carries_last_response() {
        let candidates = vec![candidate(1, 1, "m")];
        let strategy = RoundRobinStrategy::new();

        let err =
            execute(&candidates, "m", &strategy, SelectionExtras::default(), 1, Duration::from_millis(0), |_| async { status(503) })
                .await
                .unwrap_err();

        match err {
            ExecutorError::AllProvidersFailed { attempted, last_response } => {
                assert_eq!(attempted, 1);
                assert_eq!(last_response.unwrap().status_code, 503);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn streaming_failover_never_hands_back_a_failed_stream() {
        let candidates = vec![candidate(1, 1, "m"), candidate(2, 2, "m")];
        let strategy = RoundRobinStrategy::new();
        let calls = AtomicUsize::new(0);

        let (_, response, chunks, _) = execute_stream::<_, _, Vec<&'static str>>(
            &candidates,
            "m",
            &strategy,
            SelectionExtras::default(),
            1,
            Duration::from_millis(0),
            |_| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        (status(500), None)
                    } else {
                        (status(200), Some(vec!["chunk-1"]))
                    }
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(chunks, vec!["chunk-1"]);
    }
}
