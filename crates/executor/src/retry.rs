use crate::error::ExecutorError;
use crate::types::{ExecutionStats, ProviderResponse};
use routing::{CandidateIdentity, CandidateProvider, SelectionExtras, Strategy};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

/// Drives one request through the candidate sequence, retrying a 5xx
/// candidate up to `max_retries` times before failing over, and failing
/// over immediately on 4xx. `max_retries` of zero is treated as one.
pub async fn execute<F, Fut>(
    candidates: &[CandidateProvider],
    model: &str,
    strategy: &dyn Strategy,
    extras: SelectionExtras,
    max_retries: u32,
    retry_delay: Duration,
    forward_fn: F,
) -> Result<(CandidateProvider, ProviderResponse, ExecutionStats), ExecutorError>
where
    F: Fn(&CandidateProvider) -> Fut,
    Fut: Future<Output = ProviderResponse>,
{
    if candidates.is_empty() {
        return Err(ExecutorError::NoCandidates);
    }

    let max_retries = max_retries.max(1);
    let mut tried: HashSet<CandidateIdentity> = HashSet::new();
    let mut attempts: u32 = 0;
    let mut last_response: Option<ProviderResponse> = None;

    loop {
        let Some(candidate) = strategy.get_next(candidates, model, &tried, &extras) else {
            break;
        };

        let mut candidate_attempts = 0u32;
        loop {
            attempts += 1;
            candidate_attempts += 1;
            log::debug!(
                "executor: attempt {attempts} against provider={} target_model={}",
                candidate.provider_name,
                candidate.target_model
            );
            let response = forward_fn(&candidate).await;

            if response.is_success() {
                return Ok((
                    candidate,
                    response,
                    ExecutionStats { retry_count: attempts - 1, matched_provider_count: candidates.len() },
                ));
            }

            let retryable = response.is_server_error();
            let status = response.status_code;
            last_response = Some(response);

            if retryable && candidate_attempts < max_retries {
                log::warn!("executor: retrying candidate provider={} after status {status}", candidate.provider_name);
                tokio::time::sleep(retry_delay).await;
                continue;
            }
            if !retryable {
                log::warn!("executor: failing over from provider={} after status {status}", candidate.provider_name);
            }
            break;
        }

        tried.insert(candidate.identity_owned());
    }

    Err(ExecutorError::AllProvidersFailed { attempted: attempts as usize, last_response })
}

/// Streaming variant: `forward_fn` returns the initial `ProviderResponse`
/// (status/headers, known before any body bytes per §4.G) paired with the
/// chunk stream only when that initial response is a success. Once a
/// candidate's stream is handed back, no further failover happens — the
/// caller is responsible for surfacing mid-flight errors as protocol
/// events rather than calling back into the executor.
pub async fn execute_stream<F, Fut, S>(
    candidates: &[CandidateProvider],
    model: &str,
    strategy: &dyn Strategy,
    extras: SelectionExtras,
    max_retries: u32,
    retry_delay: Duration,
    forward_fn: F,
) -> Result<(CandidateProvider, ProviderResponse, S, ExecutionStats), ExecutorError>
where
    F: Fn(&CandidateProvider) -> Fut,
    Fut: Future<Output = (ProviderResponse, Option<S>)>,
{
    if candidates.is_empty() {
        return Err(ExecutorError::NoCandidates);
    }

    let max_retries = max_retries.max(1);
    let mut tried: HashSet<CandidateIdentity> = HashSet::new();
    let mut attempts: u32 = 0;
    let mut last_response: Option<ProviderResponse> = None;

    loop {
        let Some(candidate) = strategy.get_next(candidates, model, &tried, &extras) else {
            break;
        };

        let mut candidate_attempts = 0u32;
        loop {
            attempts += 1;
            candidate_attempts += 1;
            let (response, stream) = forward_fn(&candidate).await;

            if response.is_success() {
                if let Some(stream) = stream {
                    return Ok((
                        candidate,
                        response,
                        stream,
                        ExecutionStats { retry_count: attempts - 1, matched_provider_count: candidates.len() },
                    ));
                }
            }

            let retryable = response.is_server_error();
            let status = response.status_code;
            last_response = Some(response);

            if retryable && candidate_attempts < max_retries {
                tokio::time::sleep(retry_delay).await;
                continue;
            }
            if !retryable {
                log::warn!("executor: failing over stream candidate provider={} after status {status}", candidate.provider_name);
            }
            break;
        }

        tried.insert(candidate.identity_owned());
    }

    Err(ExecutorError::AllProvidersFailed { attempted: attempts as usize, last_response })
}
