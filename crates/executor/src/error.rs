use crate::types::ProviderResponse;
use thiserror::Error;

/// Executor-local failure. `AllProvidersFailed` is the only variant the
/// orchestrator needs to turn into a client response itself; everything
/// else is a programming error (empty candidate list) the caller should
/// never hit once routing has produced at least one candidate.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("no candidates were supplied to the executor")]
    NoCandidates,
    #[error("all {attempted} candidate(s) failed")]
    AllProvidersFailed {
        attempted: usize,
        last_response: Option<ProviderResponse>,
    },
}

impl ExecutorError {
    pub fn status_code(&self) -> u16 {
        match self {
            ExecutorError::NoCandidates => 503,
            ExecutorError::AllProvidersFailed { last_response, .. } => {
                last_response.as_ref().map(|r| r.status_code).unwrap_or(503)
            }
        }
    }

    pub fn client_message(&self) -> String {
        match self {
            ExecutorError::NoCandidates => "no available provider".to_string(),
            ExecutorError::AllProvidersFailed { last_response, .. } => last_response
                .as_ref()
                .and_then(|r| r.error.clone())
                .unwrap_or_else(|| "all providers failed".to_string()),
        }
    }
}
