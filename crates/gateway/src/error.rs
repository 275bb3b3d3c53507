use thiserror::Error;

/// Union error type the orchestrator returns. Every variant carries enough
/// to render a protocol-appropriate body without a central dispatch match
/// at the HTTP layer — callers ask `status_code()`/`code()`/`client_message()`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing or invalid model field")]
    ClientValidation(String),
    #[error("no active mapping for model")]
    ModelNotFound,
    #[error("no available provider")]
    NoAvailableProvider,
    #[error("protocol conversion failed: {0}")]
    ConversionError(String),
    #[error(transparent)]
    AllProvidersFailed(#[from] executor::ExecutorError),
    #[error("client disconnected")]
    ClientDisconnected,
}

impl GatewayError {
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::ClientValidation(_) => 400,
            GatewayError::ModelNotFound => 404,
            GatewayError::NoAvailableProvider => 503,
            GatewayError::ConversionError(_) => 400,
            GatewayError::AllProvidersFailed(err) => err.status_code(),
            GatewayError::ClientDisconnected => 499,
        }
    }

    /// Stable machine-readable code for the synthetic error bodies named
    /// in the error-handling design.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::ClientValidation(_) => "client_validation",
            GatewayError::ModelNotFound => "model_not_found",
            GatewayError::NoAvailableProvider => "no_available_provider",
            GatewayError::ConversionError(_) => "conversion_error",
            GatewayError::AllProvidersFailed(_) => "all_providers_failed",
            GatewayError::ClientDisconnected => "client_disconnected",
        }
    }

    pub fn client_message(&self) -> String {
        match self {
            GatewayError::ClientValidation(msg) => msg.clone(),
            GatewayError::ModelNotFound => "model not found".to_string(),
            GatewayError::NoAvailableProvider => "no available provider".to_string(),
            GatewayError::ConversionError(msg) => msg.clone(),
            GatewayError::AllProvidersFailed(err) => err.client_message(),
            GatewayError::ClientDisconnected => "client disconnected".to_string(),
        }
    }
}
