use pricing::BillingConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    RoundRobin,
    Priority,
    CostFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderProtocol {
    OpenAi,
    Anthropic,
    Gemini,
}

/// The logical model record a client's `model` field resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMapping {
    pub requested_model: String,
    pub strategy: SelectionStrategy,
    pub rules: Option<crate::rule::RuleSet>,
    pub billing: Option<BillingConfig>,
    pub is_active: bool,
}

/// A (requested_model, provider) edge: one of potentially several ways to
/// fulfil a logical model.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderMapping {
    pub id: u64,
    pub requested_model: String,
    pub provider_id: u64,
    pub target_model_name: String,
    pub rules: Option<crate::rule::RuleSet>,
    pub billing: Option<BillingConfig>,
    pub priority: u32,
    pub weight: u32,
    pub is_active: bool,
}

/// An outbound HTTP(S) proxy the supplier client should route a provider's
/// traffic through, e.g. `http://proxy.internal:8080`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    pub id: u64,
    pub name: String,
    pub base_url: String,
    pub protocol: ProviderProtocol,
    pub api_key: String,
    pub extra_headers: Vec<(String, String)>,
    pub proxy_config: Option<ProxyConfig>,
    pub is_active: bool,
}

/// A runtime join of `ModelMapping` + `ProviderMapping` + `Provider` that
/// passed rule evaluation, carrying everything the executor needs to
/// forward one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProvider {
    pub mapping_id: u64,
    pub provider_id: u64,
    pub provider_name: String,
    pub base_url: String,
    pub protocol: ProviderProtocol,
    pub api_key: String,
    pub extra_headers: Vec<(String, String)>,
    pub proxy_config: Option<ProxyConfig>,
    pub target_model: String,
    pub priority: u32,
    pub billing: Option<BillingConfig>,
    pub model_billing: Option<BillingConfig>,
}

impl CandidateProvider {
    /// Identity used for tried-set bookkeeping during failover: two
    /// mappings that share a provider but target different models must be
    /// independently reachable (see property 8).
    pub fn identity(&self) -> (u64, u64, &str) {
        (self.mapping_id, self.provider_id, self.target_model.as_str())
    }
}
