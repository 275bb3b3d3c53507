//! Loads the demo routing table from TOML, playing the role a database
//! would in a real deployment of `ModelRepo`/`ProviderRepo`. Shaped after
//! the teacher's `config` crate, minus environment-variable expansion and
//! the MCP/telemetry/server sections this binary has no use for.

use anyhow::{Context, Result};
use gateway::GatewayConfig;
use gateway::memory::{InMemoryModelRepo, InMemoryProviderRepo};
use routing::{ModelMapping, Provider, ProviderMapping, ProviderProtocol, ProxyConfig, RuleSet, SelectionStrategy};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    pub gateway: GatewayConfig,
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
}

impl Default for NexusConfig {
    fn default() -> Self {
        Self { gateway: GatewayConfig::default(), providers: default_providers(), models: default_models() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub id: u64,
    pub name: String,
    pub base_url: String,
    pub protocol: ProviderProtocol,
    #[serde(default)]
    pub api_key: String,
    /// Outbound proxy URL this provider's traffic should route through,
    /// e.g. `proxy_url = "http://proxy.internal:8080"`.
    #[serde(default)]
    pub proxy_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub requested_model: String,
    #[serde(default = "default_strategy")]
    pub strategy: SelectionStrategy,
    pub providers: Vec<ProviderTargetConfig>,
    /// Gates the whole mapping, e.g. on a request header or body field,
    /// before any of its provider targets are even considered.
    #[serde(default)]
    pub rules: Option<RuleSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTargetConfig {
    pub mapping_id: u64,
    pub provider_id: u64,
    pub target_model_name: String,
    #[serde(default)]
    pub priority: u32,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub rules: Option<RuleSet>,
}

fn default_strategy() -> SelectionStrategy {
    SelectionStrategy::Priority
}

fn default_weight() -> u32 {
    1
}

/// A single demo Anthropic provider, so the binary answers requests out of
/// the box against `EchoSupplierClient` without any config file.
fn default_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig {
        id: 1,
        name: "demo-anthropic".to_string(),
        base_url: "https://api.anthropic.com".to_string(),
        protocol: ProviderProtocol::Anthropic,
        api_key: String::new(),
        proxy_url: None,
    }]
}

fn default_models() -> Vec<ModelConfig> {
    vec![ModelConfig {
        requested_model: "claude-sonnet-4".to_string(),
        strategy: SelectionStrategy::Priority,
        providers: vec![ProviderTargetConfig {
            mapping_id: 1,
            provider_id: 1,
            target_model_name: "claude-sonnet-4-20250514".to_string(),
            priority: 0,
            weight: 1,
            rules: None,
        }],
        rules: None,
    }]
}

pub fn load(path: Option<&Path>) -> Result<NexusConfig> {
    let config: NexusConfig = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => NexusConfig::default(),
    };
    config.validate_rules().context("validating routing rules")?;
    Ok(config)
}

impl NexusConfig {
    /// Checked once at startup rather than on every request: a mapping's
    /// `regex` rule with a pattern that doesn't compile is a config bug, not
    /// a per-request condition.
    fn validate_rules(&self) -> Result<(), routing::RuleError> {
        for model in &self.models {
            if let Some(rules) = &model.rules {
                rules.validate()?;
            }
            for target in &model.providers {
                if let Some(rules) = &target.rules {
                    rules.validate()?;
                }
            }
        }
        Ok(())
    }

    pub fn build_repos(&self) -> (InMemoryModelRepo, InMemoryProviderRepo) {
        let mut provider_repo = InMemoryProviderRepo::new();
        for provider in &self.providers {
            provider_repo = provider_repo.with_provider(Provider {
                id: provider.id,
                name: provider.name.clone(),
                base_url: provider.base_url.clone(),
                protocol: provider.protocol,
                api_key: provider.api_key.clone(),
                extra_headers: Vec::new(),
                proxy_config: provider.proxy_url.clone().map(|url| ProxyConfig { url }),
                is_active: true,
            });
        }

        let mut model_repo = InMemoryModelRepo::new();
        for model in &self.models {
            let mapping = ModelMapping {
                requested_model: model.requested_model.clone(),
                strategy: model.strategy,
                rules: model.rules.clone(),
                billing: None,
                is_active: true,
            };
            let provider_mappings = model
                .providers
                .iter()
                .map(|target| ProviderMapping {
                    id: target.mapping_id,
                    requested_model: model.requested_model.clone(),
                    provider_id: target.provider_id,
                    target_model_name: target.target_model_name.clone(),
                    rules: target.rules.clone(),
                    billing: None,
                    priority: target.priority,
                    weight: target.weight,
                    is_active: true,
                })
                .collect();
            model_repo = model_repo.with_mapping(mapping, provider_mappings);
        }

        (model_repo, provider_repo)
    }
}
