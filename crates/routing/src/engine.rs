use crate::context::RuleContext;
use crate::types::{CandidateProvider, ModelMapping, Provider, ProviderMapping};
use std::collections::HashMap;

/// Evaluates rules for one model mapping against its provider mappings,
/// producing the ordered candidate list the executor will walk.
#[derive(Debug, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// A provider mapping becomes a candidate when it (a) is active, (b)
    /// references an active provider that is actually present in
    /// `providers`, and (c) satisfies its own ruleset in `ctx`. A provider
    /// id absent from `providers` is treated like an inactive provider,
    /// not an error — the repository join is expected to be consistent,
    /// but a dangling reference must not crash routing.
    pub fn evaluate(
        &self,
        model_mapping: &ModelMapping,
        provider_mappings: &[ProviderMapping],
        providers: &HashMap<u64, Provider>,
        ctx: &RuleContext,
    ) -> Vec<CandidateProvider> {
        if !model_mapping.is_active {
            return Vec::new();
        }

        let mut candidates: Vec<CandidateProvider> = provider_mappings
            .iter()
            .filter(|mapping| mapping.is_active)
            .filter(|mapping| mapping.requested_model == model_mapping.requested_model)
            .filter_map(|mapping| {
                let provider = providers.get(&mapping.provider_id)?;
                if !provider.is_active {
                    return None;
                }
                let admitted = mapping.rules.as_ref().is_none_or(|rules| rules.evaluate(ctx));
                if !admitted {
                    return None;
                }
                Some(CandidateProvider {
                    mapping_id: mapping.id,
                    provider_id: provider.id,
                    provider_name: provider.name.clone(),
                    base_url: provider.base_url.clone(),
                    protocol: provider.protocol,
                    api_key: provider.api_key.clone(),
                    extra_headers: provider.extra_headers.clone(),
                    proxy_config: provider.proxy_config.clone(),
                    target_model: mapping.target_model_name.clone(),
                    priority: mapping.priority,
                    billing: mapping.billing.clone(),
                    model_billing: model_mapping.billing.clone(),
                })
            })
            .collect();

        candidates.sort_by_key(|c| (c.priority, c.mapping_id));
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Logic, Operator, Rule, RuleSet};
    use crate::types::{ProviderProtocol, SelectionStrategy};

    fn provider(id: u64, active: bool) -> Provider {
        Provider {
            id,
            name: format!("provider-{id}"),
            base_url: "https://example.test".into(),
            protocol: ProviderProtocol::OpenAi,
            api_key: "sk-test".into(),
            extra_headers: vec![],
            proxy_config: None,
            is_active: active,
        }
    }

    fn mapping(id: u64, provider_id: u64, priority: u32, rules: Option<RuleSet>) -> ProviderMapping {
        ProviderMapping {
            id,
            requested_model: "gpt-4o".into(),
            provider_id,
            target_model_name: format!("upstream-{provider_id}"),
            rules,
            billing: None,
            priority,
            weight: 1,
            is_active: true,
        }
    }

    fn model() -> ModelMapping {
        ModelMapping {
            requested_model: "gpt-4o".into(),
            strategy: SelectionStrategy::RoundRobin,
            rules: None,
            billing: None,
            is_active: true,
        }
    }

    #[test]
    fn inactive_provider_is_excluded() {
        let providers = HashMap::from([(1, provider(1, false))]);
        let mappings = vec![mapping(1, 1, 0, None)];
        let candidates = RuleEngine::new().evaluate(&model(), &mappings, &providers, &RuleContext::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn dangling_provider_reference_is_skipped_not_fatal() {
        let providers = HashMap::new();
        let mappings = vec![mapping(1, 1, 0, None)];
        let candidates = RuleEngine::new().evaluate(&model(), &mappings, &providers, &RuleContext::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn same_provider_different_target_model_both_returned() {
        let providers = HashMap::from([(1, provider(1, true))]);
        let mappings = vec![mapping(1, 1, 0, None), mapping(2, 1, 0, None)];
        let candidates = RuleEngine::new().evaluate(&model(), &mappings, &providers, &RuleContext::default());
        assert_eq!(candidates.len(), 2);
        assert_ne!(candidates[0].target_model, candidates[1].target_model);
    }

    #[test]
    fn sorted_by_priority_then_mapping_id() {
        let providers = HashMap::from([(1, provider(1, true)), (2, provider(2, true))]);
        let mappings = vec![mapping(2, 2, 1, None), mapping(1, 1, 0, None)];
        let candidates = RuleEngine::new().evaluate(&model(), &mappings, &providers, &RuleContext::default());
        assert_eq!(candidates[0].mapping_id, 1);
        assert_eq!(candidates[1].mapping_id, 2);
    }

    #[test]
    fn failing_provider_ruleset_excludes_candidate() {
        let providers = HashMap::from([(1, provider(1, true))]);
        let ruleset = RuleSet {
            rules: vec![Rule {
                field: "headers.x-beta".into(),
                operator: Operator::Exists,
                value: serde_json::Value::Bool(true),
            }],
            logic: Logic::And,
        };
        let mappings = vec![mapping(1, 1, 0, Some(ruleset))];
        let candidates = RuleEngine::new().evaluate(&model(), &mappings, &providers, &RuleContext::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn inactive_model_mapping_yields_no_candidates() {
        let providers = HashMap::from([(1, provider(1, true))]);
        let mut model = model();
        model.is_active = false;
        let mappings = vec![mapping(1, 1, 0, None)];
        let candidates = RuleEngine::new().evaluate(&model, &mappings, &providers, &RuleContext::default());
        assert!(candidates.is_empty());
    }
}
