use crate::types::CandidateProvider;
use pricing::{TokenCounts, calculate_cost, resolve};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

pub type CandidateIdentity = (u64, u64, String);

impl CandidateProvider {
    pub fn identity_owned(&self) -> CandidateIdentity {
        let (a, b, c) = self.identity();
        (a, b, c.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionExtras {
    pub input_tokens: Option<u64>,
    pub image_count: u32,
}

/// Shared interface for the three strategies. `select` picks the first
/// attempt; `get_next` is consulted on failover, given everything already
/// tried this request (by candidate identity, not provider id).
pub trait Strategy: Send + Sync {
    fn select(&self, candidates: &[CandidateProvider], model: &str, extras: &SelectionExtras) -> Option<CandidateProvider>;

    fn get_next(
        &self,
        candidates: &[CandidateProvider],
        model: &str,
        tried: &HashSet<CandidateIdentity>,
        extras: &SelectionExtras,
    ) -> Option<CandidateProvider>;
}

/// Per-`(strategy-instance, model)` monotonic counters. Increment-then-mod
/// is intentionally racy under contention (see concurrency model in
/// SPEC_FULL.md §5): no two concurrent selections are required to land on
/// different candidates, only to distribute approximately evenly overall.
#[derive(Debug, Default)]
struct Counters(Mutex<HashMap<String, AtomicU64>>);

impl Counters {
    fn next(&self, key: &str, modulus: usize) -> usize {
        if modulus == 0 {
            return 0;
        }
        let mut guard = self.0.lock().unwrap();
        let counter = guard.entry(key.to_string()).or_insert_with(|| AtomicU64::new(0));
        (counter.fetch_add(1, Ordering::Relaxed) as usize) % modulus
    }
}

#[derive(Debug, Default)]
pub struct RoundRobinStrategy {
    counters: Counters,
}

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotation shared by both `select` and failover: pick the next
    /// candidate after the counter's current position that isn't already
    /// in `tried`, scanning at most once around the list.
    fn next_untried(&self, candidates: &[CandidateProvider], model: &str, tried: &HashSet<CandidateIdentity>) -> Option<CandidateProvider> {
        if candidates.is_empty() {
            return None;
        }
        let start = self.counters.next(model, candidates.len());
        (0..candidates.len())
            .map(|offset| &candidates[(start + offset) % candidates.len()])
            .find(|c| !tried.contains(&c.identity_owned()))
            .cloned()
    }
}

impl Strategy for RoundRobinStrategy {
    fn select(&self, candidates: &[CandidateProvider], model: &str, _extras: &SelectionExtras) -> Option<CandidateProvider> {
        self.next_untried(candidates, model, &HashSet::new())
    }

    fn get_next(
        &self,
        candidates: &[CandidateProvider],
        model: &str,
        tried: &HashSet<CandidateIdentity>,
        _extras: &SelectionExtras,
    ) -> Option<CandidateProvider> {
        self.next_untried(candidates, model, tried)
    }
}

/// Buckets by `priority` ascending; round-robins within the lowest bucket
/// that still has an untried candidate, then falls through to the next
/// bucket.
#[derive(Debug, Default)]
pub struct PriorityStrategy {
    round_robin: RoundRobinStrategy,
}

impl PriorityStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn buckets(candidates: &[CandidateProvider]) -> Vec<(u32, Vec<CandidateProvider>)> {
        let mut by_priority: Vec<(u32, Vec<CandidateProvider>)> = Vec::new();
        for candidate in candidates {
            match by_priority.iter_mut().find(|(p, _)| *p == candidate.priority) {
                Some((_, bucket)) => bucket.push(candidate.clone()),
                None => by_priority.push((candidate.priority, vec![candidate.clone()])),
            }
        }
        by_priority.sort_by_key(|(priority, _)| *priority);
        by_priority
    }
}

impl Strategy for PriorityStrategy {
    fn select(&self, candidates: &[CandidateProvider], model: &str, extras: &SelectionExtras) -> Option<CandidateProvider> {
        self.get_next(candidates, model, &HashSet::new(), extras)
    }

    fn get_next(
        &self,
        candidates: &[CandidateProvider],
        model: &str,
        tried: &HashSet<CandidateIdentity>,
        extras: &SelectionExtras,
    ) -> Option<CandidateProvider> {
        for (priority, bucket) in Self::buckets(candidates) {
            let bucket_key = format!("{model}:priority:{priority}");
            if let Some(candidate) = self.round_robin.next_untried(&bucket, &bucket_key, tried) {
                return Some(candidate);
            }
            let _ = extras;
        }
        None
    }
}

/// Sorts candidates ascending by resolved cost, tie-breaking with
/// round-robin within the tie class. Without `input_tokens` the cost
/// can't be computed, so this falls back to priority order.
#[derive(Debug, Default)]
pub struct CostFirstStrategy {
    round_robin: RoundRobinStrategy,
    priority: PriorityStrategy,
}

impl CostFirstStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn ranked(&self, candidates: &[CandidateProvider], extras: &SelectionExtras) -> Vec<(pricing::Money, CandidateProvider)> {
        let input_tokens = extras.input_tokens.unwrap_or(0);
        let mut ranked: Vec<(pricing::Money, CandidateProvider)> = candidates
            .iter()
            .map(|c| {
                let (resolved, _) = resolve(c.model_billing.as_ref(), c.billing.as_ref(), input_tokens);
                let cost = calculate_cost(
                    &resolved,
                    TokenCounts {
                        input_tokens,
                        output_tokens: 0,
                        cached_input_tokens: 0,
                        cached_output_tokens: 0,
                    },
                    extras.image_count,
                )
                .total;
                (cost, c.clone())
            })
            .collect();
        ranked.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.priority.cmp(&b.1.priority)));
        ranked
    }
}

impl Strategy for CostFirstStrategy {
    fn select(&self, candidates: &[CandidateProvider], model: &str, extras: &SelectionExtras) -> Option<CandidateProvider> {
        self.get_next(candidates, model, &HashSet::new(), extras)
    }

    fn get_next(
        &self,
        candidates: &[CandidateProvider],
        model: &str,
        tried: &HashSet<CandidateIdentity>,
        extras: &SelectionExtras,
    ) -> Option<CandidateProvider> {
        if extras.input_tokens.is_none() {
            return self.priority.get_next(candidates, model, tried, extras);
        }

        let ranked = self.ranked(candidates, extras);
        let mut index = 0;
        while index < ranked.len() {
            let cost = ranked[index].0;
            let mut tie_class = Vec::new();
            while index < ranked.len() && ranked[index].0 == cost {
                tie_class.push(ranked[index].1.clone());
                index += 1;
            }
            let tie_key = format!("{model}:cost:{cost:?}");
            if let Some(candidate) = self.round_robin.next_untried(&tie_class, &tie_key, tried) {
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderProtocol;

    fn candidate(mapping_id: u64, provider_id: u64, priority: u32) -> CandidateProvider {
        CandidateProvider {
            mapping_id,
            provider_id,
            provider_name: format!("p{provider_id}"),
            base_url: "https://example.test".into(),
            protocol: ProviderProtocol::OpenAi,
            api_key: "sk".into(),
            extra_headers: vec![],
            proxy_config: None,
            target_model: format!("model-{mapping_id}"),
            priority,
            billing: None,
            model_billing: None,
        }
    }

    #[test]
    fn round_robin_selects_in_rotation() {
        let strategy = RoundRobinStrategy::new();
        let candidates = vec![candidate(1, 1, 0), candidate(2, 2, 0), candidate(3, 3, 0)];
        let extras = SelectionExtras::default();
        let first = strategy.select(&candidates, "gpt-4o", &extras).unwrap();
        let second = strategy.select(&candidates, "gpt-4o", &extras).unwrap();
        let third = strategy.select(&candidates, "gpt-4o", &extras).unwrap();
        let fourth = strategy.select(&candidates, "gpt-4o", &extras).unwrap();
        assert_eq!(fourth.mapping_id, first.mapping_id);
        assert_ne!(first.mapping_id, second.mapping_id);
        assert_ne!(second.mapping_id, third.mapping_id);
    }

    #[test]
    fn round_robin_failover_reaches_same_provider_different_target_model() {
        let strategy = RoundRobinStrategy::new();
        let mut a = candidate(1, 1, 0);
        a.target_model = "model-a".into();
        let mut b = candidate(2, 1, 0);
        b.target_model = "model-b".into();
        let candidates = vec![a.clone(), b.clone()];
        let mut tried = HashSet::new();
        tried.insert(a.identity_owned());
        let next = strategy.get_next(&candidates, "gpt-4o", &tried, &SelectionExtras::default()).unwrap();
        assert_eq!(next.target_model, "model-b");
    }

    #[test]
    fn round_robin_fairness_within_thirty_percent() {
        let strategy = RoundRobinStrategy::new();
        let candidates: Vec<_> = (0..4).map(|i| candidate(i, i, 0)).collect();
        let mut counts = HashMap::new();
        for _ in 0..100 {
            let picked = strategy.select(&candidates, "fair-model", &SelectionExtras::default()).unwrap();
            *counts.entry(picked.mapping_id).or_insert(0u32) += 1;
        }
        for count in counts.values() {
            assert!((17..=33).contains(count), "count {count} outside fairness band");
        }
    }

    #[test]
    fn priority_fails_over_to_next_bucket() {
        let strategy = PriorityStrategy::new();
        let high = candidate(1, 1, 0);
        let low = candidate(2, 2, 1);
        let candidates = vec![high.clone(), low.clone()];
        let mut tried = HashSet::new();
        tried.insert(high.identity_owned());
        let next = strategy.get_next(&candidates, "m", &tried, &SelectionExtras::default()).unwrap();
        assert_eq!(next.mapping_id, low.mapping_id);
    }

    #[test]
    fn cost_first_without_tokens_falls_back_to_priority() {
        let strategy = CostFirstStrategy::new();
        let high = candidate(1, 1, 0);
        let low = candidate(2, 2, 1);
        let candidates = vec![low.clone(), high.clone()];
        let picked = strategy.select(&candidates, "m", &SelectionExtras::default()).unwrap();
        assert_eq!(picked.mapping_id, high.mapping_id);
    }
}
