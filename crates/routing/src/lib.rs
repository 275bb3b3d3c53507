//! Rule-based candidate selection: the rule engine (turns a model mapping
//! plus its provider mappings into an ordered candidate list) and the three
//! selection strategies that pick among them.

mod context;
mod engine;
mod error;
mod rule;
mod strategy;
mod types;

pub use context::RuleContext;
pub use engine::RuleEngine;
pub use error::RuleError;
pub use rule::{Logic, Operator, Rule, RuleSet};
pub use strategy::{CandidateIdentity, CostFirstStrategy, PriorityStrategy, RoundRobinStrategy, SelectionExtras, Strategy};
pub use types::{CandidateProvider, ModelMapping, Provider, ProviderMapping, ProviderProtocol, SelectionStrategy};

/// Builds the strategy implementation named by a `ModelMapping.strategy`.
pub fn strategy_for(selection: SelectionStrategy) -> Box<dyn Strategy> {
    match selection {
        SelectionStrategy::RoundRobin => Box::new(RoundRobinStrategy::new()),
        SelectionStrategy::Priority => Box::new(PriorityStrategy::new()),
        SelectionStrategy::CostFirst => Box::new(CostFirstStrategy::new()),
    }
}
