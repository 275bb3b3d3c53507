use crate::billing::{BillingConfig, BillingMode, PriceSource, ResolvedBilling, apply_tier, resolve_billing, select_tier};
use crate::money::{Money, token_cost};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Must be `<= input_tokens`; caller is expected to have already clamped
    /// it, but `calculate_cost` clamps defensively too.
    pub cached_input_tokens: u64,
    /// Must be `<= output_tokens`; clamped defensively the same way.
    pub cached_output_tokens: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostBreakdown {
    pub input_cost: Money,
    pub output_cost: Money,
    pub cached_input_cost: Money,
    pub cached_output_cost: Money,
    pub total: Money,
}

/// Resolves provider-over-model billing fallback, then tier selection for
/// `token_tiered`, into one `ResolvedBilling` ready for `calculate_cost`.
pub fn resolve(
    model: Option<&BillingConfig>,
    provider: Option<&BillingConfig>,
    input_tokens: u64,
) -> (ResolvedBilling, PriceSource) {
    let (resolved, source) = resolve_billing(model, provider);

    if !matches!(resolved.mode, BillingMode::TokenTiered) {
        return (resolved, source);
    }

    let tiers = if resolved.is_provider_source {
        provider.and_then(|p| p.tiers.as_deref())
    } else {
        model.and_then(|m| m.tiers.as_deref())
    };

    match tiers.and_then(|tiers| select_tier(tiers, input_tokens)) {
        Some(tier) => (apply_tier(resolved, tier), source),
        None => (resolved, source),
    }
}

/// Dispatches on the resolved billing mode, then does the token-cost math
/// with cache-token splitting. `image_count` is only consulted for
/// `per_image` billing.
pub fn calculate_cost(resolved: &ResolvedBilling, tokens: TokenCounts, image_count: u32) -> CostBreakdown {
    match resolved.mode {
        BillingMode::PerRequest => {
            let total = Money::ceil4(resolved.per_request_price);
            CostBreakdown {
                input_cost: Money::ZERO,
                output_cost: Money::ZERO,
                cached_input_cost: Money::ZERO,
                cached_output_cost: Money::ZERO,
                total,
            }
        }
        BillingMode::PerImage => {
            let total = Money::ceil4(resolved.per_image_price) * rust_decimal::Decimal::from(image_count);
            CostBreakdown {
                input_cost: Money::ZERO,
                output_cost: Money::ZERO,
                cached_input_cost: Money::ZERO,
                cached_output_cost: Money::ZERO,
                total,
            }
        }
        BillingMode::TokenFlat | BillingMode::TokenTiered | BillingMode::InheritModelDefault => {
            token_based_cost(resolved, tokens)
        }
    }
}

fn token_based_cost(resolved: &ResolvedBilling, tokens: TokenCounts) -> CostBreakdown {
    let cached_input_tokens = tokens.cached_input_tokens.min(tokens.input_tokens);
    let cached_output_tokens = tokens.cached_output_tokens.min(tokens.output_tokens);

    if resolved.cache_billing_enabled && (cached_input_tokens > 0 || cached_output_tokens > 0) {
        let non_cached_input = tokens.input_tokens - cached_input_tokens;
        let cached_input_price = resolved.cached_input_price.unwrap_or(resolved.input_price);
        let non_cached_output = tokens.output_tokens - cached_output_tokens;
        let cached_output_price = resolved.cached_output_price.unwrap_or(resolved.output_price);

        let input_cost = token_cost(non_cached_input, resolved.input_price);
        let cached_input_cost = token_cost(cached_input_tokens, cached_input_price);
        let output_cost = token_cost(non_cached_output, resolved.output_price);
        let cached_output_cost = token_cost(cached_output_tokens, cached_output_price);

        let total = input_cost + cached_input_cost + output_cost + cached_output_cost;

        CostBreakdown {
            input_cost,
            output_cost,
            cached_input_cost,
            cached_output_cost,
            total,
        }
    } else {
        let input_cost = token_cost(tokens.input_tokens, resolved.input_price);
        let output_cost = token_cost(tokens.output_tokens, resolved.output_price);
        let total = input_cost + output_cost;

        CostBreakdown {
            input_cost,
            output_cost,
            cached_input_cost: Money::ZERO,
            cached_output_cost: Money::ZERO,
            total,
        }
    }
}
