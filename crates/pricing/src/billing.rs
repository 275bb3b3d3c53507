use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    TokenFlat,
    TokenTiered,
    PerRequest,
    PerImage,
    /// Only meaningful on a provider-level config: discard all provider
    /// pricing and fall back to the model's billing config.
    InheritModelDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    /// `None` means "no upper bound"; tiers sort ascending with `None` last.
    pub max_input_tokens: Option<u64>,
    pub input_price: Decimal,
    pub output_price: Decimal,
    #[serde(default)]
    pub cached_input_price: Option<Decimal>,
    #[serde(default)]
    pub cached_output_price: Option<Decimal>,
}

/// A billing config as stored on a `ModelMapping` or `ProviderMapping`.
/// Every price field is a per-million-tokens rate unless the mode is
/// `PerRequest`/`PerImage`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default)]
    pub mode: Option<BillingMode>,
    #[serde(default)]
    pub input_price: Option<Decimal>,
    #[serde(default)]
    pub output_price: Option<Decimal>,
    #[serde(default)]
    pub cached_input_price: Option<Decimal>,
    #[serde(default)]
    pub cached_output_price: Option<Decimal>,
    #[serde(default)]
    pub cache_billing_enabled: bool,
    #[serde(default)]
    pub tiers: Option<Vec<PriceTier>>,
    #[serde(default)]
    pub per_request_price: Option<Decimal>,
    #[serde(default)]
    pub per_image_price: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    SupplierOverride,
    ModelFallback,
    DefaultZero,
}

/// The billing config actually in effect for one request, after resolving
/// the provider-over-model fallback and selecting a tier (if tiered).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBilling {
    pub mode: BillingMode,
    pub input_price: Decimal,
    pub output_price: Decimal,
    pub cached_input_price: Option<Decimal>,
    pub cached_output_price: Option<Decimal>,
    pub cache_billing_enabled: bool,
    pub per_request_price: Decimal,
    pub per_image_price: Decimal,
    pub is_provider_source: bool,
}

/// Implements the 4-step resolution order: a provider billing mode of
/// `inherit_model_default` nulls out all provider pricing, not just the
/// mode field, before falling through to the model config.
pub fn resolve_billing(model: Option<&BillingConfig>, provider: Option<&BillingConfig>) -> (ResolvedBilling, PriceSource) {
    let provider_inherits = matches!(
        provider.and_then(|p| p.mode),
        Some(BillingMode::InheritModelDefault)
    );

    if let Some(provider) = provider.filter(|_| !provider_inherits) {
        if let Some(mode) = provider.mode {
            return (resolve_from_config(mode, provider, true), PriceSource::SupplierOverride);
        }
    }

    if let Some(model) = model {
        if let Some(mode) = model.mode {
            return (resolve_from_config(mode, model, false), PriceSource::ModelFallback);
        }
    }

    (
        ResolvedBilling {
            mode: BillingMode::TokenFlat,
            input_price: Decimal::ZERO,
            output_price: Decimal::ZERO,
            cached_input_price: None,
            cached_output_price: None,
            cache_billing_enabled: false,
            per_request_price: Decimal::ZERO,
            per_image_price: Decimal::ZERO,
            is_provider_source: false,
        },
        PriceSource::DefaultZero,
    )
}

fn resolve_from_config(mode: BillingMode, config: &BillingConfig, is_provider_source: bool) -> ResolvedBilling {
    ResolvedBilling {
        mode,
        input_price: config.input_price.unwrap_or(Decimal::ZERO),
        output_price: config.output_price.unwrap_or(Decimal::ZERO),
        cached_input_price: config.cached_input_price,
        cached_output_price: config.cached_output_price,
        cache_billing_enabled: config.cache_billing_enabled,
        per_request_price: config.per_request_price.unwrap_or(Decimal::ZERO),
        per_image_price: config.per_image_price.unwrap_or(Decimal::ZERO),
        is_provider_source,
    }
}

/// Picks the first tier whose `max_input_tokens` is `None` or `>= input_tokens`,
/// after sorting ascending with `None` treated as infinity (sorts last). When
/// every tier has a cap below `input_tokens`, the last (highest) tier applies.
pub fn select_tier(tiers: &[PriceTier], input_tokens: u64) -> Option<&PriceTier> {
    if tiers.is_empty() {
        return None;
    }
    let mut sorted: Vec<&PriceTier> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.max_input_tokens.unwrap_or(u64::MAX));

    sorted
        .iter()
        .find(|t| t.max_input_tokens.is_none_or(|max| max >= input_tokens))
        .copied()
        .or_else(|| sorted.last().copied())
}

/// Applies a selected tier on top of a resolved config's global prices.
/// Per-tier cached prices override the global ones independently: a tier
/// that overrides `cached_input_price` but not `cached_output_price` still
/// inherits the global `cached_output_price`.
pub fn apply_tier(mut resolved: ResolvedBilling, tier: &PriceTier) -> ResolvedBilling {
    resolved.input_price = tier.input_price;
    resolved.output_price = tier.output_price;
    if tier.cached_input_price.is_some() {
        resolved.cached_input_price = tier.cached_input_price;
    }
    if tier.cached_output_price.is_some() {
        resolved.cached_output_price = tier.cached_output_price;
    }
    resolved
}
