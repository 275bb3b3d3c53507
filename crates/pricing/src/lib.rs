//! Pure cost resolution: provider-over-model billing fallback, tiered
//! pricing, and decimal cost arithmetic. Nothing here suspends or touches
//! the network; the orchestrator feeds it token counts it already has.

mod billing;
mod cost;
mod money;

pub use billing::{BillingConfig, BillingMode, PriceSource, PriceTier, ResolvedBilling, resolve_billing, select_tier};
pub use cost::{CostBreakdown, TokenCounts, calculate_cost, resolve};
pub use money::Money;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flat(input: &str, output: &str) -> BillingConfig {
        BillingConfig {
            mode: Some(BillingMode::TokenFlat),
            input_price: Some(input.parse().unwrap()),
            output_price: Some(output.parse().unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn provider_override_wins_over_model() {
        let model = flat("1.00", "2.00");
        let provider = flat("0.50", "1.00");
        let (resolved, source) = resolve(Some(&model), Some(&provider), 1_000);
        assert_eq!(source, PriceSource::SupplierOverride);
        assert_eq!(resolved.input_price, dec!(0.50));
    }

    #[test]
    fn inherit_model_default_discards_provider_pricing() {
        let model = flat("1.00", "2.00");
        let provider = BillingConfig {
            mode: Some(BillingMode::InheritModelDefault),
            input_price: Some(dec!(99.0)),
            ..Default::default()
        };
        let (resolved, source) = resolve(Some(&model), Some(&provider), 1_000);
        assert_eq!(source, PriceSource::ModelFallback);
        assert_eq!(resolved.input_price, dec!(1.00));
    }

    #[test]
    fn no_billing_configured_defaults_to_zero() {
        let (resolved, source) = resolve(None, None, 1_000);
        assert_eq!(source, PriceSource::DefaultZero);
        assert_eq!(resolved.input_price, Decimal::ZERO);
    }

    use rust_decimal::Decimal;

    #[test]
    fn tier_selection_picks_first_fitting_ascending() {
        let tiers = vec![
            PriceTier {
                max_input_tokens: Some(1_000),
                input_price: dec!(1.0),
                output_price: dec!(2.0),
                cached_input_price: None,
                cached_output_price: None,
            },
            PriceTier {
                max_input_tokens: None,
                input_price: dec!(0.5),
                output_price: dec!(1.0),
                cached_input_price: None,
                cached_output_price: None,
            },
        ];
        let tier = select_tier(&tiers, 500).unwrap();
        assert_eq!(tier.input_price, dec!(1.0));
        let tier = select_tier(&tiers, 5_000).unwrap();
        assert_eq!(tier.input_price, dec!(0.5));
    }

    #[test]
    fn tier_cached_output_price_inherits_global_when_not_overridden() {
        let model = BillingConfig {
            mode: Some(BillingMode::TokenTiered),
            cached_output_price: Some(dec!(3.0)),
            tiers: Some(vec![PriceTier {
                max_input_tokens: None,
                input_price: dec!(1.0),
                output_price: dec!(2.0),
                cached_input_price: Some(dec!(0.1)),
                cached_output_price: None,
            }]),
            ..Default::default()
        };
        let (resolved, _) = resolve(Some(&model), None, 10);
        assert_eq!(resolved.cached_input_price, Some(dec!(0.1)));
        assert_eq!(resolved.cached_output_price, Some(dec!(3.0)));
    }

    #[test]
    fn cost_is_monotone_in_tokens() {
        let billing = flat("1.00", "2.00");
        let (resolved, _) = resolve(Some(&billing), None, 100);
        let low = calculate_cost(
            &resolved,
            TokenCounts {
                input_tokens: 100,
                output_tokens: 100,
                cached_input_tokens: 0,
                cached_output_tokens: 0,
            },
            0,
        );
        let high = calculate_cost(
            &resolved,
            TokenCounts {
                input_tokens: 200,
                output_tokens: 100,
                cached_input_tokens: 0,
                cached_output_tokens: 0,
            },
            0,
        );
        assert!(high.total >= low.total);
    }

    #[test]
    fn cost_is_quantized_to_four_decimals() {
        let billing = flat("3.333333", "7.777777");
        let (resolved, _) = resolve(Some(&billing), None, 777);
        let breakdown = calculate_cost(
            &resolved,
            TokenCounts {
                input_tokens: 777,
                output_tokens: 333,
                cached_input_tokens: 0,
                cached_output_tokens: 0,
            },
            0,
        );
        let scaled = breakdown.total.as_decimal() * dec!(10000);
        assert_eq!(scaled.fract(), Decimal::ZERO, "cost must be a multiple of 0.0001");
    }

    #[test]
    fn cache_billing_splits_input_tokens() {
        let billing = BillingConfig {
            mode: Some(BillingMode::TokenFlat),
            input_price: Some(dec!(10.0)),
            output_price: Some(dec!(20.0)),
            cached_input_price: Some(dec!(1.0)),
            cache_billing_enabled: true,
            ..Default::default()
        };
        let (resolved, _) = resolve(Some(&billing), None, 1_000);
        let breakdown = calculate_cost(
            &resolved,
            TokenCounts {
                input_tokens: 1_000,
                output_tokens: 0,
                cached_input_tokens: 400,
                cached_output_tokens: 0,
            },
            0,
        );
        // 600 tokens at $10/M + 400 tokens at $1/M
        let expected_input = Money::ceil4(dec!(600) / dec!(1_000_000) * dec!(10.0));
        let expected_cached = Money::ceil4(dec!(400) / dec!(1_000_000) * dec!(1.0));
        assert_eq!(breakdown.input_cost, expected_input);
        assert_eq!(breakdown.cached_input_cost, expected_cached);
    }

    #[test]
    fn cache_billing_splits_output_tokens() {
        let billing = BillingConfig {
            mode: Some(BillingMode::TokenFlat),
            input_price: Some(dec!(10.0)),
            output_price: Some(dec!(20.0)),
            cached_output_price: Some(dec!(2.0)),
            cache_billing_enabled: true,
            ..Default::default()
        };
        let (resolved, _) = resolve(Some(&billing), None, 0);
        let breakdown = calculate_cost(
            &resolved,
            TokenCounts {
                input_tokens: 0,
                output_tokens: 1_000,
                cached_input_tokens: 0,
                cached_output_tokens: 300,
            },
            0,
        );
        // 700 tokens at $20/M + 300 tokens at $2/M
        let expected_output = Money::ceil4(dec!(700) / dec!(1_000_000) * dec!(20.0));
        let expected_cached = Money::ceil4(dec!(300) / dec!(1_000_000) * dec!(2.0));
        assert_eq!(breakdown.output_cost, expected_output);
        assert_eq!(breakdown.cached_output_cost, expected_cached);
    }

    #[test]
    fn cached_output_price_falls_back_to_output_price_when_unset() {
        let billing = BillingConfig {
            mode: Some(BillingMode::TokenFlat),
            input_price: Some(dec!(10.0)),
            output_price: Some(dec!(20.0)),
            cache_billing_enabled: true,
            ..Default::default()
        };
        let (resolved, _) = resolve(Some(&billing), None, 0);
        let breakdown = calculate_cost(
            &resolved,
            TokenCounts {
                input_tokens: 0,
                output_tokens: 1_000,
                cached_input_tokens: 0,
                cached_output_tokens: 1_000,
            },
            0,
        );
        let expected_cached = Money::ceil4(dec!(1_000) / dec!(1_000_000) * dec!(20.0));
        assert_eq!(breakdown.cached_output_cost, expected_cached);
        assert_eq!(breakdown.output_cost, Money::ZERO);
    }

    #[test]
    fn per_request_billing_ignores_tokens() {
        let billing = BillingConfig {
            mode: Some(BillingMode::PerRequest),
            per_request_price: Some(dec!(0.02)),
            ..Default::default()
        };
        let (resolved, _) = resolve(Some(&billing), None, 1_000_000);
        let breakdown = calculate_cost(
            &resolved,
            TokenCounts {
                input_tokens: 1_000_000,
                output_tokens: 1_000_000,
                cached_input_tokens: 0,
                cached_output_tokens: 0,
            },
            0,
        );
        assert_eq!(breakdown.total, Money::ceil4(dec!(0.02)));
    }
}
