use crate::context::RuleContext;
use crate::error::RuleError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    In,
    Exists,
    Regex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Logic {
    And,
    Or,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default = "default_logic")]
    pub logic: Logic,
}

fn default_logic() -> Logic {
    Logic::And
}

impl RuleSet {
    /// An empty or missing ruleset always admits the candidate.
    pub fn evaluate(&self, ctx: &RuleContext) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        match self.logic {
            Logic::And => self.rules.iter().all(|rule| rule.evaluate(ctx)),
            Logic::Or => self.rules.iter().any(|rule| rule.evaluate(ctx)),
        }
    }

    /// Checked once when a mapping is loaded, not on every request: rejects
    /// a ruleset whose `regex` rules carry a pattern that doesn't compile,
    /// rather than letting it silently never match at evaluation time.
    pub fn validate(&self) -> Result<(), RuleError> {
        self.rules.iter().try_for_each(Rule::validate)
    }
}

impl Rule {
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.operator == Operator::Regex
            && let Some(pattern) = self.value.as_str()
        {
            Regex::new(pattern).map_err(|source| RuleError::InvalidRegex {
                field: self.field.clone(),
                pattern: pattern.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn evaluate(&self, ctx: &RuleContext) -> bool {
        let actual = ctx.get_value(&self.field);

        if self.operator == Operator::Exists {
            return actual.is_some() == truthy_bool(&self.value);
        }

        let Some(actual) = actual else {
            return false;
        };

        match self.operator {
            Operator::Eq => values_equal(&actual, &self.value),
            Operator::Ne => !values_equal(&actual, &self.value),
            Operator::Gt => compare_numbers(&actual, &self.value).is_some_and(|o| o.is_gt()),
            Operator::Gte => compare_numbers(&actual, &self.value).is_some_and(|o| o.is_ge()),
            Operator::Lt => compare_numbers(&actual, &self.value).is_some_and(|o| o.is_lt()),
            Operator::Lte => compare_numbers(&actual, &self.value).is_some_and(|o| o.is_le()),
            Operator::Contains => match (actual.as_str(), self.value.as_str()) {
                (Some(haystack), Some(needle)) => haystack.contains(needle),
                _ => actual.as_array().is_some_and(|arr| arr.iter().any(|v| values_equal(v, &self.value))),
            },
            Operator::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|v| values_equal(v, &actual))),
            Operator::Regex => match (actual.as_str(), self.value.as_str()) {
                (Some(text), Some(pattern)) => Regex::new(pattern).is_ok_and(|re| re.is_match(text)),
                _ => false,
            },
            Operator::Exists => unreachable!("handled above"),
        }
    }
}

fn truthy_bool(value: &Value) -> bool {
    value.as_bool().unwrap_or(true)
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

fn compare_numbers(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RuleContext {
        let mut ctx = RuleContext::new("gpt-4o", serde_json::json!({"messages": [{"role": "user"}]}));
        ctx.headers.insert("x-tenant".into(), "acme".into());
        ctx.input_tokens = Some(500);
        ctx
    }

    #[test]
    fn empty_ruleset_admits_everything() {
        let rules = RuleSet { rules: vec![], logic: Logic::And };
        assert!(rules.evaluate(&ctx()));
    }

    #[test]
    fn eq_on_model_field() {
        let rule = Rule {
            field: "model".into(),
            operator: Operator::Eq,
            value: Value::String("gpt-4o".into()),
        };
        assert!(rule.evaluate(&ctx()));
    }

    #[test]
    fn gt_on_token_usage() {
        let rule = Rule {
            field: "token_usage.input_tokens".into(),
            operator: Operator::Gt,
            value: Value::from(100),
        };
        assert!(rule.evaluate(&ctx()));
    }

    #[test]
    fn exists_false_for_missing_header() {
        let rule = Rule {
            field: "headers.x-missing".into(),
            operator: Operator::Exists,
            value: Value::Bool(false),
        };
        assert!(rule.evaluate(&ctx()));
    }

    #[test]
    fn regex_on_header() {
        let rule = Rule {
            field: "headers.x-tenant".into(),
            operator: Operator::Regex,
            value: Value::String("^ac.*$".into()),
        };
        assert!(rule.evaluate(&ctx()));
    }

    #[test]
    fn failing_ruleset_admits_nothing() {
        let rules = RuleSet {
            rules: vec![Rule {
                field: "model".into(),
                operator: Operator::Eq,
                value: Value::String("other-model".into()),
            }],
            logic: Logic::And,
        };
        assert!(!rules.evaluate(&ctx()));
    }

    #[test]
    fn body_array_indexing() {
        let rule = Rule {
            field: "body.messages.0.role".into(),
            operator: Operator::Eq,
            value: Value::String("user".into()),
        };
        assert!(rule.evaluate(&ctx()));
    }

    #[test]
    fn validate_rejects_malformed_regex_pattern() {
        let rule = Rule {
            field: "headers.x-tenant".into(),
            operator: Operator::Regex,
            value: Value::String("(unclosed".into()),
        };
        let err = rule.validate().unwrap_err();
        assert!(matches!(err, RuleError::InvalidRegex { .. }));
    }

    #[test]
    fn validate_passes_through_non_regex_rules() {
        let rules = RuleSet {
            rules: vec![Rule {
                field: "model".into(),
                operator: Operator::Eq,
                value: Value::String("gpt-4o".into()),
            }],
            logic: Logic::And,
        };
        assert!(rules.validate().is_ok());
    }
}
