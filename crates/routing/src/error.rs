use thiserror::Error;

/// Failures caught validating a rule before it is ever evaluated.
/// `RuleSet::evaluate` itself never fails — a malformed runtime value just
/// fails to match — but a malformed *regex pattern* in a loaded config is a
/// configuration bug worth rejecting at load time rather than having every
/// request silently fail to match it.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule on field `{field}` has an invalid regex pattern `{pattern}`: {source}")]
    InvalidRegex {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
