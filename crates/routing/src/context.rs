use serde_json::Value;
use std::collections::HashMap;

/// Everything a `Rule` can read about the current request. Built once by
/// the orchestrator per dispatch and shared read-only across rule
/// evaluation for every candidate.
#[derive(Debug, Clone, Default)]
pub struct RuleContext {
    pub model: String,
    pub headers: HashMap<String, String>,
    pub body: Value,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl RuleContext {
    pub fn new(model: impl Into<String>, body: Value) -> Self {
        Self {
            model: model.into(),
            headers: HashMap::new(),
            body,
            input_tokens: None,
            output_tokens: None,
            total_tokens: None,
        }
    }

    /// Resolves a dotted path: `model`, `headers.<name>`, `body.<path>`
    /// (with array indices as numeric segments), or
    /// `token_usage.{input_tokens,output_tokens,total_tokens}`. Returns
    /// `None` when any segment of the path is missing, never an error —
    /// a missing field simply fails `exists`/every other operator.
    pub fn get_value(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        match segments.next()? {
            "model" => Some(Value::String(self.model.clone())),
            "headers" => {
                let name = segments.next()?;
                self.headers.get(name).cloned().map(Value::String)
            }
            "token_usage" => match segments.next()? {
                "input_tokens" => self.input_tokens.map(|v| Value::from(v)),
                "output_tokens" => self.output_tokens.map(|v| Value::from(v)),
                "total_tokens" => self.total_tokens.map(|v| Value::from(v)),
                _ => None,
            },
            "body" => {
                let mut current = &self.body;
                for segment in segments {
                    current = match segment.parse::<usize>() {
                        Ok(index) => current.as_array()?.get(index)?,
                        Err(_) => current.as_object()?.get(segment)?,
                    };
                }
                Some(current.clone())
            }
            _ => None,
        }
    }
}
