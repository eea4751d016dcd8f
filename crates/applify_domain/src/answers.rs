use indexmap::IndexMap;
use serde_json::Value;

/// Answers collected in one prompt cycle, keyed by question name in the
/// order they were given.
pub type Answers = IndexMap<String, Value>;

/// Converts answers into the JSON object published on the `response` event.
pub fn answers_to_value(answers: &Answers) -> Value {
    Value::Object(answers.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}
