use serde_json::Value;

/// A selectable entry of a question's `choices`.
///
/// Strings are their own label and value. Objects shaped `{name, value}` show
/// `name` and answer with `value`. Anything else shows its JSON text.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String,
    pub value: Value,
}

impl Choice {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(label) => Self { label: label.clone(), value: value.clone() },
            Value::Object(map) => {
                let label = map
                    .get("name")
                    .map(value_to_label)
                    .unwrap_or_else(|| value.to_string());
                let answer = map.get("value").or_else(|| map.get("name")).unwrap_or(value);
                Self { label, value: answer.clone() }
            }
            other => Self { label: other.to_string(), value: other.clone() },
        }
    }

    /// True when `candidate` refers to this choice by value or by label.
    pub fn matches(&self, candidate: &Value) -> bool {
        &self.value == candidate || candidate.as_str() == Some(self.label.as_str())
    }
}

/// Text form of a JSON value as shown to a user: strings without quotes,
/// everything else as JSON.
pub fn value_to_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Resolves a question default against its choices. Numbers are taken as an
/// index, other values are matched against each choice.
pub fn default_index(choices: &[Choice], default: &Value) -> Option<usize> {
    if let Some(index) = default.as_u64() {
        let index = index as usize;
        if index < choices.len() && !choices.iter().any(|c| c.matches(default)) {
            return Some(index);
        }
    }
    choices.iter().position(|choice| choice.matches(default))
}
