use serde_json::Value;

use crate::{value_to_label, Question, QuestionKind};

/// Arguments of a `question` event.
///
/// Defaults: `kind` is `input`, `default` is absent, `choices` is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionArgs {
    pub name: String,
    pub message: String,
    pub kind: Option<QuestionKind>,
    pub default: Option<Value>,
    pub choices: Option<Vec<Value>>,
}

impl QuestionArgs {
    pub fn new(name: impl ToString, message: impl ToString) -> Self {
        Self { name: name.to_string(), message: message.to_string(), ..Default::default() }
    }

    /// Decodes an event payload without rejecting anything.
    ///
    /// Arrays are positional `(name, message, type, default, choices)`,
    /// objects are keyed by those names, any other value is read as a
    /// one-element array. `null` counts as missing.
    pub fn from_payload(payload: Value) -> Self {
        match payload {
            Value::Array(items) => {
                let mut items = items.into_iter();
                Self::from_parts(
                    items.next(),
                    items.next(),
                    items.next(),
                    items.next(),
                    items.next(),
                )
            }
            Value::Object(mut map) => Self::from_parts(
                map.remove("name"),
                map.remove("message"),
                map.remove("type"),
                map.remove("default"),
                map.remove("choices"),
            ),
            Value::Null => Self::default(),
            other => Self::from_parts(Some(other), None, None, None, None),
        }
    }

    fn from_parts(
        name: Option<Value>,
        message: Option<Value>,
        kind: Option<Value>,
        default: Option<Value>,
        choices: Option<Value>,
    ) -> Self {
        let text = |value: Option<Value>| match value {
            None | Some(Value::Null) => String::new(),
            Some(value) => value_to_label(&value),
        };

        Self {
            name: text(name),
            message: text(message),
            kind: match kind {
                Some(Value::String(kind)) => Some(QuestionKind::from(kind)),
                _ => None,
            },
            default: default.filter(|value| !value.is_null()),
            choices: match choices {
                Some(Value::Array(choices)) => Some(choices),
                _ => None,
            },
        }
    }
}

impl From<QuestionArgs> for Question {
    fn from(args: QuestionArgs) -> Self {
        Question {
            name: args.name,
            message: args.message,
            kind: args.kind.unwrap_or_default(),
            default: args.default,
            choices: args.choices.unwrap_or_default(),
        }
    }
}
