use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Choice, QuestionKind};

/// One prompt to show the user.
///
/// Serializes to `{name, message, type, default?, choices}`; `default` is
/// left out entirely when no default was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct Question {
    #[setters(skip)]
    pub name: String,
    #[setters(skip)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub choices: Vec<Value>,
}

impl Question {
    pub fn new(name: impl ToString, message: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            message: message.to_string(),
            kind: QuestionKind::default(),
            default: None,
            choices: Vec::new(),
        }
    }

    pub fn choice_list(&self) -> Vec<Choice> {
        self.choices.iter().map(Choice::from_value).collect()
    }
}
