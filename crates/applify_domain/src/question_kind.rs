use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// Kind of prompt used to ask a question. Unknown kind names are kept as
/// [`QuestionKind::Other`] rather than rejected.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(from = "String", into = "String")]
pub enum QuestionKind {
    #[default]
    Input,
    Number,
    Confirm,
    List,
    RawList,
    Expand,
    Checkbox,
    Password,
    Editor,
    #[strum(default)]
    Other(String),
}

impl QuestionKind {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionKind::Other(name) => name.as_str(),
            kind => kind.as_ref(),
        }
    }
}

impl From<String> for QuestionKind {
    fn from(value: String) -> Self {
        QuestionKind::from_str(&value).unwrap_or(QuestionKind::Other(value))
    }
}

impl From<QuestionKind> for String {
    fn from(value: QuestionKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
