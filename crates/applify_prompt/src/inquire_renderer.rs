use applify_domain::{
    default_index, value_to_label, Answers, Choice, Question, QuestionKind, Renderer,
};
use inquire::error::InquireResult;
use inquire::{Confirm, CustomType, Editor, MultiSelect, Password, Select, Text};
use serde_json::Value;
use tracing::{debug, warn};

/// Asks questions on the terminal with `inquire`, one after another.
#[derive(Debug, Default, Clone)]
pub struct InquireRenderer;

impl InquireRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Renderer for InquireRenderer {
    async fn render(&self, questions: &[Question]) -> anyhow::Result<Answers> {
        if questions.is_empty() {
            return Ok(Answers::new());
        }

        let questions = questions.to_vec();
        let answers = tokio::task::spawn_blocking(move || ask_all(&questions)).await??;
        Ok(answers)
    }
}

fn ask_all(questions: &[Question]) -> InquireResult<Answers> {
    let mut answers = Answers::new();
    for question in questions {
        debug!(name = %question.name, kind = %question.kind, "Asking question");
        let answer = ask(question)?;
        answers.insert(question.name.clone(), answer);
    }
    Ok(answers)
}

fn ask(question: &Question) -> InquireResult<Value> {
    let message = question.message.as_str();
    let default = question.default.as_ref();

    match &question.kind {
        QuestionKind::Input => ask_text(message, default),
        QuestionKind::Other(kind) => {
            warn!(
                kind = %kind,
                name = %question.name,
                "Unsupported question kind, asking as input"
            );
            ask_text(message, default)
        }
        QuestionKind::Number => {
            let mut prompt = CustomType::<f64>::new(message);
            if let Some(default) = default.and_then(Value::as_f64) {
                prompt = prompt.with_default(default);
            }
            Ok(number_value(prompt.prompt()?))
        }
        QuestionKind::Confirm => {
            let mut prompt = Confirm::new(message);
            if let Some(default) = default.and_then(Value::as_bool) {
                prompt = prompt.with_default(default);
            }
            Ok(Value::Bool(prompt.prompt()?))
        }
        QuestionKind::List | QuestionKind::RawList | QuestionKind::Expand => {
            let choices = question.choice_list();
            let labels = labels(&choices);
            let mut prompt = Select::new(message, labels);
            if let Some(cursor) = default.and_then(|default| default_index(&choices, default)) {
                prompt = prompt.with_starting_cursor(cursor);
            }
            let selected = prompt.raw_prompt()?;
            Ok(choices[selected.index].value.clone())
        }
        QuestionKind::Checkbox => {
            let choices = question.choice_list();
            let preselected = checkbox_defaults(&choices, default);
            let prompt = MultiSelect::new(message, labels(&choices)).with_default(&preselected);
            let selected = prompt.raw_prompt()?;
            Ok(Value::Array(
                selected
                    .into_iter()
                    .map(|option| choices[option.index].value.clone())
                    .collect(),
            ))
        }
        QuestionKind::Password => {
            let answer = Password::new(message).without_confirmation().prompt()?;
            Ok(Value::String(answer))
        }
        QuestionKind::Editor => {
            let predefined = default.map(value_to_label);
            let mut prompt = Editor::new(message);
            if let Some(text) = predefined.as_deref() {
                prompt = prompt.with_predefined_text(text);
            }
            Ok(Value::String(prompt.prompt()?))
        }
    }
}

fn ask_text(message: &str, default: Option<&Value>) -> InquireResult<Value> {
    let default = default.map(value_to_label);
    let mut prompt = Text::new(message);
    if let Some(default) = default.as_deref() {
        prompt = prompt.with_default(default);
    }
    Ok(Value::String(prompt.prompt()?))
}

fn labels(choices: &[Choice]) -> Vec<String> {
    choices.iter().map(|choice| choice.label.clone()).collect()
}

/// Preselected checkbox entries: an array default selects every entry it
/// matches, a single value selects one.
fn checkbox_defaults(choices: &[Choice], default: Option<&Value>) -> Vec<usize> {
    let mut indices: Vec<usize> = match default {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| default_index(choices, item))
            .collect(),
        Some(value) => default_index(choices, value).into_iter().collect(),
        None => Vec::new(),
    };
    indices.sort_unstable();
    indices.dedup();
    indices
}

fn number_value(number: f64) -> Value {
    serde_json::Number::from_f64(number)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
