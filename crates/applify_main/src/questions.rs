use std::path::Path;

use applify_domain::Question;

use crate::error::{Error, Result};

/// Reads a list of questions from a YAML file. JSON parses too, being a
/// subset of YAML.
pub fn load_questions(path: &Path) -> Result<Vec<Question>> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| Error::ReadQuestions { path: path.to_path_buf(), source })?;
    parse_questions(&content)
        .map_err(|source| Error::ParseQuestions { path: path.to_path_buf(), source })
}

fn parse_questions(content: &str) -> std::result::Result<Vec<Question>, serde_yml::Error> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yml::from_str(content)
}
