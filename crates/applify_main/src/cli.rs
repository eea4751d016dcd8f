use std::path::PathBuf;
use std::str::FromStr;

use applify_domain::Question;
use clap::Parser;

use crate::error::Error;

#[derive(Parser, Debug)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Path to a YAML or JSON file holding a list of questions.
    ///
    /// Each entry takes `name`, `message` and optionally `type`, `default`
    /// and `choices`.
    #[arg(long, short = 'f')]
    pub questions: Option<PathBuf>,

    /// Inline question given as NAME=MESSAGE. Asked after the questions from
    /// the file, in the order given.
    #[arg(long = "question", short = 'q')]
    pub inline: Vec<InlineQuestion>,

    /// Directory for log files. Defaults to the platform data directory.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Also print logs to stderr.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineQuestion {
    pub name: String,
    pub message: String,
}

impl FromStr for InlineQuestion {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once('=') {
            Some((name, message)) if !name.trim().is_empty() => Ok(Self {
                name: name.trim().to_string(),
                message: message.to_string(),
            }),
            _ => Err(Error::MalformedQuestion(value.to_string())),
        }
    }
}

impl From<InlineQuestion> for Question {
    fn from(value: InlineQuestion) -> Self {
        Question::new(value.name, value.message)
    }
}
