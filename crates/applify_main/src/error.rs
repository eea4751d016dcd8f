use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid question '{0}', expected NAME=MESSAGE")]
    MalformedQuestion(String),

    #[error("Failed to read question file {path}: {source}")]
    ReadQuestions {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse question file {path}: {source}")]
    ParseQuestions {
        path: PathBuf,
        source: serde_yml::Error,
    },
}

pub type Result<A> = std::result::Result<A, Error>;
