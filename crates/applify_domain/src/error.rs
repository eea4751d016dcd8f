use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Pipe has no '{0}' channel")]
    MissingChannel(String),
}

pub type Result<A> = std::result::Result<A, Error>;
