use classifier::{ClassifierError, ParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("invalid agent options: {}", .0.join("; "))]
    InvalidOptions(Vec<String>),
    #[error("model persistence failed: {0:#}")]
    Persistence(anyhow::Error),
}

impl From<ParseError> for AgentError {
    fn from(value: ParseError) -> Self {
        Self::Classifier(ClassifierError::Parse(value))
    }
}

impl AgentError {
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Classifier(ClassifierError::Parse(_)))
    }
}
