use thiserror::Error;

pub type ClassifierResult<T> = Result<T, ClassifierError>;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid category '{category}': {reason}")]
    InvalidCategory { category: String, reason: String },
    #[error("invalid purge threshold '{0}': expected a non-negative integer")]
    InvalidThreshold(String),
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

impl ClassifierError {
    pub fn invalid_category(category: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCategory {
            category: category.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed snapshot: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("smoothing must be a finite value greater than zero, got {0}")]
    InvalidSmoothing(f64),
    #[error("snapshot names invalid category '{category}': {reason}")]
    InvalidCategory { category: String, reason: String },
    #[error("category '{0}' appears more than once")]
    DuplicateCategory(String),
    #[error("token '{token}' appears more than once in category '{category}'")]
    DuplicateToken { category: String, token: String },
    #[error("token counts of category '{0}' overflow a 64-bit total")]
    CountOverflow(String),
    #[error("input is neither a snapshot nor a flat category table")]
    UnrecognizedFormat,
}
