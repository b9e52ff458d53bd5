use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("invalid render options: {0}")]
    InvalidOptions(String),

    #[error("no section with identifier '{identifier}'")]
    SectionNotFound { identifier: String },
}

pub type RenderResult<T> = Result<T, RenderError>;
