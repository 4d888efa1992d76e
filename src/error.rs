pub type GlowformResult<T> = Result<T, GlowformError>;

#[derive(thiserror::Error, Debug)]
pub enum GlowformError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("surface not ready: {0}")]
    Surface(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlowformError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    /// Retryable errors mean "try again later", everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Surface(_))
    }
}
