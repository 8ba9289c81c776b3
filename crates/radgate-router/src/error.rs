#[derive(Debug, Clone, thiserror::Error)]
pub enum RouterError {
    #[error("model not found: {0}")]
    NotFound(String),
    #[error("model disabled: {0}")]
    Disabled(String),
    #[error("route name collision: {0}")]
    Collision(String),
}
