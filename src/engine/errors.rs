use crate::engine::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    #[error("View error: {0}")]
    ViewError(String),

    #[error("Callback {name} failed: {message}")]
    CallbackFailed { name: String, message: String },

    #[error("Callback {name} panicked")]
    CallbackPanicked { name: String },

    #[error("Engine has not been started")]
    NotStarted,

    #[error("No configuration has been supplied")]
    NotConfigured,

    #[error("No live widget instance")]
    NoLiveInstance,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
