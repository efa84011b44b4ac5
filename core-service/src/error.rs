use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Sonification error: {0}")]
    Sonics(#[from] core_sonics::SonicsError),
}

impl CoreError {
    /// Whether the error came from host-supplied configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(self, CoreError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
