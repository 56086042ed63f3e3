use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WakerError {
    #[error("config file not found: {} (copy config.yaml.example to config.yaml and fill it in)", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, WakerError>;
