use thiserror::Error;

#[derive(Debug, Error)]
pub enum IspConfigError {
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("An error reading a file referenced from the config")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "toml")]
    #[error("Unable to parse config file: {0}")]
    Parse(#[from] toml_edit::de::Error),
    #[cfg(feature = "toml")]
    #[error("Unable to write config file: {0}")]
    Write(#[from] toml_edit::ser::Error),
}
