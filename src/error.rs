//! Error types and handling for `fairmeet`

use thiserror::Error;

/// Main error type for the `fairmeet` crate
#[derive(Error, Debug)]
pub enum FairmeetError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl FairmeetError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            FairmeetError::Config { .. } => {
                "Configuration error. Please check your config file and API credentials."
                    .to_string()
            }
            FairmeetError::Api { .. } => {
                "Unable to reach the journey planning service. Please check your internet connection."
                    .to_string()
            }
            FairmeetError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            FairmeetError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            FairmeetError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
