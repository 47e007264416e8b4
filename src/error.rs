use thiserror::Error;

/// Main error type for the dbferry pipeline
#[derive(Error, Debug)]
pub enum FerryError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Extraction error: {message}")]
    Extraction { message: String },

    #[error("Transform error: {message}")]
    Transform { message: String },

    #[error("Load error: {message}")]
    Load { message: String },

    #[error("Sink error: {message}")]
    Sink { message: String },
}

impl FerryError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into() }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction { message: message.into() }
    }

    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform { message: message.into() }
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::Load { message: message.into() }
    }

    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink { message: message.into() }
    }
}
