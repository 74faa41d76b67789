use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content item '{0}' does not exist")]
    ItemNotFound(String),

    #[error("Content part '{field}' does not exist in item '{item}'")]
    FieldNotFound { item: String, field: String },

    #[error("Unable to write content item '{key}': {reason}")]
    StorageWrite { key: String, reason: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid content key: '{0}'")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ContentError {
    /// Wraps any failure raised while persisting `key` as a write error.
    pub fn write(key: &str, reason: impl std::fmt::Display) -> Self {
        ContentError::StorageWrite {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<minijinja::Error> for ContentError {
    fn from(err: minijinja::Error) -> Self {
        ContentError::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
