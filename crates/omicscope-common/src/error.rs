use thiserror::Error;

#[derive(Debug, Error)]
pub enum OmicError {
    #[error("Unknown language: {0} (expected English, Telugu or Tamil)")]
    UnknownLanguage(String),
}

pub type Result<T> = std::result::Result<T, OmicError>;
