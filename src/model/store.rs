use std::{io, path::PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub name: String,
}

/// One page of a bucket listing.
///
/// When `truncated` is set the next request must carry `cursor` unchanged;
/// otherwise `cursor` is ignored.
#[derive(Clone, Debug, Default)]
pub struct ListingPage {
    pub keys: Vec<String>,
    pub truncated: bool,
    pub cursor: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteFailure {
    pub key: String,
    pub code: String,
    pub message: String,
}

/// Provider response to a multi-key delete. `deleted` only holds keys the
/// provider confirmed.
#[derive(Clone, Debug, Default)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    pub failures: Vec<DeleteFailure>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("failed to access local file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn service(code: &str, message: &str) -> Self {
        StoreError::Service {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}
