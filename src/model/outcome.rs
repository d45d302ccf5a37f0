use std::{fmt, io, path::PathBuf};

use tracing::error;

use crate::model::store::{DeleteFailure, StoreError};

const AUTH_ERROR_CODES: [&str; 3] = ["InvalidAccessKeyId", "InvalidSecurity", "SignatureDoesNotMatch"];

pub const SIGN_UP_HINT: &str =
    "If you haven't signed up for Amazon S3, please visit http://aws.amazon.com/s3";

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("precondition not met: {0}")]
    PreconditionNotMet(String),

    #[error("invalid credentials ({code}): {message}")]
    ProviderAuth { code: String, message: String },

    #[error("an error, number {code}, occurred with the message '{message}'")]
    Provider { code: String, message: String },

    #[error("deleted {deleted} keys, {} keys failed", failures.len())]
    PartialBulkFailure {
        deleted: usize,
        failures: Vec<DeleteFailure>,
    },

    #[error("verification failed: {0}")]
    VerificationFailed(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("listing of bucket {bucket} did not terminate after {pages} pages")]
    PaginationLimit { bucket: String, pages: usize },

    #[error("failed to access local file {}: {source}", path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Service { code, message } => {
                if AUTH_ERROR_CODES.contains(&code.as_str()) {
                    TaskError::ProviderAuth { code, message }
                } else {
                    TaskError::Provider { code, message }
                }
            }
            StoreError::Io { path, source } => TaskError::LocalFile { path, source },
            other => TaskError::Provider {
                code: "N/A".to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl TaskError {
    pub fn group(&self) -> &'static str {
        match self {
            TaskError::PreconditionNotMet(_) => "precondition",
            TaskError::ProviderAuth { .. } => "provider_auth",
            TaskError::Provider { .. } => "provider",
            TaskError::PartialBulkFailure { .. } => "partial_bulk_failure",
            TaskError::VerificationFailed(_) => "verification",
            TaskError::Configuration(_) => "configuration",
            TaskError::PaginationLimit { .. } => "pagination",
            TaskError::LocalFile { .. } => "local_file",
        }
    }
}

/// Logs `err` against the call that produced it.
pub fn show_error(err: &TaskError, call: &str) {
    error!(error_message=%err, error_group=call, error_kind=err.group());

    match err {
        TaskError::ProviderAuth { .. } => {
            error!("Please check the provided AWS credentials.");
            error!("{}", SIGN_UP_HINT);
        }
        TaskError::PartialBulkFailure { failures, .. } => {
            for f in failures {
                error!(key=%f.key, code=%f.code, error_message=%f.message, error_group=call);
            }
        }
        _ => {}
    }
}

/// Terminal result of one step invocation.
#[derive(Debug)]
pub enum Outcome {
    Success,
    /// The desired state already held; nothing was mutated.
    AlreadySatisfied(String),
    Failed(TaskError),
}

impl Outcome {
    pub fn passed(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }
}

impl From<Result<Outcome, TaskError>> for Outcome {
    fn from(res: Result<Outcome, TaskError>) -> Self {
        res.unwrap_or_else(Outcome::Failed)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::AlreadySatisfied(reason) => write!(f, "already satisfied: {}", reason),
            Outcome::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}
