use tracing::{info, warn};

use crate::{
    model::{
        outcome::{Outcome, TaskError},
        store::DeleteFailure,
    },
    session::{ContainerAware, ObjectAware, Session, MAX_KEYS_PER_DELETE},
    tasks::Task,
};

/// Deletes every key containing `search`.
///
/// Listing and deletion are not atomic: keys uploaded by another process
/// after the listing page was read are not deleted, and nothing prevents a
/// concurrent upload of a key that is being deleted.
pub struct DeleteMatching {
    pub bucket: String,
    pub search: String,
    /// Required when `search` is empty, since that selects every key.
    pub confirm_all: bool,
}

impl DeleteMatching {
    /// Returns the number of deletions the provider confirmed alongside the outcome.
    pub fn delete_matching(&self, session: &Session) -> (usize, Result<Outcome, TaskError>) {
        if !session.bucket_exists(&self.bucket) {
            return (
                0,
                Err(TaskError::PreconditionNotMet(format!(
                    "bucket '{}' not found",
                    self.bucket
                ))),
            );
        }

        let batch = match session.collect_keys(&self.bucket, &self.search) {
            Ok(batch) => batch,
            Err(err) => return (0, Err(err)),
        };

        if batch.is_empty() {
            info!(search = %self.search, "bucket contains no files with the specified search string");
            return (0, Ok(Outcome::Success));
        }

        if self.search.is_empty() {
            warn!(bucket = %self.bucket, keys = batch.len(), "NONE (all files will be deleted!)");
        }

        let mut deleted = 0;
        let mut failures = Vec::new();

        for (chunk_no, chunk) in batch.chunks().enumerate() {
            for key in chunk {
                info!(key = %key, "deleting file");
            }

            match session.store().delete_objects(&self.bucket, chunk) {
                Ok(report) => {
                    deleted += report.deleted.len();
                    failures.extend(report.failures);
                }
                Err(err) if deleted == 0 && failures.is_empty() => return (0, Err(err.into())),
                Err(err) => {
                    let err = TaskError::from(err);
                    let (code, message) = match &err {
                        TaskError::Provider { code, message }
                        | TaskError::ProviderAuth { code, message } => (code.clone(), message.clone()),
                        other => ("N/A".to_string(), other.to_string()),
                    };

                    // the failed request and everything after it stays undeleted
                    let unattempted = batch.len() - chunk_no * MAX_KEYS_PER_DELETE;
                    warn!(
                        deleted = deleted,
                        unattempted = unattempted,
                        error_message = %err,
                        "bulk delete aborted"
                    );
                    failures.extend(batch.keys[chunk_no * MAX_KEYS_PER_DELETE..].iter().map(|key| {
                        DeleteFailure {
                            key: key.clone(),
                            code: code.clone(),
                            message: message.clone(),
                        }
                    }));
                    break;
                }
            }
        }

        info!(deleted = deleted, failed = failures.len(), "deleted files");

        if !failures.is_empty() {
            return (deleted, Err(TaskError::PartialBulkFailure { deleted, failures }));
        }

        (deleted, Ok(Outcome::Success))
    }
}

impl Task for DeleteMatching {
    fn name(&self) -> &'static str {
        "delete_matching"
    }

    fn validate(&self) -> Result<(), TaskError> {
        if self.search.is_empty() && !self.confirm_all {
            return Err(TaskError::Configuration(
                "an empty search string deletes every key in the bucket; confirm it explicitly"
                    .to_string(),
            ));
        }

        Ok(())
    }

    fn execute(&self, session: &Session) -> Result<Outcome, TaskError> {
        let (deleted, res) = self.delete_matching(session);
        info!(bucket = %self.bucket, deleted = deleted, "confirmed deletions");
        res
    }
}
