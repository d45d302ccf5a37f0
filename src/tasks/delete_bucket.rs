use tracing::{info, warn};

use crate::{
    model::outcome::{Outcome, TaskError},
    session::{ContainerAware, Session},
    tasks::Task,
};

/// Removes an empty bucket. A non-empty bucket is rejected by the provider.
pub struct DeleteBucket {
    pub bucket: String,
}

impl Task for DeleteBucket {
    fn name(&self) -> &'static str {
        "delete_bucket"
    }

    fn execute(&self, session: &Session) -> Result<Outcome, TaskError> {
        // a failed listing must not pass as an already-deleted bucket
        if !session.list_bucket_names()?.contains(&self.bucket) {
            warn!(bucket = %self.bucket, "bucket not found");
            return Ok(Outcome::AlreadySatisfied(format!(
                "bucket {} not found",
                self.bucket
            )));
        }

        info!(bucket = %self.bucket, "deleting bucket");
        session.store().delete_bucket(&self.bucket)?;

        if session.list_bucket_names()?.contains(&self.bucket) {
            return Err(TaskError::VerificationFailed(format!(
                "bucket {} still exists",
                self.bucket
            )));
        }

        Ok(Outcome::Success)
    }
}
