use tracing::info;

use crate::{
    model::outcome::{Outcome, TaskError},
    session::{ContainerAware, ObjectAware, Session},
    tasks::Task,
};

pub struct DeleteFile {
    pub bucket: String,
    pub key: String,
}

impl Task for DeleteFile {
    fn name(&self) -> &'static str {
        "delete_file"
    }

    fn execute(&self, session: &Session) -> Result<Outcome, TaskError> {
        if !session.bucket_exists(&self.bucket) {
            return Err(TaskError::PreconditionNotMet(format!(
                "bucket '{}' not found",
                self.bucket
            )));
        }

        if !session.object_exists(&self.bucket, &self.key) {
            return Err(TaskError::PreconditionNotMet(format!(
                "key '{}' not found",
                self.key
            )));
        }

        info!(key = %self.key, "deleting file");
        session.store().delete_object(&self.bucket, &self.key)?;

        // an unreadable listing must not count as a confirmed delete
        if session.find_object(&self.bucket, &self.key)? {
            return Err(TaskError::VerificationFailed(format!(
                "key '{}' still present after delete",
                self.key
            )));
        }

        Ok(Outcome::Success)
    }
}
