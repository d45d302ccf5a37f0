use std::path::PathBuf;

use tracing::info;

use crate::{
    model::outcome::{Outcome, TaskError},
    session::{ContainerAware, ObjectAware, Session},
    tasks::{object_key, Task},
};

/// Uploads a local file, creating the bucket when it is missing.
pub struct PutFile {
    pub bucket: String,
    pub region: String,
    pub file: PathBuf,
    pub key: Option<String>,
    pub overwrite: bool,
}

impl Task for PutFile {
    fn name(&self) -> &'static str {
        "put_file"
    }

    fn validate(&self) -> Result<(), TaskError> {
        object_key(&self.file, self.key.as_deref()).map(|_| ())
    }

    fn execute(&self, session: &Session) -> Result<Outcome, TaskError> {
        if !self.file.is_file() {
            return Err(TaskError::PreconditionNotMet(format!(
                "local file '{}' doesn't exist",
                self.file.display()
            )));
        }

        let key = object_key(&self.file, self.key.as_deref())?;
        session.ensure_bucket(&self.bucket, &self.region)?;

        if !self.overwrite && session.object_exists(&self.bucket, &key) {
            return Ok(Outcome::AlreadySatisfied(format!(
                "key {} already exists in {}",
                key, self.bucket
            )));
        }

        info!(file = %self.file.display(), key = %key, "uploading file");
        session.store().put_object(&self.bucket, &key, &self.file)?;

        if !session.object_exists(&self.bucket, &key) {
            return Err(TaskError::VerificationFailed(format!(
                "key {} not found after upload",
                key
            )));
        }

        Ok(Outcome::Success)
    }
}
