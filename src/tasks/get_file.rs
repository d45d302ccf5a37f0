use std::path::PathBuf;

use tracing::info;

use crate::{
    model::outcome::{Outcome, TaskError},
    session::{ContainerAware, ObjectAware, Session},
    tasks::{object_key, Task},
};

/// Downloads one key. The bucket is never created here.
pub struct GetFile {
    pub bucket: String,
    pub key: String,
    /// Defaults to the base name of `key`.
    pub output: Option<PathBuf>,
}

impl GetFile {
    pub fn output_path(&self) -> Result<PathBuf, TaskError> {
        match &self.output {
            Some(path) => Ok(path.clone()),
            None => object_key(&PathBuf::from(&self.key), None).map(PathBuf::from),
        }
    }
}

impl Task for GetFile {
    fn name(&self) -> &'static str {
        "get_file"
    }

    fn validate(&self) -> Result<(), TaskError> {
        self.output_path().map(|_| ())
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

        let output = self.output_path()?;
        info!(key = %self.key, output = %output.display(), "downloading file");

        let written = session.store().get_object(&self.bucket, &self.key, &output)?;
        info!(output = %output.display(), bytes = written, "downloaded file");

        if !output.exists() {
            return Err(TaskError::VerificationFailed(format!(
                "download of '{}' not found",
                output.display()
            )));
        }

        Ok(Outcome::Success)
    }
}
