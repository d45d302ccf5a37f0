use tracing::info;

use crate::{
    model::outcome::{Outcome, TaskError},
    session::{ContainerAware, ObjectAware, Session},
    tasks::Task,
};

/// Server-side copy. Neither bucket is created here.
pub struct CopyFile {
    pub bucket: String,
    pub source_key: String,
    /// Defaults to `bucket`.
    pub target_bucket: Option<String>,
    pub target_key: String,
    pub overwrite: bool,
}

impl CopyFile {
    pub fn target_bucket(&self) -> &str {
        self.target_bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(&self.bucket)
    }
}

impl Task for CopyFile {
    fn name(&self) -> &'static str {
        "copy_file"
    }

    fn execute(&self, session: &Session) -> Result<Outcome, TaskError> {
        let target_bucket = self.target_bucket();

        for bucket in [self.bucket.as_str(), target_bucket] {
            if !session.bucket_exists(bucket) {
                return Err(TaskError::PreconditionNotMet(format!(
                    "bucket '{}' not found",
                    bucket
                )));
            }
        }

        if !self.overwrite && session.object_exists(target_bucket, &self.target_key) {
            return Ok(Outcome::AlreadySatisfied(format!(
                "key {} already exists in {}",
                self.target_key, target_bucket
            )));
        }

        info!(
            source_bucket = %self.bucket,
            source_key = %self.source_key,
            target_bucket = target_bucket,
            target_key = %self.target_key,
            "copying"
        );
        session
            .store()
            .copy_object(&self.bucket, &self.source_key, target_bucket, &self.target_key)?;

        if !session.object_exists(target_bucket, &self.target_key) {
            return Err(TaskError::VerificationFailed(format!(
                "key {} not found in {} after copy",
                self.target_key, target_bucket
            )));
        }

        Ok(Outcome::Success)
    }
}
