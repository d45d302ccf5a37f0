use crate::{
    model::outcome::{Outcome, TaskError},
    session::{ContainerAware, Reconciled, Session},
    tasks::Task,
};

pub struct CreateBucket {
    pub bucket: String,
    pub region: String,
}

impl Task for CreateBucket {
    fn name(&self) -> &'static str {
        "create_bucket"
    }

    fn execute(&self, session: &Session) -> Result<Outcome, TaskError> {
        match session.ensure_bucket(&self.bucket, &self.region)? {
            Reconciled::Created => Ok(Outcome::Success),
            Reconciled::Existing => Ok(Outcome::AlreadySatisfied(format!(
                "bucket {} already exists",
                self.bucket
            ))),
        }
    }
}
