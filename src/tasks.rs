use std::path::Path;

use tracing::{info, span, Level};

use crate::{
    adapters::Connect,
    model::outcome::{show_error, Outcome, TaskError},
    session::Session,
};

pub mod copy_file;
pub mod create_bucket;
pub mod delete_bucket;
pub mod delete_file;
pub mod delete_matching;
pub mod get_file;
pub mod put_file;

/// One build step against the object store.
pub trait Task {
    fn name(&self) -> &'static str;

    /// Checks run before any handle is acquired.
    fn validate(&self) -> Result<(), TaskError> {
        Ok(())
    }

    fn execute(&self, session: &Session) -> Result<Outcome, TaskError>;
}

/// Runs `task` with a store handle scoped to this call. Never fails past
/// this boundary; the outcome is logged and returned to the caller.
pub fn run_task(connector: &dyn Connect, task: &dyn Task) -> Outcome {
    let span = span!(Level::INFO, "task", context = task.name());
    let _e = span.enter();
    info!("called");

    let outcome = match task.validate() {
        Err(err) => Outcome::Failed(err),
        Ok(()) => match Session::open(connector) {
            Err(err) => Outcome::Failed(err),
            Ok(session) => task.execute(&session).into(),
        },
    };

    match &outcome {
        Outcome::Success => info!("successful"),
        Outcome::AlreadySatisfied(reason) => info!(reason = %reason, "already satisfied"),
        Outcome::Failed(err) => show_error(err, task.name()),
    }

    outcome
}

/// Explicit key when given, otherwise the base name of `file`.
pub fn object_key(file: &Path, key: Option<&str>) -> Result<String, TaskError> {
    if let Some(key) = key.filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            TaskError::Configuration(format!("no file name in path: {}", file.display()))
        })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::adapters::mock::MockStore;

    struct Probe;

    impl Task for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn execute(&self, _session: &Session) -> Result<Outcome, TaskError> {
            Err(TaskError::PreconditionNotMet("missing".to_string()))
        }
    }

    struct Invalid;

    impl Task for Invalid {
        fn name(&self) -> &'static str {
            "invalid"
        }

        fn validate(&self) -> Result<(), TaskError> {
            Err(TaskError::Configuration("bad".to_string()))
        }

        fn execute(&self, _session: &Session) -> Result<Outcome, TaskError> {
            Ok(Outcome::Success)
        }
    }

    #[test]
    fn test_object_key() {
        let file = PathBuf::from("target/release/app.tar.gz");
        assert_eq!(object_key(&file, None).unwrap(), "app.tar.gz");
        assert_eq!(object_key(&file, Some("")).unwrap(), "app.tar.gz");
        assert_eq!(object_key(&file, Some("releases/app.tgz")).unwrap(), "releases/app.tgz");
        assert!(object_key(Path::new("/"), None).is_err());
    }

    #[test]
    fn test_handle_released_on_failure() {
        let store = MockStore::new(10);

        let outcome = run_task(&store, &Probe);
        assert!(matches!(outcome, Outcome::Failed(TaskError::PreconditionNotMet(_))));
        assert_eq!(store.state.borrow().connections, 1);
        assert_eq!(store.state.borrow().open_handles, 0);
    }

    #[test]
    fn test_validation_precedes_connect() {
        let store = MockStore::new(10);

        let outcome = run_task(&store, &Invalid);
        assert!(matches!(outcome, Outcome::Failed(TaskError::Configuration(_))));
        assert_eq!(store.state.borrow().connections, 0);
    }
}
