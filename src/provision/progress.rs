use crate::entity::action::Action;
use crate::errors::ProvError;

/// Actions performed so far in a run
#[derive(Debug, Default)]
pub(crate) struct Progress {
    performed: Vec<Action>,
}

impl Progress {
    pub(crate) fn push(&mut self, action: Action) {
        self.performed.push(action);
    }

    /// Runs `f`, recording `action` on success. On failure the error is
    /// wrapped together with `action` and everything performed before it.
    pub(crate) fn run<T, F>(&mut self, action: Action, f: F) -> Result<T, ProvError>
    where
        F: FnOnce() -> Result<T, ProvError>,
    {
        match f() {
            Ok(value) => {
                self.performed.push(action);
                Ok(value)
            }
            Err(err) => Err(map_err_apply(err, action, &self.performed)),
        }
    }

    pub(crate) fn into_performed(self) -> Vec<Action> {
        self.performed
    }
}

pub(crate) fn map_err_apply(
    err: ProvError,
    action_failed: Action,
    actions_performed: &[Action],
) -> ProvError {
    ProvError::ApplyError {
        error: Box::new(err),
        action_failed: Box::new(action_failed),
        actions_performed: actions_performed.to_vec(),
    }
}

#[test]
fn test_progress_run() {
    let mut progress = Progress::default();

    progress
        .run(Action::Mkdir("/mnt".into()), || Ok(()))
        .expect("mkdir should succeed");

    let err = progress
        .run(Action::UnmountFs("/mnt".into()), || {
            Err::<(), _>(ProvError::DeviceNotFound("/dev/null".into()))
        })
        .unwrap_err();

    match err {
        ProvError::ApplyError {
            ref action_failed,
            ref actions_performed,
            ..
        } => {
            assert_eq!(Action::UnmountFs("/mnt".into()), **action_failed);
            assert_eq!(vec![Action::Mkdir("/mnt".into())], *actions_performed);
        }
        _ => panic!("unexpected error {err:?}"),
    }

    assert!(matches!(err.root_cause(), ProvError::DeviceNotFound(_)));
    assert_eq!(1, progress.into_performed().len());
}
