use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;

use log::{debug, warn};
use thiserror::Error;

use crate::invocation::{InvocationSpec, Trigger};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("executable not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("could not start {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    pub fn from_io(path: &Path, err: io::Error) -> LaunchError {
        match err.kind() {
            io::ErrorKind::NotFound => LaunchError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => LaunchError::PermissionDenied(path.to_path_buf()),
            _ => LaunchError::Spawn {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

#[derive(Debug)]
pub enum LaunchOutcome {
    Launched { pid: u32 },
    LaunchFailed(LaunchError),
}

impl LaunchOutcome {
    pub fn is_launched(&self) -> bool {
        matches!(self, LaunchOutcome::Launched { .. })
    }
}

/// Starts the command for one invocation. Implementations must return as
/// soon as the command is started and must not let a failure escape as a
/// panic; it is reported through the outcome instead.
pub trait Launcher {
    fn launch(&mut self, spec: &InvocationSpec) -> LaunchOutcome;
}

impl<L: Launcher + ?Sized> Launcher for Box<L> {
    fn launch(&mut self, spec: &InvocationSpec) -> LaunchOutcome {
        (**self).launch(spec)
    }
}

/// Spawns each invocation as an independent OS process. The child is never
/// waited on by the caller: a short-lived reaper thread collects its exit
/// status for the log so it does not linger as a zombie.
#[derive(Debug, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> ProcessLauncher {
        ProcessLauncher
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&mut self, spec: &InvocationSpec) -> LaunchOutcome {
        let spawned = Command::new(&*spec.executable)
            .args(&spec.args)
            .stdin(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                let pid = child.id();
                reap(child, spec.trigger);
                LaunchOutcome::Launched { pid }
            }
            Err(err) => LaunchOutcome::LaunchFailed(LaunchError::from_io(&spec.executable, err)),
        }
    }
}

fn reap(mut child: Child, trigger: Trigger) {
    let pid = child.id();

    let reaper = thread::Builder::new()
        .name(format!("reap-{}", pid))
        .spawn(move || match child.wait() {
            Ok(status) if status.success() => {
                debug!("command for {} (pid {}) finished", trigger, pid)
            }
            Ok(status) => warn!("command for {} (pid {}) exited with {}", trigger, pid, status),
            Err(err) => warn!("could not wait on pid {}: {}", pid, err),
        });

    if let Err(err) = reaper {
        // The child keeps running; only its exit status is lost.
        warn!("no reaper thread for pid {}: {}", pid, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::{InvocationTemplate, ProgramNumbering};
    use crate::midi_model::{MidiEvent, ProgramChange};

    fn spec_for(executable: &Path, program: u8) -> InvocationSpec {
        spec_with_args(executable, vec![], program)
    }

    fn spec_with_args(executable: &Path, args: Vec<String>, program: u8) -> InvocationSpec {
        InvocationTemplate::new(executable, args, ProgramNumbering::ZeroBased).instantiate(
            &MidiEvent::ProgramChange(ProgramChange {
                channel: 0,
                program,
            }),
            0,
        )
    }

    #[test]
    fn missing_executable_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("loadpreset");

        let outcome = ProcessLauncher::new().launch(&spec_for(&missing, 2));

        match outcome {
            LaunchOutcome::LaunchFailed(LaunchError::NotFound(path)) => assert_eq!(path, missing),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("loadpreset");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o644)).unwrap();

        let outcome = ProcessLauncher::new().launch(&spec_for(&script, 1));

        assert!(matches!(
            outcome,
            LaunchOutcome::LaunchFailed(LaunchError::PermissionDenied(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn launch_returns_before_a_slow_command_finishes() {
        use std::time::{Duration, Instant};

        // sh -c 'sleep 3' 0
        let spec = spec_with_args(
            Path::new("/bin/sh"),
            vec!["-c".to_string(), "sleep 3".to_string()],
            0,
        );

        let started = Instant::now();
        let outcome = ProcessLauncher::new().launch(&spec);

        assert!(outcome.is_launched());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
