/*
 * This file is part of vcool.
 *
 * Copyright (C) 2025 vcool contributors
 *
 * vcool is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * vcool is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with vcool. If not, see <https://www.gnu.org/licenses/>.
 */

//! Single-instance guard backed by a PID file
//!
//! Only one daemon may drive the fan line. On startup the recorded PID is
//! probed with signal 0; a live previous instance is either left alone (and we
//! exit) or asked to terminate with `SIGINT`, depending on the directive.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};
use vc_error::InstanceError;

use crate::constants::timing::{INSTANCE_KILL_WAIT, SHUTDOWN_CHECK};

/// What to do about an instance that is already running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Refuse to start if another instance runs
    Normal,
    /// Terminate the other instance, then start
    Force,
    /// Terminate the other instance and exit
    Kill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    Proceed,
    Exit,
}

#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PID recorded in the file, `None` if absent or unparsable.
    pub fn read_pid(&self) -> Result<Option<i32>, InstanceError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.trim().parse::<i32>().ok().filter(|pid| *pid > 0)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(InstanceError::PidFileRead {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// PID of a live process other than us recorded in the file.
    pub fn running_instance(&self) -> Result<Option<i32>, InstanceError> {
        let own = std::process::id() as i32;
        Ok(self.read_pid()?.filter(|pid| *pid != own && is_alive(*pid)))
    }

    /// Record the current process ID.
    pub fn write_current(&self) -> Result<(), InstanceError> {
        let write = || -> io::Result<()> {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o644)
                .open(&self.path)?;
            writeln!(file, "{}", std::process::id())?;
            file.sync_all()
        };
        write().map_err(|source| InstanceError::PidFileWrite {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "PID file written");
        Ok(())
    }

    /// Remove the file if it still names this process.
    pub fn remove_if_owned(&self) -> bool {
        let own = std::process::id() as i32;
        match self.read_pid() {
            Ok(Some(pid)) if pid == own => match fs::remove_file(&self.path) {
                Ok(()) => true,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Failed to remove PID file");
                    false
                }
            },
            _ => false,
        }
    }
}

/// Whether a process with `pid` exists.
pub fn is_alive(pid: i32) -> bool {
    // SAFETY: kill with signal 0 only checks for the process; nothing is delivered.
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Ask `pid` to shut down with SIGINT.
pub fn terminate(pid: i32) -> Result<(), InstanceError> {
    // SAFETY: plain kill(2) on a PID read from our own PID file.
    if unsafe { libc::kill(pid, libc::SIGINT) } != 0 {
        return Err(InstanceError::Signal {
            pid,
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}

fn wait_for_exit(pid: i32) {
    let started = Instant::now();
    while is_alive(pid) && started.elapsed() < INSTANCE_KILL_WAIT {
        thread::sleep(SHUTDOWN_CHECK);
    }
    if is_alive(pid) {
        warn!(pid, "Previous instance still running after grace period");
    }
}

/// Handle a previously started instance according to `directive`.
pub fn resolve_previous(pid_file: &PidFile, directive: Directive, program: &str) -> Result<Startup, InstanceError> {
    let running = pid_file.running_instance()?;
    match (running, directive) {
        (Some(pid), Directive::Kill | Directive::Force) => {
            info!(pid, "Kill another instance with PID {}", pid);
            terminate(pid)?;
            wait_for_exit(pid);
            Ok(if directive == Directive::Kill { Startup::Exit } else { Startup::Proceed })
        }
        (Some(pid), Directive::Normal) => {
            info!(pid, "Another instance is running");
            println!(
                "Another instance is running, run \"{0} kill\" to kill it first, or run \"{0} force\" to force running.",
                program
            );
            Ok(Startup::Exit)
        }
        (None, Directive::Kill) => {
            info!("No running instance to kill");
            Ok(Startup::Exit)
        }
        (None, _) => Ok(Startup::Proceed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::{Child, Command};

    fn pid_file_with(dir: &Path, contents: &str) -> PidFile {
        let path = dir.join("vcool.pid");
        fs::write(&path, contents).unwrap();
        PidFile::new(path)
    }

    fn spawn_sleeper() -> Child {
        Command::new("sleep").arg("30").spawn().unwrap()
    }

    #[test]
    fn test_read_pid_variants() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(PidFile::new(dir.path().join("none.pid")).read_pid().unwrap(), None);
        assert_eq!(pid_file_with(dir.path(), "1234\n").read_pid().unwrap(), Some(1234));
        assert_eq!(pid_file_with(dir.path(), "garbage").read_pid().unwrap(), None);
        assert_eq!(pid_file_with(dir.path(), "-5").read_pid().unwrap(), None);
    }

    #[test]
    fn test_write_current_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = PidFile::new(dir.path().join("vcool.pid"));
        pid_file.write_current().unwrap();

        let content = fs::read_to_string(pid_file.path()).unwrap();
        assert_eq!(content, format!("{}\n", std::process::id()));
        assert!(pid_file.running_instance().unwrap().is_none());

        assert!(pid_file.remove_if_owned());
        assert!(!pid_file.path().exists());
    }

    #[test]
    fn test_remove_leaves_foreign_pid_file() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = pid_file_with(dir.path(), "1\n");
        assert!(!pid_file.remove_if_owned());
        assert!(pid_file.path().exists());
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = PidFile::new(dir.path().join("missing").join("vcool.pid"));
        assert!(matches!(
            pid_file.write_current(),
            Err(InstanceError::PidFileWrite { .. })
        ));
    }

    #[test]
    fn test_stale_pid_is_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = pid_file_with(dir.path(), &format!("{}\n", i32::MAX));
        assert_eq!(pid_file.running_instance().unwrap(), None);
        assert_eq!(
            resolve_previous(&pid_file, Directive::Normal, "vcool").unwrap(),
            Startup::Proceed
        );
        assert_eq!(
            resolve_previous(&pid_file, Directive::Kill, "vcool").unwrap(),
            Startup::Exit
        );
    }

    #[test]
    fn test_live_instance_blocks_normal_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut child = spawn_sleeper();
        let pid_file = pid_file_with(dir.path(), &format!("{}\n", child.id()));

        assert_eq!(pid_file.running_instance().unwrap(), Some(child.id() as i32));
        assert_eq!(
            resolve_previous(&pid_file, Directive::Normal, "vcool").unwrap(),
            Startup::Exit
        );
        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn test_force_terminates_previous_instance() {
        let dir = tempfile::tempdir().unwrap();
        let mut child = spawn_sleeper();
        let pid_file = pid_file_with(dir.path(), &format!("{}\n", child.id()));

        // Reap concurrently so the terminated child does not linger as a zombie.
        let reaper = thread::spawn(move || child.wait());
        assert_eq!(
            resolve_previous(&pid_file, Directive::Force, "vcool").unwrap(),
            Startup::Proceed
        );
        let status = reaper.join().unwrap().unwrap();
        assert!(!status.success());
    }
}
