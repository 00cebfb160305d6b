// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Building and running MIRIAD tasks.
//!
//! Every MIRIAD task is its own executable, configured with `key=value`
//! arguments. Tasks are run directly (not through a shell), so values are
//! never re-split on whitespace.

mod error;

pub(crate) use error::MiriadError;

use std::{
    fmt,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use log::{debug, info, log_enabled, trace, warn, Level::Debug};

/// A single invocation of a MIRIAD task.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MiriadTask {
    program: &'static str,
    args: Vec<(&'static str, String)>,
}

impl MiriadTask {
    pub(crate) fn new(program: &'static str) -> MiriadTask {
        MiriadTask {
            program,
            args: vec![],
        }
    }

    /// Add a keyword. Keywords are passed to MIRIAD in the order they're added.
    pub(crate) fn arg<T: fmt::Display>(mut self, key: &'static str, value: T) -> MiriadTask {
        self.args.push((key, value.to_string()));
        self
    }

    /// Add a keyword whose value is a path.
    pub(crate) fn path_arg<P: AsRef<Path>>(self, key: &'static str, path: P) -> MiriadTask {
        let value = path.as_ref().display().to_string();
        self.arg(key, value)
    }

    pub(crate) fn program(&self) -> &'static str {
        self.program
    }

    /// The arguments as they appear on the command line.
    pub(crate) fn argv(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect()
    }
}

impl fmt::Display for MiriadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.argv() {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Where MIRIAD lives, and how to run its tasks.
#[derive(Debug, Clone, Default)]
pub(crate) struct Miriad {
    /// The directory containing the MIRIAD executables. If this is `None`, the
    /// executables are found on `PATH`.
    bin_dir: Option<PathBuf>,
}

impl Miriad {
    pub(crate) fn new(bin_dir: Option<PathBuf>) -> Miriad {
        Miriad { bin_dir }
    }

    pub(crate) fn bin_dir(&self) -> Option<&Path> {
        self.bin_dir.as_deref()
    }

    /// Of the given tasks, those that aren't in the MIRIAD directory. If there
    /// is no MIRIAD directory, nothing can be checked and nothing is returned.
    pub(crate) fn find_missing(&self, programs: &[&'static str]) -> Vec<&'static str> {
        match &self.bin_dir {
            Some(dir) => programs
                .iter()
                .copied()
                .filter(|p| !dir.join(p).is_file())
                .collect(),
            None => vec![],
        }
    }

    fn executable(&self, program: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(program),
            None => PathBuf::from(program),
        }
    }

    /// Run a task to completion. Its output is captured and logged line by
    /// line; a non-zero exit status is an error.
    pub(crate) fn run(&self, task: &MiriadTask) -> Result<(), MiriadError> {
        info!("{task}");
        let exe = self.executable(task.program());
        let output = Command::new(&exe)
            .args(task.argv())
            .stdin(Stdio::null())
            .output()
            .map_err(|err| MiriadError::Spawn {
                program: task.program,
                exe,
                err,
            })?;

        if log_enabled!(Debug) {
            for line in String::from_utf8_lossy(&output.stdout)
                .lines()
                .filter(|l| !l.trim().is_empty())
            {
                debug!("{}: {line}", task.program);
            }
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr_lines = stderr.lines().filter(|l| !l.trim().is_empty());
        if output.status.success() {
            for line in stderr_lines {
                debug!("{}: {line}", task.program);
            }
            trace!("{} finished", task.program);
            Ok(())
        } else {
            for line in stderr_lines {
                warn!("{}: {line}", task.program);
            }
            Err(MiriadError::Failed {
                program: task.program,
                command: task.to_string(),
                status: output.status,
            })
        }
    }
}
