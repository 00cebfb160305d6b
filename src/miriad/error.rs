// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with running MIRIAD tasks.

use std::{path::PathBuf, process::ExitStatus};

use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum MiriadError {
    #[error("Couldn't run MIRIAD task '{program}' ({}): {err}", exe.display())]
    Spawn {
        program: &'static str,
        exe: PathBuf,
        err: std::io::Error,
    },

    #[error("MIRIAD task '{program}' failed ({status}): {command}")]
    Failed {
        program: &'static str,
        command: String,
        status: ExitStatus,
    },
}
