// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all mmcore-related errors. This should be the *only* error
//! enum that is publicly visible.

use thiserror::Error;

use super::common::ArgsError;
use crate::{io::GlobError, jobs::PoolError};

/// The *only* publicly visible error from mmcore. Where it helps, messages
/// carry a suggestion of what to do next.
#[derive(Error, Debug)]
pub enum MiriadMulticoreError {
    /// A problem with the supplied arguments.
    #[error("{0}")]
    Args(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files use the long names of command-line arguments, with hyphens replaced by underscores, grouped into tables (e.g. [image], [channels], [vis], [miriad]).")]
    ArgFile(String),

    /// MIRIAD couldn't be found.
    #[error("{0}\n\nIs MIRIAD installed? Its tasks must be on PATH, in $MIRBIN, or in the directory given by --miriad-dir.")]
    Miriad(String),

    /// At least one job failed. The failures themselves have already been
    /// logged.
    #[error("{0}\n\nThe log above has the reason for each failure. Try turning up verbosity (-v or -vv) to see MIRIAD's own output; re-running skips what's already been made.")]
    Jobs(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<ArgsError> for MiriadMulticoreError {
    fn from(e: ArgsError) -> Self {
        let s = e.to_string();
        match e {
            ArgsError::MiriadDirDoesNotExist(_) | ArgsError::MissingMiriadTasks { .. } => {
                Self::Miriad(s)
            }
            ArgsError::Glob(e) => Self::from(e),
            ArgsError::NoSource
            | ArgsError::InvalidSource(_)
            | ArgsError::ZeroStepSize
            | ArgsError::EmptyChannelRange { .. }
            | ArgsError::ZeroCores
            | ArgsError::ZeroFieldSize
            | ArgsError::ZeroIterations
            | ArgsError::BadRegion(_)
            | ArgsError::NoVis
            | ArgsError::VisDoesNotExist(_)
            | ArgsError::NoVisMatches { .. }
            | ArgsError::CommaInVis(_) => Self::Args(s),
        }
    }
}

impl From<GlobError> for MiriadMulticoreError {
    fn from(e: GlobError) -> Self {
        let s = e.to_string();
        match e {
            GlobError::PatternError(_) => Self::Args(format!("Bad visibility glob: {s}")),
            GlobError::GlobCrate(_) => Self::Generic(s),
        }
    }
}

impl From<PoolError> for MiriadMulticoreError {
    fn from(e: PoolError) -> Self {
        let s = e.to_string();
        match e {
            PoolError::JobsFailed { .. } => Self::Jobs(s),
            PoolError::ThreadPool(_) => Self::Generic(s),
        }
    }
}

impl From<std::io::Error> for MiriadMulticoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<toml::ser::Error> for MiriadMulticoreError {
    fn from(e: toml::ser::Error) -> Self {
        Self::ArgFile(format!("Couldn't write the arguments as toml: {e}"))
    }
}
