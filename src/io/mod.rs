// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! File stuff (globs, FITS images, cleaning up old MIRIAD datasets).

pub(crate) mod fits;
mod glob;

pub(crate) use self::glob::{get_all_matches_from_glob, GlobError};

use std::path::Path;

use log::{debug, warn};

/// Remove a file or MIRIAD dataset (a directory), if it exists. Failure is only
/// reported in the log; MIRIAD will complain later if the stale product is
/// still in the way. Returns whether something was removed.
pub(crate) fn remove_best_effort(path: &Path) -> bool {
    let result = match path.symlink_metadata() {
        Ok(m) if m.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(_) => return false,
    };
    match result {
        Ok(()) => {
            debug!("Removed {}", path.display());
            true
        }
        Err(e) => {
            warn!("Couldn't remove {}: {e}", path.display());
            false
        }
    }
}
