// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Run MIRIAD imaging and cleaning tasks over many spectral channels in parallel.
 */

mod cli;
mod constants;
mod filenames;
mod io;
mod jobs;
mod miriad;
mod noise;
mod params;
mod stokes;

use crossbeam_utils::atomic::AtomicCell;

pub use cli::{MiriadMulticore, MiriadMulticoreError};

/// Are progress bars being drawn? This should only ever be enabled by CLI code.
pub(crate) static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
