// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

Most of these are defaults for command-line arguments, and match the settings
used for 16cm ATCA polarimetry.
 */

/// The default centre frequency of the observation [MHz].
pub(crate) const DEFAULT_FREQ_MHZ: u32 = 2100;

/// The default first channel to image.
pub(crate) const DEFAULT_START_CHAN: u32 = 1;

/// The default channel at which imaging stops. This channel is not imaged.
pub(crate) const DEFAULT_END_CHAN: u32 = 1500;

/// The default number of channels averaged into each image.
pub(crate) const DEFAULT_STEP_SIZE: u32 = 5;

/// The default number of pixels along each side of an image.
pub(crate) const DEFAULT_FIELD_SIZE: u32 = 2000;

/// The default maximum number of clean iterations.
pub(crate) const DEFAULT_NUM_ITERS: u32 = 1000;

/// The default percentage of the image to clean.
pub(crate) const DEFAULT_REGION_PERCENTAGE: f64 = 95.0;

/// The default number of channel jobs to run at once.
pub(crate) const DEFAULT_NUM_CORES: usize = 1;

/// Where visibilities are searched for if none are given. `{source}` is
/// replaced by the source name.
pub(crate) const DEFAULT_VIS_GLOB: &str = "../../*/*/{source}*.uvaver";

/// The placeholder in visibility globs that is replaced by the source name.
pub(crate) const SOURCE_PLACEHOLDER: &str = "{source}";

/// The clean cutoff used when no noise estimate is available. Being negative,
/// MIRIAD never stops cleaning because of it.
pub(crate) const NO_CUTOFF: f64 = -100.0;

/// Image cell size [arcsec].
pub(crate) const CELL_SIZE_ARCSEC: &str = "1,1";

/// Briggs robustness parameter for visibility weighting.
pub(crate) const ROBUST: &str = "+0.6";
