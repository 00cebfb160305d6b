// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Estimate the noise in a dirty image, to be used as a clean cutoff.
//!
//! Stokes V is expected to be signal free, so its spread is a measure of the
//! thermal noise in every Stokes parameter of the same channel.

use std::path::{Path, PathBuf};

use log::{debug, info};
use ndarray::prelude::*;
use scopeguard::defer;
use thiserror::Error;

use crate::{
    constants::NO_CUTOFF,
    filenames::fits_name_for,
    io::{
        fits::{read_primary_image, FitsError},
        remove_best_effort,
    },
    miriad::{Miriad, MiriadError, MiriadTask},
};

/// The MIRIAD task converting a dataset into a FITS image.
pub(crate) fn fits_conversion_task(dataset: &Path, fits: &Path) -> MiriadTask {
    MiriadTask::new("fits")
        .path_arg("in", dataset)
        .path_arg("out", fits)
        .arg("op", "xyout")
}

/// Get the clean cutoff for a channel from its Stokes V dirty map. If the map
/// doesn't exist, [`NO_CUTOFF`] is returned. The map is converted to a
/// temporary FITS file, which is always removed afterwards.
pub(crate) fn estimate_cutoff(miriad: &Miriad, v_map: &Path) -> Result<f64, NoiseError> {
    if !v_map.is_dir() {
        debug!(
            "{} doesn't exist; not using a clean cutoff",
            v_map.display()
        );
        return Ok(NO_CUTOFF);
    }

    let fits = fits_name_for(v_map);
    // MIRIAD won't overwrite a conversion left over from an earlier run.
    remove_best_effort(&fits);
    defer! {
        remove_best_effort(&fits);
    }
    miriad.run(&fits_conversion_task(v_map, &fits))?;

    let noise = image_noise(&fits)?;
    info!("{}: RMS = {noise}", v_map.display());
    Ok(noise)
}

/// Half of the standard deviation of all finite pixels in the primary image of
/// a FITS file.
pub(crate) fn image_noise(fits: &Path) -> Result<f64, NoiseError> {
    let pixels = read_primary_image(fits)?;
    let num_pixels = pixels.len();
    let finite: Array1<f64> = pixels.into_iter().filter(|p| p.is_finite()).collect();
    if finite.is_empty() {
        return Err(NoiseError::NoFinitePixels {
            file: fits.to_path_buf(),
        });
    }
    if finite.len() < num_pixels {
        debug!(
            "{}: ignoring {} non-finite pixels",
            fits.display(),
            num_pixels - finite.len()
        );
    }

    Ok(finite.std(0.0) / 2.0)
}

#[derive(Error, Debug)]
pub(crate) enum NoiseError {
    #[error("{} has no finite pixels; can't estimate its noise", file.display())]
    NoFinitePixels { file: PathBuf },

    #[error(transparent)]
    Miriad(#[from] MiriadError),

    #[error(transparent)]
    Fits(#[from] FitsError),
}
