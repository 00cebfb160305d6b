// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading images that MIRIAD's `fits` task has written.

mod error;

pub(crate) use error::FitsError;

use std::{panic::Location, path::Path};

use fitsio::{hdu::HduInfo, FitsFile};

/// Read the image in the primary HDU of a FITS file. All axes are flattened.
/// Errors report where this was called from.
#[track_caller]
pub(crate) fn read_primary_image(file: &Path) -> Result<Vec<f64>, FitsError> {
    let caller = Location::caller();
    let mut fptr = FitsFile::open(file).map_err(|e| FitsError::Open {
        fits_error: Box::new(e),
        fits_filename: file.into(),
        source_file: caller.file(),
        source_line: caller.line(),
    })?;
    let read_error = |e| FitsError::Read {
        fits_error: Box::new(e),
        fits_filename: file.into(),
        source_file: caller.file(),
        source_line: caller.line(),
    };
    let hdu = fptr.primary_hdu().map_err(read_error)?;
    match &hdu.info {
        HduInfo::ImageInfo { shape, .. } if !shape.is_empty() => {
            hdu.read_image(&mut fptr).map_err(read_error)
        }
        _ => Err(FitsError::NoImage {
            fits_filename: file.into(),
            source_file: caller.file(),
            source_line: caller.line(),
        }),
    }
}
