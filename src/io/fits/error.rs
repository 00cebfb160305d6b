// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum FitsError {
    #[error("{source_file}:{source_line}: Couldn't open {}: {fits_error}", fits_filename.display())]
    Open {
        fits_error: Box<fitsio::errors::Error>,
        fits_filename: Box<Path>,
        source_file: &'static str,
        source_line: u32,
    },

    #[error("{source_file}:{source_line}: {} has no image in its primary HDU", fits_filename.display())]
    NoImage {
        fits_filename: Box<Path>,
        source_file: &'static str,
        source_line: u32,
    },

    #[error("{source_file}:{source_line}: Couldn't read the image in {}: {fits_error}", fits_filename.display())]
    Read {
        fits_error: Box<fitsio::errors::Error>,
        fits_filename: Box<Path>,
        source_file: &'static str,
        source_line: u32,
    },
}
