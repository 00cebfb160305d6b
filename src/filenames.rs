// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Names of the MIRIAD datasets and FITS files made for a source.
//!
//! Every product lives in the working directory and is named
//! `{source}.{freq}[.{chan}].{stokes}.{kind}`, where the channel is zero padded
//! to 4 digits and is absent for MFS images.

use std::fmt;
use std::path::PathBuf;

use crate::stokes::Stokes;

/// The common part of a set of product names. Each per-channel job and the
/// single MFS job has exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProductStem {
    source: String,
    freq: u32,
    chan: Option<u32>,
}

impl ProductStem {
    pub(crate) fn channel(source: &str, freq: u32, chan: u32) -> ProductStem {
        ProductStem {
            source: source.to_string(),
            freq,
            chan: Some(chan),
        }
    }

    pub(crate) fn mfs(source: &str, freq: u32) -> ProductStem {
        ProductStem {
            source: source.to_string(),
            freq,
            chan: None,
        }
    }

    pub(crate) fn chan(&self) -> Option<u32> {
        self.chan
    }

    fn base(&self) -> String {
        match self.chan {
            Some(chan) => format!("{}.{}.{chan:04}", self.source, self.freq),
            None => format!("{}.{}", self.source, self.freq),
        }
    }

    fn with_stokes(&self, stokes: Stokes, kind: &str) -> PathBuf {
        PathBuf::from(format!("{}.{stokes}.{kind}", self.base()))
    }

    /// The dirty map.
    pub(crate) fn map(&self, stokes: Stokes) -> PathBuf {
        self.with_stokes(stokes, "map")
    }

    /// The dirty beam. This is shared by all Stokes parameters.
    pub(crate) fn beam(&self) -> PathBuf {
        PathBuf::from(format!("{}.beam", self.base()))
    }

    /// The clean component model.
    pub(crate) fn model(&self, stokes: Stokes) -> PathBuf {
        self.with_stokes(stokes, "mod")
    }

    /// The restored image before primary-beam correction.
    pub(crate) fn pbcorr(&self, stokes: Stokes) -> PathBuf {
        self.with_stokes(stokes, "pbcorr")
    }

    /// The restored (and, for channel images, primary-beam corrected) image.
    pub(crate) fn clean(&self, stokes: Stokes) -> PathBuf {
        self.with_stokes(stokes, "cln")
    }

    /// A text log holding the restored image's "rms" header value.
    pub(crate) fn rms_log(&self, stokes: Stokes) -> PathBuf {
        self.with_stokes(stokes, "rms")
    }

    /// The final FITS image handed to the user.
    pub(crate) fn clean_fits(&self, stokes: Stokes) -> PathBuf {
        match self.chan {
            Some(_) => self.with_stokes(stokes, "cln.fits"),
            None => self.with_stokes(stokes, "single.fits"),
        }
    }
}

impl fmt::Display for ProductStem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chan {
            Some(chan) => write!(f, "channel {chan:04}"),
            None => write!(f, "MFS image"),
        }
    }
}

/// The FITS file a MIRIAD image is converted into for reading.
pub(crate) fn fits_name_for(dataset: &std::path::Path) -> PathBuf {
    let mut name = dataset.as_os_str().to_os_string();
    name.push(".fits");
    PathBuf::from(name)
}
