// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Stokes parameters, as MIRIAD names them.

use itertools::Itertools;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
pub(crate) enum Stokes {
    #[strum(serialize = "i")]
    I,
    #[strum(serialize = "q")]
    Q,
    #[strum(serialize = "u")]
    U,
    #[strum(serialize = "v")]
    V,
}

impl Stokes {
    /// Every Stokes parameter, in the order MIRIAD expects them.
    pub(crate) const ALL: [Stokes; 4] = [Stokes::I, Stokes::Q, Stokes::U, Stokes::V];

    /// Stokes V is only used for noise estimation in MFS images, so it isn't
    /// cleaned.
    pub(crate) const MFS_CLEANED: [Stokes; 3] = [Stokes::I, Stokes::Q, Stokes::U];

    /// The parameters as a MIRIAD keyword value, e.g. "i,q,u,v".
    pub(crate) fn keyword_value(stokes: &[Stokes]) -> String {
        stokes.iter().join(",")
    }
}
