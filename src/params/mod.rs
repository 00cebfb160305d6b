// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters for the things `mmcore` does.
//!
//! The code here is kind of "mirroring" the code within the `cli` module; the
//! idea is that `cli` is unparsed, user-facing code, whereas parameters have
//! been parsed and are ready to be used directly.

mod clean;
mod invert;

pub(crate) use clean::CleanParams;
pub(crate) use invert::InvertParams;

use std::num::NonZeroU32;

use crate::filenames::ProductStem;

/// The channels to make images for. Each image averages `step` channels,
/// starting at the image's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChannelRange {
    pub(crate) start: u32,
    /// Exclusive.
    pub(crate) end: u32,
    pub(crate) step: NonZeroU32,
}

impl ChannelRange {
    pub(crate) fn channels(&self) -> impl Iterator<Item = u32> {
        (self.start..self.end).step_by(self.step.get() as usize)
    }

    pub(crate) fn len(&self) -> usize {
        self.channels().count()
    }
}

/// Get the product stems of every job. With no channel range, there's a single
/// MFS job.
pub(crate) fn job_stems(
    source: &str,
    freq: u32,
    channels: Option<&ChannelRange>,
) -> Vec<ProductStem> {
    match channels {
        Some(range) => range
            .channels()
            .map(|chan| ProductStem::channel(source, freq, chan))
            .collect(),
        None => vec![ProductStem::mfs(source, freq)],
    }
}
