// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::{num::NonZeroUsize, path::PathBuf};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{
    display_warnings, miriad_block, warn_finished, ArgsError, ChannelArgs, ImageArgs,
    InfoPrinter, MiriadArgs,
    ARG_FILE_HELP,
};
use crate::{
    constants::{DEFAULT_NUM_ITERS, DEFAULT_REGION_PERCENTAGE},
    params::CleanParams,
    MiriadMulticoreError,
};

lazy_static::lazy_static! {
    static ref N_ITERS_HELP: String =
        format!("The maximum number of clean iterations. Default: {DEFAULT_NUM_ITERS}");

    static ref REGION_HELP: String =
        format!("The percentage of each image to clean. Default: {DEFAULT_REGION_PERCENTAGE}");
}

/// The MIRIAD tasks run for each channel. `fits` also measures the noise.
const CHANNEL_TASKS: [&str; 6] = ["clean", "restor", "linmos", "gethd", "puthd", "fits"];

const MFS_TASKS: [&str; 3] = ["mfclean", "restor", "fits"];

/// Deconvolution settings shared by `clean` and `clean-mfs`.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct DeconvolutionArgs {
    #[clap(short = 'i', long, help = N_ITERS_HELP.as_str(), help_heading = "CLEANING")]
    pub(super) n_iters: Option<u32>,

    #[clap(short = 'r', long, help = REGION_HELP.as_str(), help_heading = "CLEANING")]
    pub(super) region: Option<f64>,
}

impl DeconvolutionArgs {
    fn merge(self, other: Self) -> Self {
        DeconvolutionArgs {
            n_iters: self.n_iters.or(other.n_iters),
            region: self.region.or(other.region),
        }
    }

    fn parse(self) -> Result<(u32, f64), ArgsError> {
        let num_iters = match self.n_iters.unwrap_or(DEFAULT_NUM_ITERS) {
            0 => return Err(ArgsError::ZeroIterations),
            n => n,
        };
        let region = self.region.unwrap_or(DEFAULT_REGION_PERCENTAGE);
        // NaN fails this too.
        if !(region > 0.0 && region <= 100.0) {
            return Err(ArgsError::BadRegion(region));
        }
        Ok((num_iters, region))
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct CleanArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "image")]
    #[serde(default)]
    pub(super) image_args: ImageArgs,

    #[clap(flatten)]
    #[serde(rename = "cleaning")]
    #[serde(default)]
    pub(super) deconvolution_args: DeconvolutionArgs,

    #[clap(flatten)]
    #[serde(rename = "channels")]
    #[serde(default)]
    pub(super) channel_args: ChannelArgs,

    #[clap(flatten)]
    #[serde(rename = "miriad")]
    #[serde(default)]
    pub(super) miriad_args: MiriadArgs,
}

impl CleanArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified
    /// into a single struct. Where applicable, it will prefer CLI parameters
    /// over those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<CleanArgs, MiriadMulticoreError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let CleanArgs {
                args_file: _,
                image_args,
                deconvolution_args,
                channel_args,
                miriad_args,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(CleanArgs {
                args_file: None,
                image_args: cli_args.image_args.merge(image_args),
                deconvolution_args: cli_args.deconvolution_args.merge(deconvolution_args),
                channel_args: cli_args.channel_args.merge(channel_args),
                miriad_args: cli_args.miriad_args.merge(miriad_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<CleanParams, MiriadMulticoreError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            image_args,
            deconvolution_args,
            channel_args,
            miriad_args,
        } = self;

        let (source, freq) = image_args.parse()?;
        let (num_iters, region) = deconvolution_args.parse()?;
        let (channels, num_workers) = channel_args.parse()?;
        let (miriad, redo) = miriad_args.parse(&CHANNEL_TASKS)?;
        let params = CleanParams {
            source,
            freq,
            channels: Some(channels),
            num_iters,
            region,
            num_workers,
            redo,
            miriad,
        };

        display(&params);
        warn_finished(&params.finished_jobs(), params.jobs().len());
        display_warnings();

        Ok(params)
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), MiriadMulticoreError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        run_params(self.parse()?, dry_run)
    }
}

/// Like [`CleanArgs`], but for the single multi-frequency synthesis image.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct CleanMfsArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "image")]
    #[serde(default)]
    pub(super) image_args: ImageArgs,

    #[clap(flatten)]
    #[serde(rename = "cleaning")]
    #[serde(default)]
    pub(super) deconvolution_args: DeconvolutionArgs,

    #[clap(flatten)]
    #[serde(rename = "miriad")]
    #[serde(default)]
    pub(super) miriad_args: MiriadArgs,
}

impl CleanMfsArgs {
    pub(super) fn merge(self) -> Result<CleanMfsArgs, MiriadMulticoreError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let CleanMfsArgs {
                args_file: _,
                image_args,
                deconvolution_args,
                miriad_args,
            } = unpack_arg_file!(arg_file);

            Ok(CleanMfsArgs {
                args_file: None,
                image_args: cli_args.image_args.merge(image_args),
                deconvolution_args: cli_args.deconvolution_args.merge(deconvolution_args),
                miriad_args: cli_args.miriad_args.merge(miriad_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<CleanParams, MiriadMulticoreError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            image_args,
            deconvolution_args,
            miriad_args,
        } = self;

        let (source, freq) = image_args.parse()?;
        let (num_iters, region) = deconvolution_args.parse()?;
        let (miriad, redo) = miriad_args.parse(&MFS_TASKS)?;
        let params = CleanParams {
            source,
            freq,
            channels: None,
            num_iters,
            region,
            num_workers: NonZeroUsize::MIN,
            redo,
            miriad,
        };

        display(&params);
        warn_finished(&params.finished_jobs(), params.jobs().len());
        display_warnings();

        Ok(params)
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), MiriadMulticoreError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        run_params(self.parse()?, dry_run)
    }
}

fn display(params: &CleanParams) {
    let mut printer = InfoPrinter::new("Cleaning".into());
    printer.push_line(format!("Source {} at {} MHz", params.source, params.freq).into());
    match &params.channels {
        Some(range) => printer.push_block(vec![
            format!(
                "Channels {} to {} (exclusive), {} per image",
                range.start, range.end, range.step
            )
            .into(),
            format!("{} images, {} at a time", range.len(), params.num_workers).into(),
        ]),
        None => printer.push_line("The multi-frequency synthesis image".into()),
    }
    printer.push_block(vec![
        format!("Stokes {}", params.stokes().iter().join(", ")).into(),
        format!(
            "Up to {} iterations over {}% of each image",
            params.num_iters, params.region
        )
        .into(),
        "Cutoff from the Stokes V noise".into(),
    ]);
    printer.push_block(miriad_block(&params.miriad, params.redo));
    printer.display();
}

fn run_params(params: CleanParams, dry_run: bool) -> Result<(), MiriadMulticoreError> {
    if dry_run {
        params.dry_run();
        info!("Dry run -- exiting now.");
        return Ok(());
    }

    params.run()?;
    Ok(())
}
