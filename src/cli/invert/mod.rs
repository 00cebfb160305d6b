// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{
    display_warnings, miriad_block, warn_finished, ArgsError, ChannelArgs, ImageArgs,
    InfoPrinter, MiriadArgs, VisArgs, ARG_FILE_HELP,
};
use crate::{
    constants::DEFAULT_FIELD_SIZE, params::InvertParams, stokes::Stokes, MiriadMulticoreError,
};

lazy_static::lazy_static! {
    static ref FIELD_SIZE_HELP: String =
        format!("The number of pixels along each side of the images. Default: {DEFAULT_FIELD_SIZE}");
}

/// The only MIRIAD task needed to make dirty maps.
const TASKS: [&str; 1] = ["invert"];

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct InvertArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "image")]
    #[serde(default)]
    pub(super) image_args: ImageArgs,

    #[clap(short = 'b', long, help = FIELD_SIZE_HELP.as_str(), help_heading = "IMAGES")]
    pub(super) field_size: Option<u32>,

    #[clap(flatten)]
    #[serde(rename = "channels")]
    #[serde(default)]
    pub(super) channel_args: ChannelArgs,

    #[clap(flatten)]
    #[serde(rename = "vis")]
    #[serde(default)]
    pub(super) vis_args: VisArgs,

    #[clap(flatten)]
    #[serde(rename = "miriad")]
    #[serde(default)]
    pub(super) miriad_args: MiriadArgs,
}

impl InvertArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified
    /// into a single struct. Where applicable, it will prefer CLI parameters
    /// over those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<InvertArgs, MiriadMulticoreError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let InvertArgs {
                args_file: _,
                image_args,
                field_size,
                channel_args,
                vis_args,
                miriad_args,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(InvertArgs {
                args_file: None,
                image_args: cli_args.image_args.merge(image_args),
                field_size: cli_args.field_size.or(field_size),
                channel_args: cli_args.channel_args.merge(channel_args),
                vis_args: cli_args.vis_args.merge(vis_args),
                miriad_args: cli_args.miriad_args.merge(miriad_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<InvertParams, MiriadMulticoreError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            image_args,
            field_size,
            channel_args,
            vis_args,
            miriad_args,
        } = self;

        let (source, freq) = image_args.parse()?;
        let (channels, num_workers) = channel_args.parse()?;
        let field_size = parse_field_size(field_size)?;
        let vis = vis_args.parse(&source)?;
        let (miriad, redo) = miriad_args.parse(&TASKS)?;
        let params = InvertParams {
            source,
            freq,
            channels: Some(channels),
            field_size,
            vis,
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

/// Like [`InvertArgs`], but every channel goes into a single
/// multi-frequency synthesis image.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct InvertMfsArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "image")]
    #[serde(default)]
    pub(super) image_args: ImageArgs,

    #[clap(short = 'b', long, help = FIELD_SIZE_HELP.as_str(), help_heading = "IMAGES")]
    pub(super) field_size: Option<u32>,

    #[clap(flatten)]
    #[serde(rename = "vis")]
    #[serde(default)]
    pub(super) vis_args: VisArgs,

    #[clap(flatten)]
    #[serde(rename = "miriad")]
    #[serde(default)]
    pub(super) miriad_args: MiriadArgs,
}

impl InvertMfsArgs {
    pub(super) fn merge(self) -> Result<InvertMfsArgs, MiriadMulticoreError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let InvertMfsArgs {
                args_file: _,
                image_args,
                field_size,
                vis_args,
                miriad_args,
            } = unpack_arg_file!(arg_file);

            Ok(InvertMfsArgs {
                args_file: None,
                image_args: cli_args.image_args.merge(image_args),
                field_size: cli_args.field_size.or(field_size),
                vis_args: cli_args.vis_args.merge(vis_args),
                miriad_args: cli_args.miriad_args.merge(miriad_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<InvertParams, MiriadMulticoreError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            image_args,
            field_size,
            vis_args,
            miriad_args,
        } = self;

        let (source, freq) = image_args.parse()?;
        let field_size = parse_field_size(field_size)?;
        let vis = vis_args.parse(&source)?;
        let (miriad, redo) = miriad_args.parse(&TASKS)?;
        let params = InvertParams {
            source,
            freq,
            channels: None,
            field_size,
            vis,
            num_workers: std::num::NonZeroUsize::MIN,
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

fn parse_field_size(field_size: Option<u32>) -> Result<u32, ArgsError> {
    match field_size.unwrap_or(DEFAULT_FIELD_SIZE) {
        0 => Err(ArgsError::ZeroFieldSize),
        n => Ok(n),
    }
}

fn display(params: &InvertParams) {
    let mut printer = InfoPrinter::new("Making dirty maps".into());
    printer.push_line(format!("Source {} at {} MHz", params.source, params.freq).into());
    match &params.channels {
        Some(range) => printer.push_block(vec![
            format!(
                "Channels {} to {} (exclusive), {} per image",
                range.start, range.end, range.step
            )
            .into(),
            format!(
                "{} images, {} at a time",
                range.len(),
                params.num_workers
            )
            .into(),
        ]),
        None => printer.push_line("All channels in one multi-frequency synthesis image".into()),
    }
    printer.push_line(
        format!(
            "Stokes {}, {1}x{1} pixels",
            Stokes::keyword_value(&Stokes::ALL),
            params.field_size
        )
        .into(),
    );
    let mut vis_block = vec![format!("{} visibility files:", params.vis.len()).into()];
    vis_block.extend(params.vis.iter().map(|v| format!("  {}", v.display()).into()));
    printer.push_block(vis_block);
    printer.push_block(miriad_block(&params.miriad, params.redo));
    printer.display();
}

fn run_params(params: InvertParams, dry_run: bool) -> Result<(), MiriadMulticoreError> {
    if dry_run {
        params.dry_run();
        info!("Dry run -- exiting now.");
        return Ok(());
    }

    params.run()?;
    Ok(())
}
