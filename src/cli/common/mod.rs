// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Common arguments for command-line interfaces. e.g. the `invert` and `clean`
//! subcommands both need to know the source name and where MIRIAD is, so the
//! same arguments are shared between them.

mod printers;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use std::{
    borrow::Cow,
    fmt,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
};

use clap::Parser;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use vec1::Vec1;

use crate::{
    constants::{
        DEFAULT_END_CHAN, DEFAULT_FREQ_MHZ, DEFAULT_NUM_CORES, DEFAULT_START_CHAN,
        DEFAULT_STEP_SIZE, DEFAULT_VIS_GLOB, SOURCE_PLACEHOLDER,
    },
    io::{get_all_matches_from_glob, GlobError},
    miriad::Miriad,
    params::ChannelRange,
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref FREQ_HELP: String =
        format!("The centre frequency of the observation [MHz]. Only used to name images. Default: {DEFAULT_FREQ_MHZ}");

    static ref START_CHAN_HELP: String =
        format!("The first channel to image. Default: {DEFAULT_START_CHAN}");

    static ref END_CHAN_HELP: String =
        format!("Imaging stops at this channel; it is not imaged itself. Default: {DEFAULT_END_CHAN}");

    static ref STEP_SIZE_HELP: String =
        format!("The number of channels averaged into each image. Default: {DEFAULT_STEP_SIZE}");

    static ref NCORES_HELP: String =
        format!("The number of channels to work on at once. Default: {DEFAULT_NUM_CORES}");

    static ref VIS_GLOB_HELP: String =
        format!("A glob matching the visibilities to image, used when --vis isn't given. Any {SOURCE_PLACEHOLDER} is replaced by the source name. Default: {DEFAULT_VIS_GLOB}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(MiriadMulticoreError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(MiriadMulticoreError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(MiriadMulticoreError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// What's being imaged. Every product file name starts with
/// `{source}.{freq}`.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ImageArgs {
    /// The name of the source, e.g. J0000-0000. This names the products, and
    /// is used to find visibilities.
    #[clap(short, long, help_heading = "IMAGES")]
    pub(super) source: Option<String>,

    #[clap(short, long, help = FREQ_HELP.as_str(), help_heading = "IMAGES")]
    pub(super) freq: Option<u32>,
}

impl ImageArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        ImageArgs {
            source: self.source.or(other.source),
            freq: self.freq.or(other.freq),
        }
    }

    pub(super) fn parse(self) -> Result<(String, u32), ArgsError> {
        let source = match self.source {
            None => return Err(ArgsError::NoSource),
            Some(s) if s.trim().is_empty() => return Err(ArgsError::NoSource),
            Some(s) => s,
        };
        // MIRIAD splits keyword values on commas, and the tasks are given
        // names made from the source.
        if source.contains(|c: char| c == ',' || c.is_whitespace()) {
            return Err(ArgsError::InvalidSource(source));
        }
        Ok((source, self.freq.unwrap_or(DEFAULT_FREQ_MHZ)))
    }
}

/// Which channels get their own image, and how many are worked on at once.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ChannelArgs {
    #[clap(short = '1', long, help = START_CHAN_HELP.as_str(), help_heading = "CHANNELS")]
    pub(super) start_chan: Option<u32>,

    #[clap(short = '2', long, help = END_CHAN_HELP.as_str(), help_heading = "CHANNELS")]
    pub(super) end_chan: Option<u32>,

    #[clap(short = 'd', long, help = STEP_SIZE_HELP.as_str(), help_heading = "CHANNELS")]
    pub(super) step_size: Option<u32>,

    #[clap(short = 'n', long, help = NCORES_HELP.as_str(), help_heading = "CHANNELS")]
    pub(super) ncores: Option<usize>,
}

impl ChannelArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        ChannelArgs {
            start_chan: self.start_chan.or(other.start_chan),
            end_chan: self.end_chan.or(other.end_chan),
            step_size: self.step_size.or(other.step_size),
            ncores: self.ncores.or(other.ncores),
        }
    }

    pub(super) fn parse(self) -> Result<(ChannelRange, NonZeroUsize), ArgsError> {
        let start = self.start_chan.unwrap_or(DEFAULT_START_CHAN);
        let end = self.end_chan.unwrap_or(DEFAULT_END_CHAN);
        let step = NonZeroU32::new(self.step_size.unwrap_or(DEFAULT_STEP_SIZE))
            .ok_or(ArgsError::ZeroStepSize)?;
        if start >= end {
            return Err(ArgsError::EmptyChannelRange { start, end });
        }
        let num_workers = NonZeroUsize::new(self.ncores.unwrap_or(DEFAULT_NUM_CORES))
            .ok_or(ArgsError::ZeroCores)?;

        let range = ChannelRange { start, end, step };
        if num_workers.get() > range.len() {
            format!(
                "{num_workers} workers were requested, but there are only {} images to make",
                range.len()
            )
            .warn();
        }
        Ok((range, num_workers))
    }
}

/// The visibilities given to `invert`.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct VisArgs {
    /// Paths to the visibilities (MIRIAD uv datasets) to image. If these
    /// aren't given, they're found with the visibility glob.
    #[clap(long, multiple_values(true), help_heading = "VISIBILITIES")]
    pub(super) vis: Option<Vec<PathBuf>>,

    #[clap(long, help = VIS_GLOB_HELP.as_str(), help_heading = "VISIBILITIES")]
    pub(super) vis_glob: Option<String>,
}

impl VisArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        VisArgs {
            vis: self.vis.or(other.vis),
            vis_glob: self.vis_glob.or(other.vis_glob),
        }
    }

    pub(super) fn parse(self, source: &str) -> Result<Vec1<PathBuf>, ArgsError> {
        let vis = match self.vis {
            Some(vis) => {
                if self.vis_glob.is_some() {
                    "--vis was given; ignoring the visibility glob".warn();
                }
                for v in &vis {
                    if !v.exists() {
                        return Err(ArgsError::VisDoesNotExist(v.clone()));
                    }
                }
                vis
            }
            None => {
                let glob = self
                    .vis_glob
                    .as_deref()
                    .unwrap_or(DEFAULT_VIS_GLOB)
                    .replace(SOURCE_PLACEHOLDER, source);
                debug!("Looking for visibilities with glob '{glob}'");
                let matches = get_all_matches_from_glob(&glob)?;
                if matches.is_empty() {
                    return Err(ArgsError::NoVisMatches { glob });
                }
                matches
            }
        };
        // MIRIAD's vis keyword is comma separated.
        if let Some(v) = vis.iter().find(|v| v.display().to_string().contains(',')) {
            return Err(ArgsError::CommaInVis(v.clone()));
        }
        Vec1::try_from_vec(vis).map_err(|_| ArgsError::NoVis)
    }
}

/// Where MIRIAD is, and what to do about products that already exist.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct MiriadArgs {
    /// The directory containing the MIRIAD executables. If this isn't given,
    /// $MIRBIN is used if it's set, otherwise tasks are found on PATH.
    #[clap(long, help_heading = "MIRIAD")]
    pub(super) miriad_dir: Option<PathBuf>,

    /// Remove products that already exist and make them again. By default,
    /// anything already made is skipped.
    #[clap(long, help_heading = "MIRIAD")]
    #[serde(default)]
    pub(super) redo: bool,
}

impl MiriadArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        MiriadArgs {
            miriad_dir: self.miriad_dir.or(other.miriad_dir),
            redo: self.redo || other.redo,
        }
    }

    /// `tasks` are the MIRIAD tasks that will be run; when the MIRIAD
    /// directory is known, they must all be in it.
    pub(super) fn parse(self, tasks: &[&'static str]) -> Result<(Miriad, bool), ArgsError> {
        let bin_dir = self
            .miriad_dir
            .or_else(|| std::env::var_os("MIRBIN").map(PathBuf::from));
        if let Some(dir) = &bin_dir {
            if !dir.is_dir() {
                return Err(ArgsError::MiriadDirDoesNotExist(dir.clone()));
            }
        }
        let miriad = Miriad::new(bin_dir);
        let missing = miriad.find_missing(tasks);
        if let (Some(dir), false) = (miriad.bin_dir(), missing.is_empty()) {
            return Err(ArgsError::MissingMiriadTasks {
                dir: dir.to_path_buf(),
                tasks: missing.join(", "),
            });
        }
        Ok((miriad, self.redo))
    }
}

/// A summary of the MIRIAD setup for an [`InfoPrinter`].
pub(super) fn miriad_block(miriad: &Miriad, redo: bool) -> Vec<Cow<'static, str>> {
    vec![
        match miriad.bin_dir() {
            Some(dir) => format!("MIRIAD tasks from {}", dir.display()).into(),
            None => "MIRIAD tasks from PATH".into(),
        },
        if redo {
            "Existing products are remade".into()
        } else {
            "Existing products are skipped".into()
        },
    ]
}

/// Warn about images that won't be made because they already exist.
pub(super) fn warn_finished<L: fmt::Display>(finished: &[L], num_jobs: usize) {
    if let Some(block) = finished_block(finished, num_jobs) {
        block.warn();
    }
}

/// Only the labels of the first few finished images are listed.
fn finished_block<L: fmt::Display>(
    finished: &[L],
    num_jobs: usize,
) -> Option<Vec<Cow<'static, str>>> {
    if finished.is_empty() {
        return None;
    }
    let mut labels = finished.iter().take(MAX_LISTED_FINISHED).join(", ");
    if finished.len() > MAX_LISTED_FINISHED {
        labels.push_str(", ...");
    }
    Some(vec![
        format!(
            "{} of {num_jobs} images already exist and will be skipped: {labels}",
            finished.len()
        )
        .into(),
        "Use --redo to make them again".into(),
    ])
}

const MAX_LISTED_FINISHED: usize = 5;

#[derive(Error, Debug)]
pub(super) enum ArgsError {
    #[error("No source name was given")]
    NoSource,

    #[error("The source name '{0}' can't contain commas or whitespace")]
    InvalidSource(String),

    #[error("The step size can't be 0")]
    ZeroStepSize,

    #[error("The start channel ({start}) must be smaller than the end channel ({end})")]
    EmptyChannelRange { start: u32, end: u32 },

    #[error("The number of cores can't be 0")]
    ZeroCores,

    #[error("The field size can't be 0")]
    ZeroFieldSize,

    #[error("The number of clean iterations can't be 0")]
    ZeroIterations,

    #[error("The clean region must be a percentage above 0 and at most 100; got {0}")]
    BadRegion(f64),

    #[error("No visibilities were given")]
    NoVis,

    #[error("Visibilities '{}' don't exist", .0.display())]
    VisDoesNotExist(PathBuf),

    #[error("Nothing matched the visibility glob '{glob}'")]
    NoVisMatches { glob: String },

    #[error("Visibility paths can't contain commas: '{}'", .0.display())]
    CommaInVis(PathBuf),

    #[error("The MIRIAD directory '{}' doesn't exist", .0.display())]
    MiriadDirDoesNotExist(PathBuf),

    #[error("MIRIAD tasks missing from '{}': {tasks}", dir.display())]
    MissingMiriadTasks { dir: PathBuf, tasks: String },

    #[error(transparent)]
    Glob(#[from] GlobError),
}
