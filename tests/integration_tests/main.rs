// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! MIRIAD isn't needed; each task is replaced by a small shell script that
//! makes the outputs the real task would, and records how it was called.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

#![cfg(unix)]

mod arg_files;
mod clean;
mod no_stderr;

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use fitsio::{
    images::{ImageDescription, ImageType},
    FitsFile,
};
use tempfile::TempDir;

fn mmcore() -> Command {
    Command::cargo_bin("mmcore").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// Pixels of every Stokes V dirty map. The population standard deviation of
/// the finite ones is 1, so the clean cutoff is 0.5.
const V_PIXELS: [f32; 8] = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, f32::NAN, f32::NAN];

/// A scratch area with fake MIRIAD tasks, some visibilities, and a working
/// directory for the products.
struct Workspace {
    _tmp_dir: TempDir,
    /// Where the fake MIRIAD tasks are.
    bin: PathBuf,
    /// Every task invocation, one per line.
    record: PathBuf,
    /// The products are written here.
    work: PathBuf,
    vis: PathBuf,
}

impl Workspace {
    fn new() -> Workspace {
        let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
        let bin = tmp_dir.path().join("bin");
        let work = tmp_dir.path().join("work");
        let vis = tmp_dir.path().join("data/2100/J0000-0000.2100.uvaver");
        let record = tmp_dir.path().join("record.txt");
        let template = tmp_dir.path().join("template.fits");
        for dir in [&bin, &work, &vis] {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(&record, "").unwrap();
        write_image(&template, &V_PIXELS);

        let ws = Workspace {
            bin,
            record,
            work,
            vis,
            _tmp_dir: tmp_dir,
        };
        // Like MIRIAD, nothing is overwritten; an existing output is an error.
        ws.task(
            "invert",
            r#"IFS=,
for m in $map; do [ -e "$m" ] && exit 1; mkdir "$m"; done
[ -e "$beam" ] && exit 1
mkdir "$beam""#,
        );
        for name in ["clean", "mfclean", "restor", "linmos"] {
            ws.task(name, r#"mkdir "$out" || exit 1"#);
        }
        ws.task("gethd", r#"echo 1.234E-03 > "$log""#);
        ws.task("puthd", "true");
        ws.task(
            "fits",
            &format!(
                r#"[ -e "$out" ] && exit 1
case "$out" in
    *.map.fits) cp {} "$out" ;;
    *) touch "$out" ;;
esac"#,
                template.display()
            ),
        );
        ws
    }

    /// (Re)write a fake task. Keyword values are available as shell variables.
    fn task(&self, name: &str, body: &str) {
        let path = self.bin.join(name);
        let script = format!(
            r#"#!/bin/sh
echo "{name} $*" >> {record}
for a in "$@"; do
    case "$a" in
        map=*) map="${{a#map=}}" ;;
        beam=*) beam="${{a#beam=}}" ;;
        out=*) out="${{a#out=}}" ;;
        log=*) log="${{a#log=}}" ;;
    esac
done
{body}
"#,
            record = self.record.display()
        );
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// `mmcore`, working in the products directory with the fake MIRIAD.
    fn mmcore(&self, args: &[&str]) -> Command {
        let mut cmd = mmcore();
        cmd.current_dir(&self.work)
            .args(args)
            .arg("--miriad-dir")
            .arg(&self.bin)
            .arg("--no-progress-bars");
        cmd
    }

    fn vis(&self) -> String {
        self.vis.display().to_string()
    }

    fn recorded(&self) -> Vec<String> {
        fs::read_to_string(&self.record)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    fn recorded_task(&self, name: &str) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter(|l| l.split(' ').next() == Some(name))
            .collect()
    }

    fn product(&self, name: &str) -> PathBuf {
        self.work.join(name)
    }

    fn products(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.work)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

fn write_image(file: &Path, pixels: &[f32]) {
    let desc = ImageDescription {
        data_type: ImageType::Float,
        dimensions: &[2, pixels.len() / 2],
    };
    let mut fptr = FitsFile::create(file)
        .with_custom_primary(&desc)
        .open()
        .unwrap();
    let hdu = fptr.primary_hdu().unwrap();
    hdu.write_image(&mut fptr, pixels).unwrap();
}
