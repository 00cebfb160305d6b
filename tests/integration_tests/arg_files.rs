// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Saving arguments to a file, and running from one.

use std::fs;

use crate::{get_cmd_output, Workspace};

#[test]
fn saved_toml_reproduces_a_run() {
    let ws = Workspace::new();
    let vis = ws.vis();
    let toml = ws.product("invert.toml");
    let toml_str = toml.display().to_string();

    #[rustfmt::skip]
    let cmd = ws
        .mmcore(&[
            "invert",
            "-s", "J0000-0000",
            "-2", "11",
            "-b", "512",
            "--vis", &vis,
            "--save-toml", &toml_str,
        ])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let contents = fs::read_to_string(&toml).unwrap();
    assert!(contents.contains("source = \"J0000-0000\""), "{contents}");
    assert!(contents.contains("field_size = 512"), "{contents}");
    let first = ws.recorded_task("invert");
    assert_eq!(first.len(), 2);

    let cmd = ws.mmcore(&["invert", &toml_str, "--redo"]).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let all = ws.recorded_task("invert");
    assert_eq!(all.len(), 4);
    let mut first = first;
    let mut second = all[2..].to_vec();
    first.sort();
    second.sort();
    assert_eq!(first, second);
}

#[test]
fn bad_arg_file() {
    let ws = Workspace::new();
    let file = ws.product("args.toml");
    fs::write(&file, "[image]\nsource = 5\n").unwrap();
    let file = file.display().to_string();

    let cmd = ws.mmcore(&["clean", &file]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Couldn't decode toml structure"), "{stderr}");
}
