// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use crate::{get_cmd_output, Workspace};

#[test]
fn test_invert_and_clean_no_stderr() {
    let ws = Workspace::new();
    let vis = ws.vis();

    #[rustfmt::skip]
    let cmd = ws
        .mmcore(&[
            "invert",
            "-s", "J0000-0000",
            "-2", "6",
            "--vis", &vis,
        ])
        .ok();
    assert!(cmd.is_ok(), "invert failed: {:?}", get_cmd_output(cmd));
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");

    let cmd = ws.mmcore(&["clean", "-s", "J0000-0000", "-2", "6"]).ok();
    assert!(cmd.is_ok(), "clean failed: {:?}", get_cmd_output(cmd));
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}
