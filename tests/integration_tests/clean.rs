// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cleaning dirty maps.

use crate::{get_cmd_output, Workspace};

fn invert(ws: &Workspace, mfs: bool) {
    let vis = ws.vis();
    let mut args = vec![if mfs { "invert-mfs" } else { "invert" }, "-s", "J0000-0000"];
    if !mfs {
        args.extend(["-1", "1", "-2", "11"]);
    }
    args.extend(["--vis", &vis]);
    let cmd = ws.mmcore(&args).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
}

/// The tasks run for a product, in order.
fn task_names(ws: &Workspace, product: &str) -> Vec<String> {
    ws.recorded()
        .into_iter()
        .filter(|l| l.contains(product))
        .map(|l| l.split(' ').next().unwrap().to_string())
        .collect()
}

const CHANNEL_ARGS: [&str; 7] = ["clean", "-s", "J0000-0000", "-1", "1", "-2", "11"];

#[test]
fn clean_channels() {
    let ws = Workspace::new();
    invert(&ws, false);

    let mut args = CHANNEL_ARGS.to_vec();
    args.extend(["-n", "2"]);
    let cmd = ws.mmcore(&args).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    for chan in ["0001", "0006"] {
        for stokes in ["i", "q", "u", "v"] {
            let stem = format!("J0000-0000.2100.{chan}.{stokes}");
            for suffix in ["mod", "pbcorr", "cln", "rms", "cln.fits"] {
                assert!(
                    ws.product(&format!("{stem}.{suffix}")).exists(),
                    "{stem}.{suffix} is missing"
                );
            }
            let mut expected = vec!["invert"];
            if stokes == "v" {
                // The noise estimate.
                expected.push("fits");
            }
            expected.extend(["clean", "restor", "linmos", "gethd", "puthd", "fits"]);
            assert_eq!(task_names(&ws, &format!("{stem}.")), expected);
        }
        // The noise estimate's FITS file is gone.
        assert!(!ws
            .product(&format!("J0000-0000.2100.{chan}.v.map.fits"))
            .exists());
    }

    let recorded = ws.recorded();
    for line in [
        "fits in=J0000-0000.2100.0001.v.map out=J0000-0000.2100.0001.v.map.fits op=xyout",
        "clean map=J0000-0000.2100.0001.q.map beam=J0000-0000.2100.0001.beam region=percentage(95) niters=1000 cutoff=0.5 out=J0000-0000.2100.0001.q.mod",
        "restor map=J0000-0000.2100.0001.q.map beam=J0000-0000.2100.0001.beam model=J0000-0000.2100.0001.q.mod out=J0000-0000.2100.0001.q.pbcorr",
        "linmos in=J0000-0000.2100.0001.q.pbcorr out=J0000-0000.2100.0001.q.cln",
        "gethd in=J0000-0000.2100.0001.q.pbcorr/rms log=J0000-0000.2100.0001.q.rms",
        "puthd in=J0000-0000.2100.0001.q.cln/rms value=@J0000-0000.2100.0001.q.rms",
        "fits in=J0000-0000.2100.0001.q.cln out=J0000-0000.2100.0001.q.cln.fits op=xyout",
    ] {
        assert!(recorded.iter().any(|l| l == line), "didn't run: {line}");
    }
    // One noise estimate per channel.
    assert_eq!(
        recorded.iter().filter(|l| l.contains(".v.map.fits")).count(),
        2
    );

    // Everything's done, so nothing more runs.
    let num_recorded = recorded.len();
    let cmd = ws.mmcore(&CHANNEL_ARGS).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert_eq!(ws.recorded().len(), num_recorded);
}

#[test]
fn a_failed_task_only_stops_its_own_chain() {
    let ws = Workspace::new();
    invert(&ws, false);
    ws.task(
        "linmos",
        r####"case "$out" in *0006.q.cln) echo "### Fatal Error: no" >&2; exit 1 ;; esac
mkdir "$out""####,
    );

    let cmd = ws.mmcore(&CHANNEL_ARGS).ok();
    assert!(cmd.is_err());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("1 of 2 jobs failed: channel 0006"),
        "{stderr}"
    );
    assert!(stdout.contains("### Fatal Error: no"), "{stdout}");

    assert!(!ws.product("J0000-0000.2100.0006.q.cln.fits").exists());
    for done in [
        "J0000-0000.2100.0006.i.cln.fits",
        "J0000-0000.2100.0006.u.cln.fits",
        "J0000-0000.2100.0006.v.cln.fits",
        "J0000-0000.2100.0001.q.cln.fits",
    ] {
        assert!(ws.product(done).exists(), "{done} is missing");
    }

    // Fix linmos and go again; only the failed Stokes parameter is redone,
    // after its partial products are cleared away.
    ws.task("linmos", r#"mkdir "$out" || exit 1"#);
    let cmd = ws.mmcore(&CHANNEL_ARGS).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert!(ws.product("J0000-0000.2100.0006.q.cln.fits").exists());
    let cleans = ws.recorded_task("clean");
    assert_eq!(cleans.len(), 9);
    assert_eq!(
        cleans
            .iter()
            .filter(|l| l.contains("J0000-0000.2100.0006.q.map"))
            .count(),
        2
    );
}

#[test]
fn clean_mfs() {
    let ws = Workspace::new();
    invert(&ws, true);

    let cmd = ws.mmcore(&["single-clean", "-s", "J0000-0000", "-i", "500", "-r", "80"]).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    for stokes in ["i", "q", "u"] {
        assert!(ws
            .product(&format!("J0000-0000.2100.{stokes}.single.fits"))
            .exists());
        assert_eq!(
            task_names(&ws, &format!("J0000-0000.2100.{stokes}.")),
            vec!["invert", "mfclean", "restor", "fits"]
        );
    }
    assert!(!ws.product("J0000-0000.2100.v.single.fits").exists());
    assert!(ws.recorded().iter().any(|l| l
        == "mfclean map=J0000-0000.2100.i.map beam=J0000-0000.2100.beam region=percentage(80) niters=500 cutoff=0.5 out=J0000-0000.2100.i.mod"));
    assert!(ws.recorded().iter().any(|l| l
        == "restor map=J0000-0000.2100.u.map beam=J0000-0000.2100.beam model=J0000-0000.2100.u.mod out=J0000-0000.2100.u.cln"));
}

#[test]
fn no_v_map_means_no_cutoff() {
    let ws = Workspace::new();
    invert(&ws, true);
    std::fs::remove_dir(ws.product("J0000-0000.2100.v.map")).unwrap();

    let cmd = ws.mmcore(&["clean-mfs", "-s", "J0000-0000"]).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let mfcleans = ws.recorded_task("mfclean");
    assert_eq!(mfcleans.len(), 3);
    assert!(mfcleans.iter().all(|l| l.contains(" cutoff=-100 ")));
}

#[test]
fn missing_dirty_maps_are_skipped() {
    let ws = Workspace::new();
    let cmd = ws.mmcore(&CHANNEL_ARGS).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("not cleaning Stokes i"), "{stdout}");
    assert!(ws.recorded().is_empty());
    assert!(ws.products().is_empty());
}

#[test]
fn dry_run_prints_the_tasks() {
    let ws = Workspace::new();
    invert(&ws, false);
    let products = ws.products();
    let num_recorded = ws.recorded().len();

    let mut args = CHANNEL_ARGS.to_vec();
    args.push("--dry-run");
    let cmd = ws.mmcore(&args).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(
        stdout.contains("channel 0006: clean map=J0000-0000.2100.0006.v.map beam=J0000-0000.2100.0006.beam region=percentage(95) niters=1000 cutoff=<noise of J0000-0000.2100.0006.v.map> out=J0000-0000.2100.0006.v.mod"),
        "{stdout}"
    );
    assert!(
        stdout.contains("channel 0006: fits in=J0000-0000.2100.0006.v.map out=J0000-0000.2100.0006.v.map.fits op=xyout"),
        "{stdout}"
    );
    assert!(stdout.contains("Dry run -- exiting now."));
    assert_eq!(ws.recorded().len(), num_recorded);
    assert_eq!(ws.products(), products);
}

#[test]
fn dry_run_after_cleaning_has_nothing_to_do() {
    let ws = Workspace::new();
    invert(&ws, false);
    let cmd = ws.mmcore(&CHANNEL_ARGS).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let num_recorded = ws.recorded().len();

    let mut args = CHANNEL_ARGS.to_vec();
    args.push("--dry-run");
    let cmd = ws.mmcore(&args).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("channel 0001: nothing to clean; skipping"), "{stdout}");
    assert!(stdout.contains("channel 0006: nothing to clean; skipping"), "{stdout}");
    assert!(
        stdout.contains("2 of 2 images already exist and will be skipped: channel 0001, channel 0006"),
        "{stdout}"
    );
    assert!(!stdout.contains("channel 0006: clean "), "{stdout}");
    assert!(!stdout.contains("channel 0006: fits "), "{stdout}");
    assert_eq!(ws.recorded().len(), num_recorded);

    // With --redo, everything is planned again.
    args.push("--redo");
    let cmd = ws.mmcore(&args).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("channel 0006: clean map=J0000-0000.2100.0006.q.map"), "{stdout}");
    assert_eq!(ws.recorded().len(), num_recorded);
}
