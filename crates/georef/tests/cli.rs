use assert_cmd::Command;
use georef::{FieldNames, RunConfig};
use predicates::prelude::*;
use std::{fs, path::Path};

const CONTROL: &str = "utm_e,utm_n,gx,gy
625790.088,1012275.575,0,500
626789.5653,1012243.118,1000,500
626773.3367,1011743.38,1000,0
625773.8594,1011775.837,0,0
";

const CONTROL_SE: &str = "utm_e,utm_n,gx,gy,utm_e_se,utm_n_se
625790.088,1012275.575,0,500,10,3
626789.5653,1012243.118,1000,500,2,3
626773.3367,1011743.38,1000,0,3,1
625773.8594,1011775.837,0,0,2,4
";

const POINTS: &str = "uid,gx,gy
1,9,30
2,9,70
3,500,250
";

fn write_inputs(dir: &Path, control: &str) {
    fs::write(dir.join("control.csv"), control).expect("write control");
    fs::write(dir.join("points.csv"), POINTS).expect("write points");
}

fn georef(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("georef").expect("binary");
    cmd.current_dir(dir);
    cmd
}

fn base_args(cmd: &mut Command) -> &mut Command {
    cmd.args([
        "-c",
        "control.csv",
        "-u",
        "points.csv",
        "-i",
        "uid",
        "-x",
        "gx",
        "-y",
        "gy",
        "-o",
        "out/site",
    ])
}

#[test]
fn projects_without_simulation() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_inputs(dir.path(), CONTROL);

    base_args(&mut georef(dir.path())).assert().success();

    let text = fs::read_to_string(dir.path().join("out/site-projected.csv")).expect("projected");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "uid,x,y,x_pred,y_pred");
    assert_eq!(lines.len(), 4);
    assert!(lines[3].starts_with("3,500,250,626281.71"));
    assert!(!dir.path().join("out/site-sim.csv").exists());
}

#[test]
fn simulation_writes_one_row_per_point_per_iteration() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_inputs(dir.path(), CONTROL_SE);

    base_args(&mut georef(dir.path()))
        .args(["-n", "7", "--seed", "3"])
        .assert()
        .success();

    let sim = fs::read_to_string(dir.path().join("out/site-sim.csv")).expect("sim");
    let mut lines = sim.lines();
    assert_eq!(lines.next(), Some("iteration,uid,x,y,x_pred,y_pred"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 7 * 3);
    assert!(rows[0].starts_with("0,1,9,30,"));
    assert!(rows[20].starts_with("6,3,500,250,"));

    let spread = fs::read_to_string(dir.path().join("out/site-spread.csv")).expect("spread");
    assert_eq!(spread.lines().count(), 4);
    assert!(spread.lines().nth(1).is_some_and(|l| l.starts_with("1,9,30,7,")));
}

#[test]
fn simulation_without_standard_errors_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_inputs(dir.path(), CONTROL);

    base_args(&mut georef(dir.path()))
        .args(["-n", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no standard errors"));
    assert!(!dir.path().join("out/site-projected.csv").exists());
}

#[test]
fn five_column_control_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let control = "utm_e,utm_n,gx,gy,utm_e_se\n1,2,0,0,1\n3,4,1,0,1\n5,6,0,1,1\n";
    write_inputs(dir.path(), control);

    base_args(&mut georef(dir.path()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("5 columns"));
}

#[test]
fn missing_flag_without_config_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_inputs(dir.path(), CONTROL);

    georef(dir.path())
        .args(["-c", "control.csv", "-u", "points.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--uid"));
}

#[test]
fn config_file_supplies_settings_and_flags_override() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_inputs(dir.path(), CONTROL_SE);
    let mut config = RunConfig::new(
        "control.csv",
        "points.csv",
        FieldNames::new("uid", "gx", "gy"),
        "from-config",
    );
    config.n_sims = Some(2);
    config
        .write_json(dir.path().join("run.json"))
        .expect("write config");

    georef(dir.path())
        .args(["--config", "run.json", "-o", "from-flag", "--report", "report.json"])
        .assert()
        .success();

    assert!(dir.path().join("from-flag-projected.csv").exists());
    assert!(dir.path().join("from-flag-sim.csv").exists());
    assert!(!dir.path().join("from-config-projected.csv").exists());
    let report = georef::RunReport::load_json(dir.path().join("report.json")).expect("report");
    assert_eq!(report.n_sims, Some(2));
    assert_eq!(report.seed, 10);
}
