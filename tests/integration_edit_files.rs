use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn scbconf(root: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("scbconf");
    cmd.env("XDG_CONFIG_HOME", root.join("xdg"))
        .arg("--root")
        .arg(root.join("scopebuddy"));
    cmd
}

#[test]
fn init_creates_global_config_with_active_gamescope_line() {
    let dir = tempdir().expect("tempdir");
    scbconf(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("scbconf: Global config ready at"));

    let global = dir.path().join("scopebuddy").join("scb.conf");
    let contents = fs::read_to_string(&global).expect("global written");
    assert!(contents.contains("\nSCB_GAMESCOPE_ARGS=\"\"\n"));
    assert!(dir.path().join("scopebuddy").join("AppID").is_dir());

    scbconf(dir.path()).arg("init").assert().success();
    assert_eq!(fs::read_to_string(&global).unwrap(), contents);
}

#[test]
fn create_edit_and_show_per_game_file() {
    let dir = tempdir().expect("tempdir");
    scbconf(dir.path()).arg("init").assert().success();
    scbconf(dir.path())
        .args(["create", "620", "--name", "Portal 2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("620.conf"));

    let file = dir
        .path()
        .join("scopebuddy")
        .join("AppID")
        .join("steam")
        .join("620.conf");
    assert!(file.is_file());

    scbconf(dir.path())
        .args(["exports", "steam/620", "DXVK_HUD=fps", "PROTON_LOG=1"])
        .assert()
        .success();
    scbconf(dir.path())
        .args([
            "gamescope",
            "steam/620",
            "--enable",
            "--render-width",
            "1280",
            "--render-height",
            "720",
            "--fullscreen",
        ])
        .assert()
        .success();
    scbconf(dir.path())
        .args(["launch", "steam/620", "-novid", "-console"])
        .assert()
        .success();

    let contents = fs::read_to_string(&file).unwrap();
    assert!(contents.starts_with("# Portal 2\n"));
    assert!(contents.contains("export DXVK_HUD=fps\n"));
    assert!(contents.contains("SCB_GAMESCOPE_ARGS=\"-h 720 -w 1280 -f\"\n"));
    assert!(contents.contains("command+=' -novid -console'\n"));

    scbconf(dir.path())
        .args(["show", "steam/620", "--json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"display_name\": \"Portal 2\"")
                .and(predicate::str::contains("\"launch_options\": \"-novid -console\""))
                .and(predicate::str::contains("\"active\": true")),
        );

    scbconf(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("global\tGlobal Config")
                .and(predicate::str::contains("steam/620.conf\tPortal 2")),
        );
}

#[test]
fn gamescope_disable_keeps_args_for_later() {
    let dir = tempdir().expect("tempdir");
    scbconf(dir.path()).arg("init").assert().success();
    scbconf(dir.path())
        .args(["gamescope", "global", "--fps", "60"])
        .assert()
        .success();
    scbconf(dir.path())
        .args(["gamescope", "global", "--disable"])
        .assert()
        .success();

    let global = dir.path().join("scopebuddy").join("scb.conf");
    let contents = fs::read_to_string(&global).unwrap();
    assert!(contents.contains("#SCBGUI#SCB_GAMESCOPE_ARGS=\"-r 60\"\n"));
    assert!(!contents.contains("\nSCB_GAMESCOPE_ARGS="));

    scbconf(dir.path())
        .args(["gamescope", "global", "--enable"])
        .assert()
        .success();
    let contents = fs::read_to_string(&global).unwrap();
    assert!(contents.contains("\nSCB_GAMESCOPE_ARGS=\"-r 60\"\n"));
}

#[test]
fn noscope_flag_round_trip() {
    let dir = tempdir().expect("tempdir");
    scbconf(dir.path()).arg("init").assert().success();
    scbconf(dir.path())
        .args(["flag", "global", "noscope", "on"])
        .assert()
        .success();
    let global = dir.path().join("scopebuddy").join("scb.conf");
    assert!(fs::read_to_string(&global)
        .unwrap()
        .ends_with("SCB_NOSCOPE=1\n"));

    scbconf(dir.path())
        .args(["flag", "global", "noscope", "on"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already up to date"));
}

#[test]
fn enabling_gamescope_with_mangohud_export_needs_force() {
    let dir = tempdir().expect("tempdir");
    scbconf(dir.path()).arg("init").assert().success();
    scbconf(dir.path())
        .args(["flag", "global", "noscope", "on"])
        .assert()
        .success();
    scbconf(dir.path())
        .args(["exports", "global", "MANGOHUD=1"])
        .assert()
        .success();

    scbconf(dir.path())
        .args(["flag", "global", "noscope", "off"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--mangoapp"));
    scbconf(dir.path())
        .args(["flag", "global", "noscope", "off", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning"));
}

#[test]
fn rejects_path_traversal_and_protected_targets() {
    let dir = tempdir().expect("tempdir");
    scbconf(dir.path()).arg("init").assert().success();

    scbconf(dir.path())
        .args(["create", "../evil"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("path separators"));
    assert!(!dir.path().join("scopebuddy").join("AppID").join("evil.conf").exists());
    assert!(!dir.path().join("scopebuddy").join("evil.conf").exists());

    scbconf(dir.path())
        .args(["rename", "global", "Mine"])
        .assert()
        .code(2);
    scbconf(dir.path())
        .args(["remove", "global"])
        .assert()
        .code(2);
    scbconf(dir.path())
        .args(["remove", "--launcher", "steam"])
        .assert()
        .code(2);
    scbconf(dir.path())
        .args(["show", "steam/404"])
        .assert()
        .code(3);
}

#[test]
fn replace_lines_requires_matching_pairs() {
    let dir = tempdir().expect("tempdir");
    scbconf(dir.path()).arg("init").assert().success();

    scbconf(dir.path())
        .args([
            "replace-lines",
            "global",
            "--prefix",
            "#SCB_DEBUG=1",
            "--prefix",
            "#SCB_AUTO_RES=1",
            "--with",
            "SCB_DEBUG=1",
        ])
        .assert()
        .code(2);

    scbconf(dir.path())
        .args([
            "replace-lines",
            "global",
            "--prefix",
            "#SCB_DEBUG=1",
            "--with",
            "SCB_DEBUG=1",
        ])
        .assert()
        .success();
    let global = dir.path().join("scopebuddy").join("scb.conf");
    assert!(fs::read_to_string(&global)
        .unwrap()
        .contains("\nSCB_DEBUG=1\n"));
}

#[test]
fn listing_heals_malformed_gamescope_line() {
    let dir = tempdir().expect("tempdir");
    scbconf(dir.path()).arg("init").assert().success();
    let launcher = dir.path().join("scopebuddy").join("AppID").join("lutris");
    fs::create_dir_all(&launcher).unwrap();
    let game = launcher.join("7.conf");
    fs::write(&game, "# Seven\nSCB_GAMESCOPE_ARGS=1920\n").unwrap();

    scbconf(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("lutris/7.conf\tSeven"));
    assert_eq!(
        fs::read_to_string(&game).unwrap(),
        "# Seven\n#SCBGUI_ERROR_PREVENTATION!#SCB_GAMESCOPE_ARGS=1920\nSCB_GAMESCOPE_ARGS=\"\"\n"
    );
}
