use std::fs;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::tempdir;

const PAGE: &str = r#"<html><body><form>
  <div class="form-group">
    <label for="mail">Email Address</label><input id="mail" type="email" name="email">
  </div>
  <div class="form-group">
    <label for="first">First Name</label><input id="first" name="first_name">
  </div>
</form></body></html>"#;

fn formfuse() -> Command {
    let mut cmd = Command::cargo_bin("formfuse").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("FORMFUSE_PROFILE");
    cmd
}

#[test]
fn fill_writes_the_page_and_reports_counts() {
    let dir = tempdir().unwrap();
    let page = dir.path().join("page.html");
    let out = dir.path().join("filled.html");
    let profile = dir.path().join("profile.json");
    let config = dir.path().join("config.yaml");
    fs::write(&page, PAGE).unwrap();
    fs::write(
        &profile,
        r#"{"formFuseProfile": {"identity": {"email": "jane@x.com", "first_name": "Jane"}}}"#,
    )
    .unwrap();
    fs::write(
        &config,
        format!("profile_path: {}\n", profile.display()),
    )
    .unwrap();

    let output = formfuse()
        .arg("--config")
        .arg(&config)
        .args(["--output", "json", "fill", "--page"])
        .arg(&page)
        .arg("--write")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["ok"], true);
    assert_eq!(report["scanned"], 2);
    assert_eq!(report["filled"], 2);
    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains(r#"value="jane@x.com""#));
    assert!(html.contains(r#"value="Jane""#));
}

#[test]
fn profile_set_then_show_through_env_location() {
    let dir = tempdir().unwrap();
    let profile = dir.path().join("nested").join("profile.json");

    formfuse()
        .env("FORMFUSE_PROFILE", &profile)
        .args(["profile", "set", "work_auth.requires_sponsorship", "N"])
        .assert()
        .success();

    let output = formfuse()
        .env("FORMFUSE_PROFILE", &profile)
        .args(["--output", "json", "profile", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["work_auth"]["requires_sponsorship"], "no");
    assert_eq!(shown["address"]["country"], "United States");

    formfuse()
        .env("FORMFUSE_PROFILE", &profile)
        .args(["profile", "set", "identity.favorite_color", "blue"])
        .assert()
        .failure();
}

#[test]
fn match_is_a_dry_run() {
    let dir = tempdir().unwrap();
    let page = dir.path().join("page.html");
    fs::write(&page, PAGE).unwrap();

    let output = formfuse()
        .env("FORMFUSE_PROFILE", dir.path().join("profile.json"))
        .args(["--output", "json", "match", "--page"])
        .arg(&page)
        .output()
        .unwrap();
    assert!(output.status.success());
    let plans: Value = serde_json::from_slice(&output.stdout).unwrap();
    let paths: Vec<&str> = plans
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|plan| plan["path"].as_str())
        .collect();
    assert_eq!(paths, vec!["identity.email", "identity.first_name"]);
    assert_eq!(fs::read_to_string(&page).unwrap(), PAGE);
}

#[test]
fn version_prints_build_metadata() {
    let output = formfuse().args(["--output", "json", "version"]).output().unwrap();
    assert!(output.status.success());
    let info: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
    assert!(info["git_hash"].is_string());
}
