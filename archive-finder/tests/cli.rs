use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn org_id_is_required() {
    let mut cmd = Command::cargo_bin("archive-finder").expect("Binary exists");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--org-id"));
}

#[test]
fn unreadable_config_fails_before_scanning() {
    let mut cmd = Command::cargo_bin("archive-finder").expect("Binary exists");
    cmd.args(["--org-id", "123", "--config", "definitely-missing.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

/// End-to-end runs against shell scripts standing in for `gcloud` and `gsutil`.
#[cfg(unix)]
mod fake_cloud {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const GCLOUD: &str = r#"#!/bin/sh
case "$1 $2" in
  "auth list")
    if [ -n "$FAKE_NO_ACCOUNT" ]; then exit 0; fi
    echo "tester@example.com" ;;
  "asset search-all-resources")
    if [ -n "$FAKE_NO_PROJECTS" ]; then exit 0; fi
    printf 'proj-a\nproj-locked\nproj-empty\n' ;;
  "projects describe")
    if [ "$3" = "proj-locked" ]; then echo "PERMISSION_DENIED" >&2; exit 1; fi
    echo "$3" ;;
  *)
    echo "unexpected gcloud call: $*" >&2; exit 2 ;;
esac
"#;

    const GSUTIL: &str = r#"#!/bin/sh
if [ "$1" = "ls" ] && [ "$2" = "-p" ]; then
  case "$3" in
    proj-a) printf 'gs://bucket-a/\ngs://angels-bbops-video-dr/\n' ;;
    *) exit 0 ;;
  esac
elif [ "$1" = "ls" ] && [ "$2" = "-r" ]; then
  case "$3" in
    'gs://bucket-a/*.zip') printf 'gs://bucket-a/backup.zip\ngs://bucket-a/old/logs.zip\n' ;;
    'gs://bucket-a/*.gz') printf 'gs://bucket-a/dump.sql.gz\n' ;;
    *) echo "CommandException: One or more URLs matched no objects." >&2; exit 1 ;;
  esac
else
  echo "unexpected gsutil call: $*" >&2; exit 2
fi
"#;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).expect("Writing fake script failed");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Making fake script executable failed");
        path
    }

    /// Creates the fake CLIs and a config file pointing at them.
    fn setup() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("Creating temp dir failed");
        let gcloud = write_script(dir.path(), "gcloud", GCLOUD);
        let gsutil = write_script(dir.path(), "gsutil", GSUTIL);
        let config = dir.path().join("config.yaml");
        fs::write(
            &config,
            format!(
                "gcloud_bin: {}\ngsutil_bin: {}\nconcurrency: 2\n",
                gcloud.display(),
                gsutil.display()
            ),
        )
        .expect("Writing config failed");
        (dir, config)
    }

    #[test]
    fn full_scan_writes_report_and_denied_list() {
        let (dir, config) = setup();
        let report = dir.path().join("report.csv");
        let errors = dir.path().join("errors.txt");

        let mut cmd = Command::cargo_bin("archive-finder").expect("Binary exists");
        cmd.arg("--org-id")
            .arg("123")
            .arg("--config")
            .arg(&config)
            .arg("--output")
            .arg(&report)
            .arg("--errors-output")
            .arg(&errors)
            .env("RUST_LOG", "warn");

        cmd.assert()
            .success()
            .stdout(predicate::str::contains("Using account: tester@example.com"))
            .stdout(predicate::str::contains("Found 3 projects"))
            .stdout(predicate::str::contains("Found 3 archive files."))
            .stdout(predicate::str::contains(
                "Found 1 projects with permission issues.",
            ))
            .stdout(predicate::str::contains(
                "Projects with permission issues have been saved to:",
            ));

        assert_eq!(
            fs::read_to_string(&report).unwrap(),
            "project_id,bucket_url,file_type,file_path\n\
             proj-a,gs://bucket-a/,zip,gs://bucket-a/backup.zip\n\
             proj-a,gs://bucket-a/,zip,gs://bucket-a/old/logs.zip\n\
             proj-a,gs://bucket-a/,gz,gs://bucket-a/dump.sql.gz\n"
        );
        assert_eq!(
            fs::read_to_string(&errors).unwrap(),
            "# Projects with permission issues\nproj-locked\n"
        );
    }

    #[test]
    fn default_output_names_are_timestamped() {
        let (dir, config) = setup();

        let mut cmd = Command::cargo_bin("archive-finder").expect("Binary exists");
        cmd.current_dir(dir.path())
            .args(["--org-id", "123", "--config"])
            .arg(&config)
            .env("RUST_LOG", "warn");
        cmd.assert().success();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(
            names
                .iter()
                .any(|n| n.starts_with("archive_files_") && n.ends_with(".csv")),
            "no report in {names:?}"
        );
        assert!(
            names
                .iter()
                .any(|n| n.starts_with("permission_errors_") && n.ends_with(".txt")),
            "no errors file in {names:?}"
        );
    }

    #[test]
    fn missing_account_is_fatal() {
        let (dir, config) = setup();

        let mut cmd = Command::cargo_bin("archive-finder").expect("Binary exists");
        cmd.current_dir(dir.path())
            .args(["--org-id", "123", "--config"])
            .arg(&config)
            .env("FAKE_NO_ACCOUNT", "1");
        cmd.assert()
            .failure()
            .stderr(predicate::str::contains("no active gcloud account"))
            .stderr(predicate::str::contains("roles/asset.viewer").not());
    }

    #[test]
    fn fatal_errors_are_reported_once() {
        let (dir, config) = setup();

        let mut cmd = Command::cargo_bin("archive-finder").expect("Binary exists");
        cmd.current_dir(dir.path())
            .args(["--org-id", "123", "--config"])
            .arg(&config)
            .env("FAKE_NO_ACCOUNT", "1");
        let output = cmd.output().unwrap();
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert_eq!(stderr.matches("no active gcloud account").count(), 1, "{stderr}");

        let mut cmd = Command::cargo_bin("archive-finder").expect("Binary exists");
        cmd.current_dir(dir.path())
            .args(["--org-id", "123", "--config"])
            .arg(&config)
            .env("FAKE_NO_PROJECTS", "1");
        let output = cmd.output().unwrap();
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert_eq!(stderr.matches("no projects found in organization 123").count(), 1, "{stderr}");
        assert_eq!(stderr.matches("roles/asset.viewer").count(), 1, "{stderr}");
    }

    #[test]
    fn empty_organization_prints_required_roles() {
        let (dir, config) = setup();
        let errors = dir.path().join("errors.txt");

        let mut cmd = Command::cargo_bin("archive-finder").expect("Binary exists");
        cmd.current_dir(dir.path())
            .args(["--org-id", "123", "--config"])
            .arg(&config)
            .arg("--errors-output")
            .arg(&errors)
            .env("FAKE_NO_PROJECTS", "1");
        cmd.assert()
            .failure()
            .stderr(predicate::str::contains("roles/asset.viewer"))
            .stderr(predicate::str::contains("roles/cloudasset.viewer"))
            .stderr(predicate::str::contains(
                "roles/resourcemanager.organizationViewer",
            ));

        // The denied list is created before enumeration, so it exists even on failure.
        assert_eq!(
            fs::read_to_string(&errors).unwrap(),
            "# Projects with permission issues\n"
        );
    }
}
