use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        };
        for name in ["knee01__a.png", "knee01__b.png", "knee02__a.png", "sub/knee03__a.jpg"] {
            write_file(&ws.images().join(name), "img");
        }
        for name in ["knee01.png", "knee02.png"] {
            write_file(&ws.path("reference").join(name), "ref");
        }
        ws.write_config("config.yml", "[Motion, Noise]", true, 0);
        ws
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn images(&self) -> PathBuf {
        self.path("images")
    }

    fn session(&self) -> PathBuf {
        self.path("session.json")
    }

    fn write_config(
        &self,
        name: &str,
        checkboxes: &str,
        tristate: bool,
        backup_interval: u64,
    ) -> PathBuf {
        let path = self.path(name);
        write_file(
            &path,
            &format!(
                "checkboxes: {checkboxes}\n\
                 radiobuttons_page1:\n  - title: Overall Quality\n    labels: [1, 2, 3, 4]\n\
                 radiobuttons_page2: []\n\
                 tristate_checkboxes: {tristate}\n\
                 max_backups: 2\n\
                 backup_interval: {backup_interval}\n\
                 backup_dir: {}\n\
                 log_dir: {}\n\
                 task: Knee MRI\n",
                self.path("backups").display(),
                self.path("logs").display()
            ),
        );
        path
    }

    fn run(&self, args: &[&str]) -> (bool, String, String) {
        let bin = std::env::var("CARGO_BIN_EXE_speedy-iqa").unwrap_or_else(|_| {
            let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push("target");
            path.push("debug");
            if cfg!(windows) {
                path.push("speedy-iqa.exe");
            } else {
                path.push("speedy-iqa");
            }
            path.to_string_lossy().into_owned()
        });
        let output = Command::new(bin)
            .args(args)
            .env("SPEEDY_IQA_HOME", self.path("home"))
            .env_remove("SPEEDY_IQA_LOG")
            .output()
            .expect("run speedy-iqa");
        (
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        )
    }

    fn ok(&self, args: &[&str]) -> String {
        let (ok, stdout, stderr) = self.run(args);
        assert!(ok, "{args:?} failed\nstderr: {stderr}");
        stdout
    }

    fn init(&self) -> String {
        let images = self.images();
        let reference = self.path("reference");
        let config = self.path("config.yml");
        let session = self.session();
        let (ok, _, stderr) = self.run(&[
            "init",
            "--images",
            images.to_str().unwrap(),
            "--reference",
            reference.to_str().unwrap(),
            "--output",
            session.to_str().unwrap(),
            "--no-shuffle",
            "--config",
            config.to_str().unwrap(),
        ]);
        assert!(ok, "init failed\nstderr: {stderr}");
        stderr
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write test file");
}

fn backup_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("auto_backup_") && n.ends_with(".bak"))
        .collect();
    names.sort();
    names
}

fn json(stdout: &str) -> Value {
    serde_json::from_str(stdout).expect("json output")
}

#[test]
fn init_creates_session_and_reports_missing_references() {
    let ws = Workspace::new();
    let stderr = ws.init();
    assert!(
        stderr.contains("1 of 4 images have no reference image"),
        "stderr: {stderr}"
    );

    let record: Value = json(&fs::read_to_string(ws.session()).unwrap());
    let files = record["files"].as_array().unwrap();
    assert_eq!(files.len(), 4);
    assert_eq!(files[0]["filename"], "knee01__a.png");
    assert_eq!(files[3]["filename"], "sub/knee03__a.jpg");
    assert_eq!(files[0]["rated"], false);
    assert_eq!(files[0]["checkboxes"]["Motion"], 0);
    assert!(files[0]["radiobuttons"]["Overall Quality"].is_null());
    assert_eq!(record["reference_delimiter"], "__");

    let status = json(&ws.ok(&["status", "--json"]));
    assert_eq!(status["task"], "Knee MRI");
    assert_eq!(status["total"], 4);
    assert_eq!(status["pending"], 4);
    assert_eq!(status["current_file"], "knee01__a.png");

    assert!(ws.path("logs").join("speedy_iqa.log").is_file());
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let ws = Workspace::new();
    ws.init();
    let images = ws.images();
    let session = ws.session();
    let (ok, _, stderr) = ws.run(&[
        "init",
        "--images",
        images.to_str().unwrap(),
        "--output",
        session.to_str().unwrap(),
    ]);
    assert!(!ok);
    assert!(stderr.contains("already exists"), "stderr: {stderr}");
}

#[test]
fn annotations_flow_into_csv_export() {
    let ws = Workspace::new();
    ws.init();

    ws.ok(&["check", "Motion", "checked"]);
    ws.ok(&["rate", "Overall Quality", "3"]);
    ws.ok(&["note", "blurry, edge"]);
    ws.ok(&["rotate", "right"]);
    ws.ok(&["next"]);
    ws.ok(&["check", "Noise", "uncertain"]);
    ws.ok(&["next", "--failed"]);

    let status = json(&ws.ok(&["status", "--json"]));
    assert_eq!(status["current_index"], 2);
    assert_eq!(status["rated"], 1);
    assert_eq!(status["failed"], 1);

    let csv = ws.ok(&["export", "--format", "csv"]);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "filename,rated,rotation,notes,motion,noise,overall_quality"
    );
    assert_eq!(lines[1], "knee01__a.png,true,270,\"blurry, edge\",2,0,3");
    assert_eq!(lines[2], "knee01__b.png,FAILED,0,,FAIL,FAIL,");
    assert_eq!(lines[3], "knee02__a.png,false,0,,0,0,");

    let record: Value = json(&fs::read_to_string(ws.session()).unwrap());
    assert_eq!(record["files"][1]["rated"], "FAILED");
    assert_eq!(record["files"][1]["checkboxes"]["Noise"], "FAIL");
    assert_eq!(record["files"][0]["radiobuttons"]["Overall Quality"], 2);
}

#[test]
fn navigation_wraps_and_jumps() {
    let ws = Workspace::new();
    ws.init();

    let shown = json(&ws.ok(&["prev", "--json"]));
    assert_eq!(shown["filename"], "sub/knee03__a.jpg");
    assert_eq!(shown["reference_exists"], false);

    let shown = json(&ws.ok(&["goto", "2", "--json"]));
    assert_eq!(shown["index"], 1);

    let shown = json(&ws.ok(&["goto", "knee02__a.png", "--json"]));
    assert_eq!(shown["index"], 2);
    assert_eq!(shown["reference_exists"], true);

    let (ok, _, stderr) = ws.run(&["goto", "9"]);
    assert!(!ok);
    assert!(stderr.contains("Position 9 is out of range"), "stderr: {stderr}");

    // every image left behind was marked, only the current one is pending
    let pending = json(&ws.ok(&["list", "--pending", "--json"]));
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["filename"], "knee02__a.png");
    assert_eq!(pending[0]["current"], true);

    let out = ws.ok(&["next"]);
    assert!(out.contains("All images have been rated."), "stdout: {out}");
    assert!(out.contains("sub/knee03__a.jpg (4/4)"), "stdout: {out}");
}

#[test]
fn invalid_edits_are_rejected() {
    let ws = Workspace::new();
    ws.init();

    let (ok, _, stderr) = ws.run(&["check", "Motion", "sometimes"]);
    assert!(!ok);
    assert!(stderr.contains("Invalid checkbox state"), "stderr: {stderr}");

    let (ok, _, stderr) = ws.run(&["check", "Blur", "checked"]);
    assert!(!ok);
    assert!(stderr.contains("Unknown finding \"Blur\""), "stderr: {stderr}");

    let (ok, _, stderr) = ws.run(&["rate", "Overall Quality", "5"]);
    assert!(!ok);
    assert!(stderr.contains("is not a label"), "stderr: {stderr}");

    let binary = ws.write_config("binary.yml", "[Motion, Noise]", false, 0);
    let (ok, _, stderr) = ws.run(&[
        "--config",
        binary.to_str().unwrap(),
        "check",
        "Motion",
        "uncertain",
    ]);
    assert!(!ok);
    assert!(stderr.contains("tri-state"), "stderr: {stderr}");
}

#[test]
fn backups_rotate_and_leave_other_files_alone() {
    let ws = Workspace::new();
    ws.init();
    write_file(&ws.path("backups").join("keep.txt"), "mine");
    write_file(
        &ws.path("backups").join("auto_backup_20000101-000000.bak"),
        "{}",
    );
    write_file(
        &ws.path("backups").join("auto_backup_20000102-000000.bak"),
        "{}",
    );

    let out = json(&ws.ok(&["backup", "--json"]));
    assert!(
        out["path"]
            .as_str()
            .unwrap()
            .contains("auto_backup_")
    );

    let mut backups: Vec<String> = fs::read_dir(ws.path("backups"))
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    backups.sort();
    assert!(backups.contains(&"keep.txt".to_string()));
    assert!(!backups.contains(&"auto_backup_20000101-000000.bak".to_string()));
    let count = backups.iter().filter(|n| n.starts_with("auto_backup_")).count();
    assert!((1..=2).contains(&count), "backups: {backups:?}");
}

#[test]
fn validate_reports_every_problem() {
    let ws = Workspace::new();
    ws.init();
    ws.ok(&["check", "Noise", "checked"]);

    let report = json(&ws.ok(&["validate", "--json"]));
    assert_eq!(report["compatible"], true);

    fs::remove_file(ws.images().join("knee02__a.png")).unwrap();
    let narrow = ws.write_config("narrow.yml", "[Motion]", true, 0);
    let (ok, stdout, stderr) = ws.run(&["--config", narrow.to_str().unwrap(), "validate", "--json"]);
    assert!(!ok);
    let report = json(&stdout);
    assert_eq!(report["compatible"], false);
    let problems = report["problems"].as_array().unwrap();
    assert_eq!(problems.len(), 2, "problems: {problems:?}");
    assert!(stderr.contains("Finding \"Noise\" is not defined in the config"));
    assert!(stderr.contains("knee02__a.png does not exist in the image directory"));
}

#[test]
fn summary_counts_ratings() {
    let ws = Workspace::new();
    ws.init();
    ws.ok(&["rate", "Overall Quality", "4"]);
    ws.ok(&["check", "Motion", "checked"]);
    ws.ok(&["next"]);
    ws.ok(&["rate", "Overall Quality", "4"]);
    ws.ok(&["next", "--failed"]);

    let summary = json(&ws.ok(&["summary", "--json"]));
    assert_eq!(summary["total"], 4);
    assert_eq!(summary["viewed"], 2);
    let counts = &summary["categories"][0]["counts"];
    assert_eq!(counts["4"], 2);
    assert_eq!(counts["Blank"], 2);
    assert_eq!(summary["findings"][0]["name"], "Motion");
    assert_eq!(summary["findings"][0]["checked"], 1);
}

#[test]
fn save_as_switches_the_active_session() {
    let ws = Workspace::new();
    ws.init();
    ws.ok(&["next"]);

    let copy = ws.path("copies/session2.json");
    ws.ok(&["save", "--as", copy.to_str().unwrap()]);
    assert!(copy.is_file());

    ws.ok(&["note", "only in the copy"]);
    let original: Value = json(&fs::read_to_string(ws.session()).unwrap());
    let moved: Value = json(&fs::read_to_string(&copy).unwrap());
    assert_eq!(original["files"][1]["notes"], "");
    assert_eq!(moved["files"][1]["notes"], "only in the copy");
}

#[test]
fn config_init_and_show() {
    let ws = Workspace::new();
    let (ok, stdout, _) = ws.run(&["config", "init"]);
    assert!(ok);
    assert!(stdout.contains("Wrote default config"));
    let default_config = ws.path("home").join("config.yml");
    assert!(default_config.is_file());

    let (ok, _, stderr) = ws.run(&["config", "init"]);
    assert!(!ok);
    assert!(stderr.contains("already exists"));

    let shown = json(&ws.ok(&["config", "show", "--json"]));
    assert_eq!(shown["config"]["task"], "General use");
    assert_eq!(shown["config"]["max_backups"], 10);
}

#[test]
fn commands_without_session_explain_what_to_do() {
    let ws = Workspace::new();
    let config = ws.path("config.yml");
    let (ok, _, stderr) = ws.run(&["--config", config.to_str().unwrap(), "status"]);
    assert!(!ok);
    assert!(stderr.contains("No session file given"), "stderr: {stderr}");
}

#[test]
fn sessions_with_missing_images_are_refused() {
    let ws = Workspace::new();
    ws.init();
    fs::remove_file(ws.images().join("knee02__a.png")).unwrap();

    for args in [
        vec!["status"],
        vec!["goto", "knee02__a.png"],
        vec!["note", "lost"],
        vec!["export", "--format", "csv"],
    ] {
        let (ok, stdout, stderr) = ws.run(&args);
        assert!(!ok, "{args:?} succeeded\nstdout: {stdout}");
        assert!(
            stderr.contains("knee02__a.png does not exist in the image directory"),
            "{args:?} stderr: {stderr}"
        );
    }

    let record: Value = json(&fs::read_to_string(ws.session()).unwrap());
    assert_eq!(record["files"][0]["notes"], "");
}

#[test]
fn edits_within_the_backup_interval_do_not_back_up() {
    let ws = Workspace::new();
    ws.write_config("config.yml", "[Motion, Noise]", true, 5);
    ws.init();
    assert_eq!(backup_names(&ws.path("backups")).len(), 1);

    ws.ok(&["note", "first pass"]);
    ws.ok(&["next"]);
    ws.ok(&["check", "Motion", "checked"]);
    ws.ok(&["next"]);

    let names = backup_names(&ws.path("backups"));
    assert_eq!(names.len(), 1, "backups: {names:?}");
}

#[test]
fn csv_export_creates_missing_directories() {
    let ws = Workspace::new();
    ws.init();
    let out = ws.path("exports/2025/session.csv");
    ws.ok(&["export", "--format", "csv", "--output", out.to_str().unwrap()]);
    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("filename,rated,rotation,notes,"), "csv: {csv}");
    assert_eq!(csv.lines().count(), 5);
}
