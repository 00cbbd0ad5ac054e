//! Integration tests that run the `sfc-loader` binary.

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sfc-loader"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run sfc-loader")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_extract_json() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("App.vue"),
        "<template>\n<p/>\n</template>\n<script>\nexport default {}\n</script>\n",
    )
    .unwrap();

    let output = run(dir.path(), &["extract", "App.vue", "--output", "json"]);
    assert!(output.status.success(), "{output:?}");

    let sections: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(sections[0]["tag"], "template");
    assert_eq!(sections[1]["tag"], "script");
    assert_eq!(sections[1]["offset"], 4);
    assert_eq!(sections[1]["text"], "\nexport default {}\n");
}

#[test]
fn test_compile_json_has_map() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("App.vue"), "<script>\nexport default {}\n</script>\n").unwrap();

    let output = run(dir.path(), &["compile", "App.vue", "--output", "json"]);
    assert!(output.status.success(), "{output:?}");

    let module: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(module["code"], "\nexport default {}\n");
    assert_eq!(module["map"]["version"], 3);
    assert_eq!(module["map"]["names"][0], "export");

    let output = run(dir.path(), &["compile", "App.vue", "--no-maps", "--output", "json"]);
    let module: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(module["map"].is_null());
}

#[test]
fn test_check_reports_failures() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src/node_modules")).unwrap();
    fs::write(dir.path().join("src/Good.vue"), "<script>\nexport default {}\n</script>\n").unwrap();
    fs::write(dir.path().join("src/Bad.vue"), "<script lang=\"coffee\">x = 1</script>\n").unwrap();
    fs::write(dir.path().join("src/node_modules/Dep.vue"), "<script>").unwrap();

    let output = run(dir.path(), &["check"]);
    assert_eq!(output.status.code(), Some(1), "{output:?}");
    assert!(stdout(&output).contains("Checked 2 components: 1 loaded, 1 failed"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Bad.vue"), "{stderr}");
    assert!(stderr.contains("sfc-transpile-coffee"), "{stderr}");
}

#[test]
fn test_check_uses_configured_extension() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("sfc-loader.json"), r#"{ "extension": "sfc" }"#).unwrap();
    fs::write(dir.path().join("A.sfc"), "<script>\nlet a\n</script>\n").unwrap();
    fs::write(dir.path().join("B.vue"), "<script lang=\"coffee\">x</script>\n").unwrap();

    let output = run(dir.path(), &["check"]);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout(&output).contains("Checked 1 components: 1 loaded, 0 failed"));
}
