use std::path::Path;
use std::process::{Command, Output};

fn dash(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dash"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .expect("run dash")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn widgets_lists_bundled_kinds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dash(dir.path(), &["widgets"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Custom List (custom_list) [multi]"));
    assert!(text.contains("(scientific_calculator)"));
    assert!(dir.path().join("settings.json").exists());
}

#[test]
fn added_widgets_survive_between_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dash(
        dir.path(),
        &["add", "custom_list", "--title", "Groceries", "--area", "left"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Added widget 'custom_list_groceries'"));

    let output = dash(dir.path(), &["add", "clock"]);
    assert!(output.status.success());

    let output = dash(dir.path(), &["show"]);
    let text = stdout(&output);
    assert!(text.contains("[0] Dashboard 1 - 2 widgets"));
    assert!(text.contains("custom_list_groceries (custom_list) [left]"));
    assert!(text.contains("clock (clock) [right]"));
}

#[test]
fn rename_and_remove_widgets() {
    let dir = tempfile::tempdir().expect("tempdir");
    dash(dir.path(), &["add", "custom_list", "--title", "Foo"]);

    let output = dash(dir.path(), &["rename-widget", "custom_list_foo", "Bar"]);
    assert!(stdout(&output).contains("to 'custom_list_bar'"));

    let output = dash(dir.path(), &["remove", "custom_list_bar"]);
    assert!(output.status.success());
    let output = dash(dir.path(), &["show"]);
    assert!(stdout(&output).contains("(none)"));

    let output = dash(dir.path(), &["remove", "custom_list_bar"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("[Dash][ERROR]"));
}

#[test]
fn dashboards_can_be_created_renamed_and_closed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dash(dir.path(), &["new-dashboard", "Ops"]);
    assert!(stdout(&output).contains("Created dashboard [1]"));
    dash(dir.path(), &["rename-dashboard", "0", "Home"]);

    let text = stdout(&dash(dir.path(), &["show"]));
    assert!(text.contains("[0] Home"));
    assert!(text.contains("[1] Ops"));

    assert!(dash(dir.path(), &["close-dashboard", "1"]).status.success());
    let output = dash(dir.path(), &["close-dashboard", "0"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("last dashboard"));
}

#[test]
fn export_import_and_reset() {
    let dir = tempfile::tempdir().expect("tempdir");
    let other = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("layout-export.json");

    dash(dir.path(), &["add", "tree_list", "--title", "Plan"]);
    let output = dash(dir.path(), &["export", file.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(file.exists());

    let output = dash(other.path(), &["import", file.to_str().unwrap()]);
    assert!(stdout(&output).contains("Imported 1 dashboard(s) with 1 widget(s)"));
    let text = stdout(&dash(other.path(), &["show", "--json-query"]));
    let snapshot: serde_json::Value = serde_json::from_str(&text).expect("snapshot json");
    assert_eq!(snapshot["dashboards"][0]["widgets"][0]["module_name"], "tree_list_plan");

    assert!(dash(other.path(), &["reset"]).status.success());
    let text = stdout(&dash(other.path(), &["show"]));
    assert!(text.contains("Dashboard 1 - 0 widgets"));
}
