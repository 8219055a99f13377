//! README probe, debug log and per-step artifacts on the local filesystem.

mod common;

use std::sync::Arc;

use assert_fs::prelude::*;

use common::{ScriptedExecutor, TestHarness};
use http_spider::{
    FailureRule, LocalArtifactStore, Spider, SpiderConfig, SpiderError, Step, StorageError,
};

const LOGIN: &str = "https://example.com/login";
const ACCOUNT: &str = "https://example.com/account";

#[test]
fn test_readme_probe_written_once() {
    let harness = TestHarness::new();
    let first = harness.spider();
    let readme = first.readme_contents().unwrap();
    assert!(readme.starts_with('['));
    assert!(readme.ends_with("] README.md file created."));

    // A second spider on the same storage keeps the existing probe.
    let second = harness.spider();
    assert_eq!(second.readme_contents().unwrap(), readme);
}

#[test]
fn test_readme_probe_fails_on_unwritable_storage() {
    let temp = assert_fs::TempDir::new().unwrap();
    let blocker = temp.child("not-a-directory");
    blocker.write_str("plain file").unwrap();

    let result = Spider::new(
        SpiderConfig::new(blocker.path()),
        Arc::new(ScriptedExecutor::new()),
        Box::new(LocalArtifactStore::new(blocker.path())),
    );

    match result {
        Err(SpiderError::Storage(StorageError::ReadMeNotWritten { path, .. })) => {
            assert_eq!(path, blocker.path());
        }
        Err(other) => panic!("Expected ReadMeNotWritten, got {:?}", other),
        Ok(_) => panic!("Expected ReadMeNotWritten, got a spider"),
    }
}

#[tokio::test]
async fn test_debug_disabled_writes_no_debug_files() {
    let harness = TestHarness::new();
    harness.executor.respond(LOGIN, 200, "hello");

    let mut spider = harness.spider();
    spider.add_step("login", Step::get(LOGIN)).unwrap();
    spider.run().await.unwrap();

    assert!(harness.run_directories().is_empty());
    assert!(!harness.storage_dir.join("debug.log").exists());
    assert_eq!(TestHarness::file_names(&harness.storage_dir), vec!["README.md"]);
    assert!(matches!(
        spider.debug_log_contents(),
        Err(StorageError::DebugLogMissing)
    ));
}

#[tokio::test]
async fn test_debug_artifacts_named_per_step() {
    let harness = TestHarness::new();
    harness.executor.respond(LOGIN, 200, "<form>login</form>");
    harness.executor.respond(ACCOUNT, 200, "<h1>account</h1>");

    let mut spider = harness.debug_spider();
    spider.add_step("login", Step::get(LOGIN)).unwrap();
    spider.add_step("account", Step::get(ACCOUNT)).unwrap();
    spider.run().await.unwrap();

    let run_dirs = harness.run_directories();
    assert_eq!(run_dirs.len(), 1);
    let run_dir = &run_dirs[0];
    assert_eq!(
        run_dir.file_name().unwrap().to_str().unwrap(),
        spider.run_directory().unwrap()
    );

    let names = TestHarness::file_names(run_dir);
    assert_eq!(names.len(), 2);
    let login = names
        .iter()
        .find(|n| n.ends_with("_1_login.dprc"))
        .expect("login artifact");
    let account = names
        .iter()
        .find(|n| n.ends_with("_2_account.dprc"))
        .expect("account artifact");
    assert!(login.starts_with("request_"));

    let run_dir = assert_fs::fixture::ChildPath::new(run_dir);
    run_dir.child(login).assert("<form>login</form>");
    run_dir.child(account).assert("<h1>account</h1>");
}

#[cfg(unix)]
#[test]
fn test_run_directory_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let harness = TestHarness::new();
    let spider = harness.debug_spider();
    let dir = harness.storage_dir.join(spider.run_directory().unwrap());

    let mode = std::fs::metadata(dir).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o700);
}

#[tokio::test]
async fn test_debug_log_records_the_run() {
    let harness = TestHarness::new();
    harness.executor.respond(LOGIN, 200, "Invalid password");

    let mut step = Step::post(LOGIN);
    step.add_failure_rule(FailureRule::regex("Invalid").unwrap(), Some("bad_login"));

    let mut spider = harness.debug_spider();
    spider.add_step("login", step).unwrap();
    assert!(spider.run().await.is_err());

    let log = spider.debug_log_contents().unwrap();
    assert!(log.starts_with('['));
    assert!(log.contains("Debug Log file created."));
    assert!(log.contains("Step added. [0] [login]"));
    assert!(log.contains("Failure rule [bad_login] triggered"));
    assert!(log.contains("Error in step [login]: bad_login"));

    // The rejected body is still kept as an artifact for inspection.
    let run_dir = harness.storage_dir.join(spider.run_directory().unwrap());
    let names = TestHarness::file_names(&run_dir);
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with("_1_login.dprc"));
}

#[tokio::test]
async fn test_step_names_cannot_escape_run_directory() {
    let harness = TestHarness::new();
    let mut spider = harness.debug_spider();
    spider.add_step("../../escape", Step::get(LOGIN)).unwrap();
    spider.run().await.unwrap();

    let run_dir = harness.storage_dir.join(spider.run_directory().unwrap());
    let names = TestHarness::file_names(&run_dir);
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with("_1_.._.._escape.dprc"));
}

#[tokio::test]
async fn test_fresh_debug_spider_on_same_storage() {
    let harness = TestHarness::new();
    harness.executor.respond(LOGIN, 200, "<form>login</form>");

    let mut first = harness.debug_spider();
    first.add_step("login", Step::get(LOGIN)).unwrap();
    first.run().await.unwrap();

    // A retry with a new spider, usually within the same second.
    let mut second = harness.debug_spider();
    second.add_step("login", Step::get(LOGIN)).unwrap();
    second.run().await.unwrap();

    assert_ne!(first.run_directory(), second.run_directory());
    let run_dirs = harness.run_directories();
    assert_eq!(run_dirs.len(), 2);
    for dir in run_dirs {
        let names = TestHarness::file_names(&dir);
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with("_1_login.dprc"));
    }
}
