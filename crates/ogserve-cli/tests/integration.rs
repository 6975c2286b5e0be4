#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ogserve(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ogserve").unwrap();
    cmd.current_dir(dir.path()).env("OGSERVE_ROOT", dir.path());
    cmd
}

fn seed_article(dir: &TempDir, slug: &str, title: &str) {
    let news_dir = dir.path().join("assets/news");
    std::fs::create_dir_all(&news_dir).unwrap();
    // Port 9 is the discard service; the fetch fails fast and the card
    // falls back to its plain background.
    let doc = format!(
        r#"{{"slug":"{slug}","title":"{title}","imageUrl":"http://127.0.0.1:9/cover.jpg"}}"#
    );
    std::fs::write(news_dir.join(format!("{slug}.json")), doc).unwrap();
}

// ---------------------------------------------------------------------------
// ogserve --help
// ---------------------------------------------------------------------------

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    ogserve(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("healthcheck"))
        .stdout(predicate::str::contains("supervise"))
        .stdout(predicate::str::contains("render"));
}

// ---------------------------------------------------------------------------
// ogserve config show / validate
// ---------------------------------------------------------------------------

#[test]
fn config_show_reports_effective_settings() {
    let dir = TempDir::new().unwrap();
    ogserve(&dir)
        .args(["config", "show", "--json"])
        .env("OGSERVE_PORT", "4100")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"port\": 4100"))
        .stdout(predicate::str::contains("\"cache\": \"disk\""));
}

#[test]
fn config_show_redacts_the_webhook_secret() {
    let dir = TempDir::new().unwrap();
    ogserve(&dir)
        .args(["config", "show"])
        .env(
            "SLACK_WEBHOOK_URL",
            "https://hooks.slack.com/services/T0/B0/supersecret",
        )
        .assert()
        .success()
        .stdout(predicate::str::contains("<redacted>"))
        .stdout(predicate::str::contains("supersecret").not());
}

#[test]
fn config_validate_passes_on_defaults() {
    let dir = TempDir::new().unwrap();
    ogserve(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_warns_when_caching_is_off() {
    let dir = TempDir::new().unwrap();
    ogserve(&dir)
        .args(["config", "validate"])
        .env("OGSERVE_CACHE", "none")
        .assert()
        .success()
        .stdout(predicate::str::contains("[warning]"))
        .stdout(predicate::str::contains("caching is disabled"));
}

#[test]
fn malformed_environment_fails_fast() {
    let dir = TempDir::new().unwrap();
    ogserve(&dir)
        .args(["config", "validate"])
        .env("OGSERVE_PORT", "not-a-number")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OGSERVE_PORT"));
}

// ---------------------------------------------------------------------------
// ogserve render
// ---------------------------------------------------------------------------

#[test]
fn render_writes_card_to_disk() {
    let dir = TempDir::new().unwrap();
    seed_article(&dir, "launch-day", "Launch Day");

    ogserve(&dir).args(["render", "launch-day"]).assert().success();

    let card = dir.path().join("generated/news_launch-day.svg");
    let svg = std::fs::read_to_string(card).unwrap();
    assert!(svg.contains("Launch Day"));
}

#[test]
fn render_honors_an_explicit_out_path() {
    let dir = TempDir::new().unwrap();
    seed_article(&dir, "road-trip", "Road Trip");

    ogserve(&dir)
        .args(["render", "road-trip", "--out", "cards/road-trip.svg"])
        .assert()
        .success();

    assert!(dir.path().join("cards/road-trip.svg").exists());
}

#[test]
fn render_json_reports_cache_state() {
    let dir = TempDir::new().unwrap();
    seed_article(&dir, "fresh-cut", "Fresh Cut");

    ogserve(&dir)
        .args(["render", "fresh-cut", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"from_cache\": false"));

    ogserve(&dir)
        .args(["render", "fresh-cut", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"from_cache\": true"));
}

#[test]
fn render_unknown_slug_fails() {
    let dir = TempDir::new().unwrap();
    ogserve(&dir)
        .args(["render", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("news not found"));
}

#[test]
fn render_rejects_a_bad_slug() {
    let dir = TempDir::new().unwrap();
    ogserve(&dir)
        .args(["render", "Not A Slug"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid slug"));
}

// ---------------------------------------------------------------------------
// ogserve healthcheck
// ---------------------------------------------------------------------------

#[test]
fn healthcheck_passes_against_a_live_endpoint() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/checks/healthz")
        .with_status(200)
        .with_body("OK")
        .create();

    let url = format!("{}/checks/healthz", server.url());
    ogserve(&dir)
        .args(["healthcheck", "--url", &url])
        .assert()
        .success();
    mock.assert();
}

#[test]
fn healthcheck_fails_when_nothing_listens() {
    let dir = TempDir::new().unwrap();
    ogserve(&dir)
        .args([
            "healthcheck",
            "--url",
            "http://127.0.0.1:9/checks/healthz",
            "--timeout",
            "2",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("probe failed"));
}

// ---------------------------------------------------------------------------
// ogserve cache clear
// ---------------------------------------------------------------------------

#[test]
fn cache_clear_reports_dropped_cards() {
    let dir = TempDir::new().unwrap();
    seed_article(&dir, "old-news", "Old News");
    ogserve(&dir).args(["render", "old-news"]).assert().success();

    ogserve(&dir)
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dropped 1"));

    assert!(!dir.path().join("generated/news_old-news.svg").exists());
}

// ---------------------------------------------------------------------------
// ogserve supervise
// ---------------------------------------------------------------------------

#[test]
fn supervise_propagates_the_child_exit_code() {
    let dir = TempDir::new().unwrap();
    ogserve(&dir)
        .args(["supervise", "--grace", "1", "--", "true"])
        .assert()
        .success();

    ogserve(&dir)
        .args(["supervise", "--grace", "1", "--", "sh", "-c", "exit 7"])
        .assert()
        .code(7);
}

#[test]
fn supervise_requires_a_command() {
    let dir = TempDir::new().unwrap();
    ogserve(&dir).arg("supervise").assert().failure();
}
