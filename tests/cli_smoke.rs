//! Smoke tests for the orgdesk binary.
//!
//! Each test runs with its own HOME so config and session files never touch
//! the real profile. The endpoint points at a closed port; none of these
//! commands may need the network.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use orgdesk::auth::{CREDENTIAL_KEY, IDENTITY_KEY};
use orgdesk::secrets::{FileSecretStore, SecretStore};

struct Home {
    dir: TempDir,
}

impl Home {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// A command for running orgdesk inside this home.
    fn orgdesk(&self) -> Command {
        let mut cmd = Command::cargo_bin("orgdesk").unwrap();
        cmd.env("HOME", self.dir.path())
            .env("ORGDESK_GRAPHQL_URL", "http://127.0.0.1:9/graphql")
            .env_remove("ORGDESK_CONFIG")
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("ORGDESK_LOG");
        cmd
    }

    fn secrets(&self) -> FileSecretStore {
        FileSecretStore::with_path(self.dir.path().join(".orgdesk").join("secrets.toml"))
    }

    fn store_session(&self, username: &str) {
        let identity = format!(r#"{{"username":"{}"}}"#, username);
        self.secrets()
            .set_many(&[(CREDENTIAL_KEY, "tok-smoke"), (IDENTITY_KEY, &identity)])
            .unwrap();
    }
}

#[test]
fn version_flag_works() {
    Home::new()
        .orgdesk()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("orgdesk"));
}

#[test]
fn status_when_logged_out() {
    Home::new()
        .orgdesk()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in (view: /login)"));
}

#[test]
fn status_reads_stored_session_without_showing_the_token() {
    let home = Home::new();
    home.store_session("ada");
    home.orgdesk()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as ada (view: /departments)"))
        .stdout(predicate::str::contains("tok-smoke").not());
}

#[test]
fn protected_commands_require_login() {
    Home::new()
        .orgdesk()
        .args(["departments", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"));
}

#[test]
fn logout_clears_stored_session() {
    let home = Home::new();
    home.store_session("ada");
    home.orgdesk()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out."));
    assert_eq!(home.secrets().get(CREDENTIAL_KEY).unwrap(), None);

    home.orgdesk()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in."));
}

#[test]
fn login_needs_a_username_when_not_interactive() {
    Home::new()
        .orgdesk()
        .args(["login", "--password-stdin"])
        .write_stdin("pw\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--username is required"));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_login_shows_the_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Invalid credentials" }]
        })))
        .mount(&server)
        .await;

    let home = Home::new();
    home.orgdesk()
        .env("ORGDESK_GRAPHQL_URL", format!("{}/graphql", server.uri()))
        .args(["--no-interactive", "login", "--username", "ada", "--password-stdin"])
        .write_stdin("wrong\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials"))
        .stderr(predicate::str::contains("session expired").not());
    assert_eq!(home.secrets().get(CREDENTIAL_KEY).unwrap(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_token_reports_the_expired_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let home = Home::new();
    home.store_session("ada");
    home.orgdesk()
        .env("ORGDESK_GRAPHQL_URL", format!("{}/graphql", server.uri()))
        .args(["departments", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("session expired or was rejected"));
    assert_eq!(home.secrets().get(CREDENTIAL_KEY).unwrap(), None);
}

#[test]
fn config_set_then_get() {
    let home = Home::new();
    home.orgdesk()
        .args(["config", "set", "page_size", "25"])
        .assert()
        .success();
    assert!(home.dir.path().join(".orgdesk/config.toml").exists());

    home.orgdesk()
        .args(["config", "get", "page_size"])
        .assert()
        .success()
        .stdout("25\n");
}

#[test]
fn config_rejects_bad_values_and_keys() {
    let home = Home::new();
    home.orgdesk()
        .args(["config", "set", "page_size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("page_size must be between 1 and 100"));
    home.orgdesk()
        .args(["config", "get", "theme"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown config key: theme"));
}

#[test]
fn config_list_shows_every_key() {
    Home::new()
        .orgdesk()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("endpoint = http://127.0.0.1:9/graphql"))
        .stdout(predicate::str::contains("page_size = 10"))
        .stdout(predicate::str::contains("auth.match_unauthorized_text = true"));
}

#[test]
fn page_zero_is_rejected_by_the_parser() {
    Home::new()
        .orgdesk()
        .args(["departments", "list", "--page", "0"])
        .assert()
        .failure();
}

#[test]
fn completion_bash() {
    Home::new()
        .orgdesk()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("orgdesk"));
}
