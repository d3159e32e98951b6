// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

const MINIMAL: &str = r#"
[remote]
endpoint = "https://assistant.example.edu/v1/chat"
"#;

#[test]
fn minimal_config_uses_defaults() {
    let config = Config::from_toml_str(MINIMAL).unwrap();

    assert_eq!(config.database, PathBuf::from("chatline.db"));
    assert_eq!(config.request_timeout(), Duration::from_secs(30));
    assert_eq!(config.retention(), Duration::from_secs(30 * 24 * 60 * 60));
    assert_eq!(config.sweep_interval(), Duration::from_secs(86_400));
    assert_eq!(config.probe.address, "8.8.8.8:53");
    assert_eq!(config.probe_timeout(), Duration::from_millis(1500));
    assert!(config.seeds.is_empty());
}

#[test]
fn full_config_parses_seeds() {
    let content = r#"
database = "/var/lib/chatline/chat.db"

[remote]
endpoint = "http://localhost:8080/chat"
request_timeout_ms = 5000

[retention]
max_age_days = 7
sweep_interval_secs = 600

[probe]
address = "1.1.1.1:443"
timeout_ms = 250

[[seed]]
query = "duration"
response = "Two years."

[[seed]]
query = "contact"
response = "mca@department.edu"
"#;
    let config = Config::from_toml_str(content).unwrap();

    assert_eq!(config.database, PathBuf::from("/var/lib/chatline/chat.db"));
    assert_eq!(config.request_timeout(), Duration::from_secs(5));
    assert_eq!(config.retention(), Duration::from_secs(7 * 24 * 60 * 60));
    assert_eq!(config.sweep_interval(), Duration::from_secs(600));
    assert_eq!(config.probe.address, "1.1.1.1:443");
    assert_eq!(config.seeds.len(), 2);
    assert_eq!(config.seeds[1], ResponseSeed::new("contact", "mca@department.edu"));
}

#[test]
fn missing_remote_section_is_rejected() {
    let err = Config::from_toml_str("database = \"x.db\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[parameterized(
    bad_scheme = { "[remote]\nendpoint = \"ftp://example.edu\"", "http://" },
    zero_timeout = { "[remote]\nendpoint = \"https://a\"\nrequest_timeout_ms = 0", "request_timeout_ms" },
    zero_retention = { "[remote]\nendpoint = \"https://a\"\n[retention]\nmax_age_days = 0", "max_age_days" },
    zero_interval = { "[remote]\nendpoint = \"https://a\"\n[retention]\nsweep_interval_secs = 0", "sweep_interval_secs" },
    empty_probe = { "[remote]\nendpoint = \"https://a\"\n[probe]\naddress = \" \"", "probe.address" },
    empty_seed_query = { "[remote]\nendpoint = \"https://a\"\n[[seed]]\nquery = \"\"\nresponse = \"r\"", "empty query" },
)]
fn invalid_values_are_rejected(content: &str, expected: &str) {
    let err = Config::from_toml_str(content).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains(expected), "{err}");
}

#[test]
fn load_resolves_relative_database_against_config_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chatline.toml");
    std::fs::write(&path, format!("database = \"data/chat.db\"\n{MINIMAL}")).unwrap();

    let config = Config::load(&path).unwrap();

    if std::env::var_os(DATABASE_ENV).is_none() {
        assert_eq!(config.database, dir.path().join("data/chat.db"));
    }
}

#[test]
fn load_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn env_override_replaces_database() {
    let mut config = Config::new("https://a");
    config.apply_env_override(Some(PathBuf::from("/tmp/override.db")));
    assert_eq!(config.database, PathBuf::from("/tmp/override.db"));
}

#[test]
fn empty_env_override_is_ignored() {
    let mut config = Config::new("https://a");
    config.apply_env_override(Some(PathBuf::new()));
    config.apply_env_override(None);
    assert_eq!(config.database, PathBuf::from("chatline.db"));
}

#[test]
fn config_survives_toml_serialization() {
    let mut config = Config::new("https://assistant.example.edu");
    config.seeds.push(ResponseSeed::new("labs", "Three labs."));

    let text = config.to_toml_string().unwrap();
    let parsed = Config::from_toml_str(&text).unwrap();

    assert_eq!(parsed.remote.endpoint, config.remote.endpoint);
    assert_eq!(parsed.seeds, config.seeds);
}
