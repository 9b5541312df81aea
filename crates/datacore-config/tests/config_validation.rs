//! Config validation tests for datacore-config.
// crates/datacore-config/tests/config_validation.rs
// =============================================================================
// Module: Config Validation Tests
// Description: Defaults, limits, and fail-closed validation rules.
// Purpose: Ensure invalid companion configuration never loads.
// =============================================================================

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use datacore_config::CompanionConfig;
use datacore_config::DEFAULT_GROUP_CONTAINER_ID;
use datacore_config::LogSinkKind;
use datacore_store_sqlite::DEFAULT_BUSY_TIMEOUT_MS;
use datacore_store_sqlite::SqliteStoreMode;
use datacore_store_sqlite::SqliteSyncMode;

mod common;

use crate::common::TestResult;
use crate::common::assert_invalid;
use crate::common::minimal_config;

#[test]
fn empty_config_uses_defaults() -> TestResult {
    let config = minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.address().is_some() {
        return Err("base address should default to unset".to_string());
    }
    if config.container.group_container_id != DEFAULT_GROUP_CONTAINER_ID {
        return Err("unexpected default container id".to_string());
    }
    if config.transport.request_timeout() != Duration::from_secs(10) {
        return Err("request timeout should default to 10s".to_string());
    }
    if config.transport.resource_timeout() != Duration::from_secs(20) {
        return Err("resource timeout should default to 20s".to_string());
    }
    if config.scheduler.refresh_interval() != Duration::from_secs(30 * 60) {
        return Err("refresh interval should default to 30 minutes".to_string());
    }
    if config.logging.sink != LogSinkKind::Stderr {
        return Err("logging should default to stderr".to_string());
    }
    Ok(())
}

#[test]
fn full_config_parses() -> TestResult {
    let config = CompanionConfig::from_toml(
        r#"
        [server]
        base_address = "http://host:5000"

        [container]
        group_container_id = "group.example"
        root = "/var/lib/datacore"

        [transport]
        request_timeout_ms = 5000
        resource_timeout_ms = 15000
        relay_reply_timeout_ms = 20000
        user_agent = "companion-test/1.0"

        [scheduler]
        refresh_interval_secs = 900

        [logging]
        sink = "file"
        path = "events.jsonl"
        "#,
    )
    .map_err(|err| err.to_string())?;
    if config.server.address() != Some("http://host:5000") {
        return Err("base address not parsed".to_string());
    }
    let expected = PathBuf::from("/var/lib/datacore/group.example/datacore-cache.sqlite");
    if config.container.cache_path() != expected {
        return Err(format!("unexpected cache path {}", config.container.cache_path().display()));
    }
    Ok(())
}

#[test]
fn cache_section_reaches_sqlite_config() -> TestResult {
    let config = CompanionConfig::from_toml(
        r#"
        [container]
        root = "/data"

        [cache]
        busy_timeout_ms = 750
        journal_mode = "delete"
        sync_mode = "full"
        "#,
    )
    .map_err(|err| err.to_string())?;
    let sqlite = config.sqlite_cache_config();
    if sqlite.path != PathBuf::from("/data/group.datacore.companion/datacore-cache.sqlite") {
        return Err(format!("unexpected cache path {}", sqlite.path.display()));
    }
    if sqlite.busy_timeout_ms != 750 {
        return Err("busy timeout not carried into sqlite config".to_string());
    }
    if sqlite.journal_mode != SqliteStoreMode::Delete || sqlite.sync_mode != SqliteSyncMode::Full {
        return Err("pragmas not carried into sqlite config".to_string());
    }
    Ok(())
}

#[test]
fn cache_section_defaults_to_wal_normal() -> TestResult {
    let config = minimal_config().map_err(|err| err.to_string())?;
    let sqlite = config.sqlite_cache_config();
    if sqlite.busy_timeout_ms != DEFAULT_BUSY_TIMEOUT_MS {
        return Err("busy timeout should default to the store default".to_string());
    }
    if sqlite.journal_mode != SqliteStoreMode::Wal || sqlite.sync_mode != SqliteSyncMode::Normal {
        return Err("pragmas should default to wal and normal".to_string());
    }
    Ok(())
}

#[test]
fn cache_busy_timeout_is_bounded() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.cache.busy_timeout_ms = 0;
    assert_invalid(config.validate(), "cache.busy_timeout_ms")?;
    assert_invalid(
        CompanionConfig::from_toml("[cache]\njournal_mode = \"memory\"\n"),
        "parse error",
    )
}

#[test]
fn empty_base_address_means_unset() -> TestResult {
    let config = CompanionConfig::from_toml("[server]\nbase_address = \"  \"\n")
        .map_err(|err| err.to_string())?;
    if config.server.address().is_some() {
        return Err("blank address should be unset".to_string());
    }
    Ok(())
}

#[test]
fn base_address_must_be_http() -> TestResult {
    assert_invalid(
        CompanionConfig::from_toml("[server]\nbase_address = \"ftp://host\"\n"),
        "must use http or https",
    )?;
    assert_invalid(
        CompanionConfig::from_toml("[server]\nbase_address = \"host:5000\"\n"),
        "server.base_address",
    )?;
    Ok(())
}

#[test]
fn base_address_rejects_credentials() -> TestResult {
    assert_invalid(
        CompanionConfig::from_toml("[server]\nbase_address = \"http://user:pw@host\"\n"),
        "must not embed credentials",
    )
}

#[test]
fn container_id_must_be_single_component() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.container.group_container_id = "../escape".to_string();
    assert_invalid(config.validate(), "single path component")?;
    config.container.group_container_id = String::new();
    assert_invalid(config.validate(), "must be non-empty")?;
    config.container.group_container_id = "x".repeat(300);
    assert_invalid(config.validate(), "exceeds max length")?;
    Ok(())
}

#[test]
fn timeouts_are_bounded() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.transport.request_timeout_ms = 50;
    assert_invalid(config.validate(), "transport.request_timeout_ms")?;
    config.transport.request_timeout_ms = 10_000;
    config.transport.resource_timeout_ms = 200_000;
    assert_invalid(config.validate(), "transport.resource_timeout_ms")?;
    config.transport.resource_timeout_ms = 5_000;
    assert_invalid(config.validate(), "must be >= request_timeout_ms")?;
    Ok(())
}

#[test]
fn refresh_interval_is_bounded() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.scheduler.refresh_interval_secs = 10;
    assert_invalid(config.validate(), "scheduler.refresh_interval_secs")?;
    config.scheduler.refresh_interval_secs = 90_000;
    assert_invalid(config.validate(), "scheduler.refresh_interval_secs")?;
    Ok(())
}

#[test]
fn file_logging_requires_path() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.logging.sink = LogSinkKind::File;
    assert_invalid(config.validate(), "requires logging.path")?;
    config.logging.sink = LogSinkKind::Disabled;
    config.logging.path = Some(PathBuf::from("events.jsonl"));
    assert_invalid(config.validate(), "only valid with sink")?;
    Ok(())
}

#[test]
fn unknown_sink_fails_to_parse() -> TestResult {
    assert_invalid(CompanionConfig::from_toml("[logging]\nsink = \"syslog\"\n"), "parse error")
}

#[test]
fn load_reads_file_and_rejects_oversize() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("datacore-companion.toml");
    fs::write(&path, "[server]\nbase_address = \"https://datacore.local\"\n")
        .map_err(|err| err.to_string())?;
    let config = CompanionConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.server.address() != Some("https://datacore.local") {
        return Err("address not loaded".to_string());
    }

    let oversized = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    fs::write(&oversized, padding).map_err(|err| err.to_string())?;
    assert_invalid(CompanionConfig::load(Some(&oversized)), "exceeds size limit")?;

    let missing = dir.path().join("missing.toml");
    assert_invalid(CompanionConfig::load(Some(&missing)), "config io error")?;

    let binary = dir.path().join("binary.toml");
    fs::write(&binary, [0xff_u8, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    assert_invalid(CompanionConfig::load(Some(&binary)), "must be utf-8")?;
    Ok(())
}
