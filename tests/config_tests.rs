use std::io::Write;
use std::time::Duration;

use pipepool::config::{Config, RateLimitAlgorithm};
use pipepool::error::{ConfigError, Error};
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn loads_every_section_from_file() {
    let file = write_temp_config(
        r#"
[logging]
level = "debug"
format = "json"

[source]
messages = 25
names = ["Ada", "Grace"]
destination_template = "http://localhost:8080/?q={name}"
seed = 7

[limiter]
algorithm = "token_bucket"
rate = 5
wait_time_ms = 250

[pool]
max_connections = 8
check_interval_ms = 1000

[transport]
timeout_ms = 1500
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.source.messages, 25);
    assert_eq!(config.source.names, vec!["Ada", "Grace"]);
    assert_eq!(config.source.seed, Some(7));
    assert_eq!(config.limiter.algorithm, RateLimitAlgorithm::TokenBucket);
    assert_eq!(config.limiter.rate, 5);
    assert_eq!(config.limiter.wait_time(), Duration::from_millis(250));
    assert_eq!(config.pool.max_connections, 8);
    assert_eq!(config.pool.check_interval(), Duration::from_secs(1));
    assert_eq!(config.transport.timeout(), Duration::from_millis(1500));
}

#[test]
fn partial_file_keeps_defaults() {
    let file = write_temp_config("[pool]\nmax_connections = 2\n");

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.pool.max_connections, 2);
    assert_eq!(config.pool.check_interval_ms, 5_000);
    assert_eq!(config.limiter.rate, 1);
    assert_eq!(config.source.messages, 10);
}

#[test]
fn rejects_zero_rate() {
    let file = write_temp_config("[limiter]\nrate = 0\n");

    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::InvalidValue {
            field: "limiter.rate",
            ..
        })
    ));
}

#[test]
fn rejects_unknown_algorithm() {
    let file = write_temp_config("[limiter]\nalgorithm = \"leaky_bucket\"\n");

    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
}
