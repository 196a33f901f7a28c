use jsfuzz::commands::command_argument_builder;
use jsfuzz::handlers::*;
use jsfuzz_core::dispatch::{HttpMethod, ParamPlacement, ProbeOutcome, ProbeReport};
use jsfuzz_core::payload::{ExpansionPolicy, FuzzValues};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::Level;

fn matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["jsfuzz"];
    argv.extend_from_slice(args);
    command_argument_builder()
        .try_get_matches_from(argv)
        .expect("arguments should parse")
}

#[test]
fn test_parse_domains_comma_separated() {
    let domains = parse_domains(&["example.com, api.example.com ,shop.example.com"]);
    assert_eq!(
        domains,
        vec!["example.com", "api.example.com", "shop.example.com"]
    );
}

#[test]
fn test_parse_domains_multiple_positionals() {
    let domains = parse_domains(&["a.com,b.com", "  c.com  "]);
    assert_eq!(domains, vec!["a.com", "b.com", "c.com"]);
}

#[test]
fn test_parse_domains_drops_empty_entries() {
    let domains = parse_domains(&[",, ,a.com,"]);
    assert_eq!(domains, vec!["a.com"]);
}

#[test]
fn test_domain_is_required() {
    let result = command_argument_builder().try_get_matches_from(["jsfuzz"]);
    assert!(result.is_err());
}

#[test]
fn test_path_requires_wordlist_flag() {
    let result =
        command_argument_builder().try_get_matches_from(["jsfuzz", "a.com", "-p", "/tmp/x.txt"]);
    assert!(result.is_err());
}

#[test]
fn test_build_config_defaults() {
    let config = build_config(&matches(&["example.com"])).unwrap();

    assert_eq!(config.max_concurrent_requests, 10);
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(config.method, HttpMethod::Get);
    assert_eq!(config.fuzz_values, FuzzValues::Marker("FUZZ".to_string()));
    assert_eq!(config.expansion, ExpansionPolicy::Full);
    assert_eq!(config.param_placement, ParamPlacement::Body);
    assert!(!config.resolve_relative);
    assert_eq!(config.archive_endpoint, "https://web.archive.org/cdx/search/cdx");
}

#[test]
fn test_build_config_overrides() {
    let config = build_config(&matches(&[
        "example.com",
        "-X",
        "patch",
        "-t",
        "3",
        "--timeout",
        "2",
        "--max-payloads",
        "50",
        "--marker",
        "<x>",
        "--archive-url",
        "http://127.0.0.1:8080/cdx",
        "--resolve",
        "--query",
        "--no-progress",
    ]))
    .unwrap();

    assert_eq!(config.method, HttpMethod::Patch);
    assert_eq!(config.max_concurrent_requests, 3);
    assert_eq!(config.request_timeout, Duration::from_secs(2));
    assert_eq!(config.expansion, ExpansionPolicy::Capped(50));
    assert_eq!(config.fuzz_values, FuzzValues::Marker("<x>".to_string()));
    assert_eq!(config.archive_endpoint, "http://127.0.0.1:8080/cdx");
    assert!(config.resolve_relative);
    assert_eq!(config.param_placement, ParamPlacement::Query);
    assert!(!config.show_progress_bars);
}

#[test]
fn test_threads_must_be_within_range() {
    for threads in ["0", "4097", "18446744073709551615"] {
        let result = command_argument_builder()
            .try_get_matches_from(["jsfuzz", "example.com", "-t", threads]);
        assert!(result.is_err(), "-t {} should be rejected", threads);
    }

    let config = build_config(&matches(&["example.com", "-t", "4096"])).unwrap();
    assert_eq!(config.max_concurrent_requests, 4096);

    let config = build_config(&matches(&["example.com", "-t", "1"])).unwrap();
    assert_eq!(config.max_concurrent_requests, 1);
}

#[test]
fn test_build_config_reads_wordlist() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "admin")?;
    writeln!(temp_file, "#{{7*7}}")?;
    writeln!(temp_file, " ' OR '1'='1 ")?;

    let path = temp_file.path().to_string_lossy().to_string();
    let config = build_config(&matches(&["example.com", "-w", "-p", &path]))?;

    assert_eq!(
        config.fuzz_values,
        FuzzValues::Wordlist(vec![
            "admin".to_string(),
            "#{7*7}".to_string(),
            " ' OR '1'='1 ".to_string(),
        ])
    );
    Ok(())
}

#[test]
fn test_build_config_missing_wordlist_fails() {
    let result = build_config(&matches(&[
        "example.com",
        "-w",
        "-p",
        "/nonexistent/path/values.txt",
    ]));

    let message = result.unwrap_err().to_string();
    assert!(message.contains("Failed to read wordlist"));
}

#[test]
fn test_expand_path() {
    let plain = Path::new("/tmp/values.txt");
    assert_eq!(expand_path(plain), plain.to_path_buf());

    let expanded = default_wordlist_path();
    assert!(expanded.ends_with("jsfuzz/wordlists/default.txt"));
}

#[test]
fn test_log_level() {
    assert_eq!(log_level(0), Level::WARN);
    assert_eq!(log_level(1), Level::INFO);
    assert_eq!(log_level(2), Level::DEBUG);
    assert_eq!(log_level(7), Level::TRACE);
}

#[test]
fn test_format_probe_line() {
    colored::control::set_override(false);

    let report = ProbeReport {
        endpoint: "https://example.com/api/users".to_string(),
        method: HttpMethod::Post,
        outcome: ProbeOutcome::Status(403),
        elapsed: Duration::from_millis(42),
    };
    assert_eq!(
        format_probe_line(&report),
        "  403 POST  https://example.com/api/users (42 ms)"
    );

    let timeout = ProbeReport {
        outcome: ProbeOutcome::Timeout,
        ..report
    };
    assert!(format_probe_line(&timeout).contains("timeout"));
}

