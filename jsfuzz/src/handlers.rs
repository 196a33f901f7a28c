use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use jsfuzz_core::dispatch::{
    CompletionCallback, HttpMethod, ParamPlacement, ProbeOutcome, ProbeReport,
};
use jsfuzz_core::payload::{ExpansionPolicy, FuzzValues};
use jsfuzz_core::pipeline::{Pipeline, PipelineConfig};
use jsfuzz_core::report::generate_run_report;
use jsfuzz_core::wordlist::wordlist_values;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Level;
use url::Url;

pub const DEFAULT_WORDLIST_PATH: &str = "~/.config/jsfuzz/wordlists/default.txt";

/// Split every positional value on commas and trim each domain.
pub fn parse_domains<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.as_ref().split(','))
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .map(String::from)
        .collect()
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

pub fn default_wordlist_path() -> PathBuf {
    expand_path(Path::new(DEFAULT_WORDLIST_PATH))
}

pub fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init_tracing(verbosity: u8) {
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_max_level(log_level(verbosity))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build a pipeline configuration from parsed arguments. Fails if the
/// wordlist cannot be read or the method is not supported.
pub fn build_config(args: &ArgMatches) -> Result<PipelineConfig> {
    let defaults = PipelineConfig::default();

    let method = args
        .get_one::<String>("method")
        .map(|m| m.parse::<HttpMethod>())
        .transpose()
        .map_err(|e| anyhow!(e))?
        .unwrap_or(defaults.method);

    let fuzz_values = if args.get_flag("wordlist") {
        let path = args
            .get_one::<PathBuf>("path")
            .map(|p| expand_path(p))
            .unwrap_or_else(default_wordlist_path);
        wordlist_values(&path).map_err(|e| anyhow!(e))?
    } else {
        args.get_one::<String>("marker")
            .map(|marker| FuzzValues::Marker(marker.clone()))
            .unwrap_or_default()
    };

    let expansion = args
        .get_one::<usize>("max-payloads")
        .map(|max| ExpansionPolicy::Capped(*max))
        .unwrap_or_default();

    let archive_endpoint = args
        .get_one::<Url>("archive-url")
        .map(|url| url.as_str().to_string())
        .unwrap_or(defaults.archive_endpoint);

    Ok(PipelineConfig {
        max_concurrent_requests: args
            .get_one::<u64>("threads")
            .map(|threads| *threads as usize)
            .unwrap_or(defaults.max_concurrent_requests),
        request_timeout: args
            .get_one::<u64>("timeout")
            .map(|secs| Duration::from_secs(*secs))
            .unwrap_or(defaults.request_timeout),
        method,
        param_placement: if args.get_flag("query") {
            ParamPlacement::Query
        } else {
            ParamPlacement::Body
        },
        fuzz_values,
        expansion,
        resolve_relative: args.get_flag("resolve"),
        archive_endpoint,
        show_progress_bars: !args.get_flag("no-progress") && !args.get_flag("quiet"),
    })
}

pub fn format_probe_line(report: &ProbeReport) -> String {
    let outcome = match &report.outcome {
        ProbeOutcome::Status(code @ 200..=299) => code.to_string().green().to_string(),
        ProbeOutcome::Status(code @ 300..=399) => code.to_string().cyan().to_string(),
        ProbeOutcome::Status(code @ 400..=499) => code.to_string().yellow().to_string(),
        ProbeOutcome::Status(code) => code.to_string().red().to_string(),
        ProbeOutcome::Timeout => "timeout".red().to_string(),
        ProbeOutcome::Failed(_) => "error".red().to_string(),
    };

    format!(
        "  {} {:<5} {} ({} ms)",
        outcome,
        report.method.as_str(),
        report.endpoint,
        report.elapsed.as_millis()
    )
}

pub fn print_banner() {
    println!("{}", "═".repeat(60).bright_blue().bold());
    println!(
        "{}  {}",
        "  JSFUZZ".bright_white().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
    println!("{}", "  archived JavaScript endpoint fuzzer".bright_black());
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_scan(args: &ArgMatches) -> Result<()> {
    init_tracing(args.get_count("verbose"));

    let raw_domains: Vec<String> = args
        .get_many::<String>("domain")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let domains = parse_domains(&raw_domains);
    if domains.is_empty() {
        return Err(anyhow!("No domains provided"));
    }

    let config = build_config(args)?;
    let quiet = args.get_flag("quiet");

    if !quiet {
        println!("\n{} {} domain(s)", "→".blue(), domains.len());
        println!("Max concurrent requests: {}", config.max_concurrent_requests);
        println!("Method: {}", config.method);
        println!("Timeout: {}s", config.request_timeout.as_secs());
        match &config.fuzz_values {
            FuzzValues::Marker(marker) => println!("Fuzz value: {}", marker),
            FuzzValues::Wordlist(words) => println!("Fuzz values: {} wordlist entries", words.len()),
        }
        println!();
    }

    let start_time = Instant::now();

    let mut pipeline = Pipeline::new(config)
        .map_err(|e| anyhow!(e))
        .context("Failed to build pipeline")?;

    if args.get_flag("print-probes") {
        let callback: CompletionCallback = Arc::new(|report: ProbeReport| {
            println!("{}", format_probe_line(&report));
        });
        pipeline = pipeline.with_completion_callback(callback);
    }

    let summary = pipeline.run(&domains).await.map_err(|e| anyhow!(e))?;

    if !quiet {
        print!("{}", generate_run_report(&summary));
    }
    println!(
        "Execution time: {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
