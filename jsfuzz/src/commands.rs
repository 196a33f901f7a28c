use clap::{Arg, ArgAction, arg};
use url::Url;

/// Upper bound accepted for `--threads`
pub const MAX_THREADS: u64 = 4096;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("jsfuzz")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("jsfuzz")
        .about(
            "Mine archived pages for JavaScript, extract endpoints and parameters, and fuzz \
            them with bounded concurrency.",
        )
        .styles(CLAP_STYLING)
        .arg(
            Arg::new("domain")
                .value_name("DOMAIN")
                .required(true)
                .num_args(1..)
                .help("Single domain or comma-separated list of domains"),
        )
        .arg(
            arg!(-w --"wordlist")
                .required(false)
                .help("Use a wordlist for fuzz values instead of the fixed marker")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-p --"path" <PATH>)
                .required(false)
                .help("Full path to the wordlist file (default: ~/.config/jsfuzz/wordlists/default.txt)")
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .requires("wordlist"),
        )
        .arg(
            arg!(-X --"method" <METHOD>)
                .required(false)
                .help("HTTP method used for every probe")
                .value_parser(["GET", "POST", "PUT", "PATCH"])
                .ignore_case(true)
                .default_value("GET"),
        )
        .arg(
            arg!(-t --"threads" <NUM_REQUESTS>)
                .required(false)
                .help("Maximum number of probes in flight at once (1-4096)")
                .value_parser(clap::value_parser!(u64).range(1..=MAX_THREADS))
                .default_value("10"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            arg!(--"max-payloads" <NUM>)
                .required(false)
                .help("Cap on payloads generated per JavaScript asset (default: unlimited)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--"marker" <VALUE>)
                .required(false)
                .help("Fixed fuzz value placed into every parameter")
                .default_value("FUZZ")
                .conflicts_with("wordlist"),
        )
        .arg(
            arg!(--"archive-url" <URL>)
                .required(false)
                .help("Archive CDX endpoint to query")
                .value_parser(clap::value_parser!(Url)),
        )
        .arg(
            arg!(--"query")
                .required(false)
                .help("Send parameters as a URL query string instead of a form body")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"resolve")
                .required(false)
                .help("Join relative asset and endpoint URLs onto the page or script they came from")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"no-progress")
                .required(false)
                .help("Hide the dispatch progress bar")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"print-probes")
                .required(false)
                .help("Print one line per finished probe")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(-v --"verbose")
                .required(false)
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count),
        )
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
}
