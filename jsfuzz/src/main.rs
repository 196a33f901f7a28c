use colored::Colorize;
use jsfuzz::commands::command_argument_builder;
use jsfuzz::handlers::{handle_scan, print_banner};

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();

    if !matches.get_flag("quiet") {
        print_banner();
    }

    if let Err(e) = handle_scan(&matches).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
