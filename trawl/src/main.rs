use colored::Colorize;
use trawl::commands::command_argument_builder;
use trawl::handlers::{handle_crawl, handle_graph, init_tracing};
use trawl_core::print_banner;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_tracing(chosen_command.get_count("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        // No subcommand provided, just show the banner
        None => return,
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        Some(("graph", primary_command)) => handle_graph(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "[!]".red().bold(), e);
        std::process::exit(1);
    }
}
