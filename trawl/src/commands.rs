use clap::{arg, command};
use trawl_core::DEFAULT_ROOT;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("trawl")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("trawl")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" ...)
                .required(false)
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a graph from a root node, fetching every reachable node at most once \
                within the depth limit.",
                )
                .arg(
                    arg!(-u --"url" <NODE>)
                        .required(false)
                        .help("The root node to start crawling from")
                        .default_value(DEFAULT_ROOT),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum crawl depth. 0 or less fetches nothing.")
                        .value_parser(clap::value_parser!(i64))
                        .allow_negative_numbers(true)
                        .default_value("4"),
                )
                .arg(
                    arg!(-g --"graph" <PATH>)
                        .required(false)
                        .help("JSON graph file to crawl (default: built-in golang.org demo table)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"max-in-flight" <NUM_FETCHES>)
                        .required(false)
                        .help("Cap on concurrent fetches (default: unbounded fan-out)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"delay-ms" <MILLISECONDS>)
                        .required(false)
                        .help("Simulated latency added to every fetch")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"timeout-ms" <MILLISECONDS>)
                        .required(false)
                        .help("Fail any single fetch that takes longer than this")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"stats")
                        .required(false)
                        .help("Print how many times each node was requested from the source")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-progress")
                        .required(false)
                        .help("Disable the progress spinner")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("graph")
                .about("Print the nodes and edges of a graph without crawling it")
                .arg(
                    arg!(-g --"graph" <PATH>)
                        .required(false)
                        .help("JSON graph file (default: built-in golang.org demo table)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"json")
                        .required(false)
                        .help("Print the graph in the JSON graph file format")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
